//! Core types for the tempo-sync library
//!
//! This module defines the shared vocabulary of the crate: the tracked entry
//! held by the tracker, the error type, and the fixed unit sizes every label
//! and refresh interval is derived from.

use serde::Serialize;

/// Milliseconds since the Unix epoch
pub type EpochMillis = i64;

/// Result type for tempo-sync operations
pub type Result<T> = std::result::Result<T, TempoError>;

/// One second in milliseconds
pub const SECOND_MS: u64 = 1_000;
/// One minute in milliseconds
pub const MINUTE_MS: u64 = 60 * SECOND_MS;
/// One hour in milliseconds
pub const HOUR_MS: u64 = 60 * MINUTE_MS;
/// One day in milliseconds
pub const DAY_MS: u64 = 24 * HOUR_MS;
/// One week in milliseconds
pub const WEEK_MS: u64 = 7 * DAY_MS;
/// Nominal month (30 days) in milliseconds
pub const MONTH_MS: u64 = 30 * DAY_MS;
/// Nominal year (365 days) in milliseconds
pub const YEAR_MS: u64 = 365 * DAY_MS;

/// Refresh delay used when nothing is tracked
pub const IDLE_INTERVAL_MS: u64 = MINUTE_MS;

/// Attribute whose value marks an element as a relative-time label
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-tempo";

/// A node being kept in sync, anchored to a fixed origin instant
///
/// The node is a non-owning handle into the host document; the tracker never
/// manages its lifetime, it only drops the entry once the node is detached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEntry<N> {
    /// The labelled node
    #[serde(skip)]
    pub node: N,
    /// Origin instant the label is relative to
    pub origin_ms: EpochMillis,
}

impl<N> TrackedEntry<N> {
    /// Create a new entry
    pub fn new(node: N, origin_ms: EpochMillis) -> Self {
        Self { node, origin_ms }
    }

    /// Signed distance from the origin to `now` (positive = in the past)
    pub fn delta_ms(&self, now_ms: EpochMillis) -> i64 {
        now_ms.saturating_sub(self.origin_ms)
    }

    /// Absolute distance between the origin and `now`
    pub fn age_ms(&self, now_ms: EpochMillis) -> u64 {
        self.delta_ms(now_ms).unsigned_abs()
    }
}

/// Errors that can occur in tempo-sync
#[derive(Debug, thiserror::Error)]
pub enum TempoError {
    #[error("Invalid instant: {0:?}")]
    InvalidInstant(String),

    #[error("Marker attribute name must not be empty")]
    EmptyMarkerAttribute,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_sizes() {
        assert_eq!(MINUTE_MS, 60_000);
        assert_eq!(HOUR_MS, 3_600_000);
        assert_eq!(DAY_MS, 86_400_000);
        assert_eq!(WEEK_MS, 604_800_000);
        assert_eq!(MONTH_MS, 2_592_000_000);
        assert_eq!(YEAR_MS, 31_536_000_000);
    }

    #[test]
    fn test_entry_age_is_symmetric() {
        let entry = TrackedEntry::new((), 10_000);
        assert_eq!(entry.delta_ms(40_000), 30_000);
        assert_eq!(entry.delta_ms(0), -10_000);
        assert_eq!(entry.age_ms(0), 10_000);
        assert_eq!(entry.age_ms(40_000), 30_000);
    }

    #[test]
    fn test_entry_serializes_origin_only() {
        let entry = TrackedEntry::new("node", 1_640_995_200_000);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"origin_ms":1640995200000}"#);
    }
}
