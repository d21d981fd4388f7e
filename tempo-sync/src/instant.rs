//! Parsing of marker attribute values into epoch milliseconds

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::types::{EpochMillis, Result, TempoError};

/// Naive date-time layouts accepted after RFC 3339 / RFC 2822, read as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an instant such as `2022-01-01T00:00:00Z` into milliseconds since the epoch
///
/// Accepts RFC 3339, RFC 2822, naive ISO date-times (taken as UTC) and
/// plain `YYYY-MM-DD` dates (UTC midnight).
///
/// # Example
/// ```
/// use tempo_sync::parse_instant;
///
/// assert_eq!(parse_instant("2022-01-01T00:00:00Z").unwrap(), 1_640_995_200_000);
/// assert!(parse_instant("invalid-date").is_err());
/// ```
pub fn parse_instant(text: &str) -> Result<EpochMillis> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TempoError::InvalidInstant(String::new()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp_millis());
        }
    }

    Err(TempoError::InvalidInstant(text.to_string()))
}
