//! Tracker configuration types
//!
//! The tracker needs very little configuration: which attribute marks a
//! label, and whether to follow structural changes of the document.

use serde::{Deserialize, Serialize};

use crate::types::{Result, TempoError, DEFAULT_MARKER_ATTRIBUTE};

/// Configuration for a [`TempoSync`](crate::TempoSync) tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Attribute holding the origin instant (default: `data-tempo`)
    #[serde(default = "default_marker_attribute")]
    pub marker_attribute: String,

    /// Follow nodes added to / removed from the document body (default: true)
    ///
    /// When disabled, or when the host cannot report structural changes,
    /// only the initial scan and explicit `add`/`remove` calls feed the
    /// tracked set.
    #[serde(default = "default_true")]
    pub watch_mutations: bool,
}

fn default_marker_attribute() -> String {
    DEFAULT_MARKER_ATTRIBUTE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            marker_attribute: default_marker_attribute(),
            watch_mutations: true,
        }
    }
}

impl TrackerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the marker attribute name
    pub fn with_marker_attribute(mut self, name: impl Into<String>) -> Self {
        self.marker_attribute = name.into();
        self
    }

    /// Builder method: enable or disable structural-change tracking
    pub fn with_mutation_watching(mut self, enabled: bool) -> Self {
        self.watch_mutations = enabled;
        self
    }

    /// Check that the configuration can drive a tracker
    pub fn validate(&self) -> Result<()> {
        let name = self.marker_attribute.as_str();
        if name.trim().is_empty() {
            return Err(TempoError::EmptyMarkerAttribute);
        }
        if name.chars().any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '[' | ']')) {
            return Err(TempoError::InvalidConfig(format!(
                "marker attribute {:?} is not a valid attribute name",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::new();
        assert_eq!(config.marker_attribute, "data-tempo");
        assert!(config.watch_mutations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TrackerConfig::new()
            .with_marker_attribute("data-since")
            .with_mutation_watching(false);

        assert_eq!(config.marker_attribute, "data-since");
        assert!(!config.watch_mutations);
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(matches!(
            TrackerConfig::new().with_marker_attribute("").validate(),
            Err(TempoError::EmptyMarkerAttribute)
        ));
        assert!(matches!(
            TrackerConfig::new().with_marker_attribute("   ").validate(),
            Err(TempoError::EmptyMarkerAttribute)
        ));
        assert!(matches!(
            TrackerConfig::new().with_marker_attribute("data tempo").validate(),
            Err(TempoError::InvalidConfig(_))
        ));
        assert!(TrackerConfig::new().with_marker_attribute("data-x]").validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: TrackerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());

        let config: TrackerConfig =
            serde_json::from_str(r#"{"marker_attribute": "data-when"}"#).unwrap();
        assert_eq!(config.marker_attribute, "data-when");
        assert!(config.watch_mutations);
    }
}
