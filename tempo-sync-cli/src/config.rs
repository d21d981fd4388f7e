//! Configuration loading and parsing for `watch` mode

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tempo_sync::TrackerConfig;

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default, rename = "label")]
    pub labels: Vec<LabelConfig>,
}

/// One label to keep in sync
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelConfig {
    pub name: String,
    pub timestamp: String,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration text
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    config.tracker.validate()?;

    if config.labels.is_empty() {
        bail!("no [[label]] entries configured");
    }
    for label in &config.labels {
        if label.name.trim().is_empty() {
            bail!("label with timestamp {:?} has no name", label.timestamp);
        }
    }

    Ok(config)
}
