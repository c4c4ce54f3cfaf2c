//! Database configuration
//!
//! Every field has a default so a partial JSON document is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config document is not valid JSON for this shape
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config parsed but holds an unusable value
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database name, reported in log events (default: "default.tabula")
    #[serde(default = "default_name")]
    pub name: String,

    /// Emit structured log events for queries and transactions (default: false)
    #[serde(default)]
    pub log_events: bool,

    /// Longest accepted sort descriptor (default: 16)
    #[serde(default = "default_max_sort_keys")]
    pub max_sort_keys: usize,
}

fn default_name() -> String {
    "default.tabula".to_string()
}

fn default_max_sort_keys() -> usize {
    16
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_events: false,
            max_sort_keys: default_max_sort_keys(),
        }
    }
}

impl DatabaseConfig {
    /// Create a default config with the given database name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Enable or disable structured event logging
    pub fn with_log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    /// Parse a config from a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: DatabaseConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Checks values that deserialize fine but cannot be used
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".into()));
        }
        if self.max_sort_keys == 0 {
            return Err(ConfigError::Invalid(
                "max_sort_keys must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
