//! Host configuration
//!
//! Handles configuration loading for the demo host: where to find modules,
//! how to filter logs, and per-module configuration overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "modhost=debug"); RUST_LOG takes precedence
    pub filter: Option<String>,
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Directory containing module containers
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-module configuration overrides, keyed by module id
    #[serde(default)]
    pub module_configs: HashMap<String, HashMap<String, String>>,
}

fn default_modules_dir() -> String {
    "demos".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            logging: LoggingConfig::default(),
            module_configs: HashMap::new(),
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }
}
