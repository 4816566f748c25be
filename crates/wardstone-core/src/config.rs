//! Configuration loading and typed config structures for Wardstone.
//!
//! The canonical configuration lives in `wardstone-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads and validates the
//! file. Every field has a default, so a missing or empty file yields a
//! working configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level subsystem configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WardstoneConfig {
    /// Ward status timing.
    #[serde(default)]
    pub status: StatusConfig,

    /// Expiry sweep settings.
    #[serde(default)]
    pub sweeper: SweeperConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WardstoneConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Ward status timing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusConfig {
    /// How long a granted ward lasts, in seconds.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,

    /// Per-entity cooldown between uses, in seconds.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_duration_seconds(),
            cooldown_seconds: default_cooldown_seconds(),
        }
    }
}

/// Expiry sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SweeperConfig {
    /// Sweep period in milliseconds.
    #[serde(default = "default_sweep_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_duration_seconds() -> u64 {
    10
}

const fn default_cooldown_seconds() -> u64 {
    60
}

const fn default_sweep_interval_ms() -> u64 {
    1_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
