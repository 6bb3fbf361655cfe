//! Gateway configuration
//!
//! Parses the gateway's YAML configuration file. Every field has a
//! default, so an empty file and a missing file both yield a runnable
//! configuration.

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use zha_entities::UnitSystem;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Unit system choice, "metric" or "imperial"
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystemConfig {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystemConfig {
    /// Convert to the entity layer's unit system
    pub fn to_unit_system(&self) -> UnitSystem {
        match self {
            UnitSystemConfig::Metric => UnitSystem::metric(),
            UnitSystemConfig::Imperial => UnitSystem::imperial(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitSystemConfig::Metric => "metric",
            UnitSystemConfig::Imperial => "imperial",
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Unit system for display conversion
    #[serde(default)]
    pub unit_system: UnitSystemConfig,

    /// Seconds between update polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            unit_system: UnitSystemConfig::Metric,
            poll_interval: default_poll_interval(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file.
    ///
    /// A file that does not exist yields the default configuration; any
    /// other read failure, and any parse failure, is an error.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the resolved unit system
    pub fn units(&self) -> UnitSystem {
        self.unit_system.to_unit_system()
    }

    /// Poll interval as a duration
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}
