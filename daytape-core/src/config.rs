//! TOML configuration.
//!
//! Every section is optional. A missing `[remote] base_url` means no network
//! context; a missing `[local] root` means no local directory.

use crate::analytics::{DEFAULT_WINDOW, MIN_WINDOW};
use crate::data::{ExtractOptions, LoadError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("configured source: {0}")]
    Source(#[from] LoadError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayTapeConfig {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    pub extract: ExtractOptions,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the data tree, e.g. `http://localhost:8000/data_json`.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Minute returns per volatility window.
    pub volatility_window: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            volatility_window: DEFAULT_WINDOW,
        }
    }
}

impl DayTapeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ex = &self.extract;
        if ex.chunk_size == 0 {
            return Err(ConfigError::Invalid("extract.chunk_size must be > 0".into()));
        }
        if ex.retain_tail >= ex.max_buffer {
            return Err(ConfigError::Invalid(format!(
                "extract.retain_tail ({}) must be smaller than extract.max_buffer ({})",
                ex.retain_tail, ex.max_buffer
            )));
        }
        if self.analytics.volatility_window < MIN_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "analytics.volatility_window must be at least {MIN_WINDOW}"
            )));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid("remote.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}
