//! Eventual-consistency settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Retry behavior of lookups issued while the catalog is converging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// When false, lookups never retry.
    pub enabled: bool,
    /// Milliseconds to wait before each retry, in order. Empty disables retries.
    pub retries: Vec<u64>,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retries: vec![25, 25, 50],
        }
    }
}

impl ConsistencyConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            retries: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn retry_delays(&self) -> Vec<Duration> {
        if !self.enabled {
            return Vec::new();
        }
        self.retries
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}
