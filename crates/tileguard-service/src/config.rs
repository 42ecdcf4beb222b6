//! Service configuration.
//!
//! Loaded once at startup from a YAML file. Malformed or nonsensical values
//! are fatal: a watcher with a zero refresh rate or no webhook target cannot
//! do its job, so there is nothing to degrade to.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default tile endpoint; `{x}` and `{y}` are replaced per tile.
const DEFAULT_TILE_URL: &str = "https://backend.wplace.live/files/s0/tiles/{x}/{y}.png";

/// Watcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seconds between reconciliation cycles
    pub refresh_rate: u64,
    /// Seconds between pattern-directory rescans
    pub directory_refresh_rate: u64,
    /// Minimum seconds between repeated notifications for a still-defaced pattern
    pub remind_time: u64,
    /// Default notification target
    pub webhook_url: String,
    /// Directory holding `<name>.<Tx>.<Ty>.<x>.<y>.png` pattern files
    pub pattern_directory: PathBuf,
    /// Tile endpoint template with `{x}` and `{y}` placeholders
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
}

fn default_tile_url() -> String {
    DEFAULT_TILE_URL.to_string()
}

impl Config {
    /// Read and validate the configuration file
    ///
    /// # Errors
    /// Fails on unreadable files, YAML syntax errors and values the watcher
    /// cannot run with (zero intervals, empty webhook URL, tile URL without
    /// coordinate placeholders).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("refresh_rate", self.refresh_rate),
            ("directory_refresh_rate", self.directory_refresh_rate),
            ("remind_time", self.remind_time),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }
        if self.webhook_url.trim().is_empty() {
            return Err(ConfigError::EmptyWebhookUrl);
        }
        if !self.tile_url.contains("{x}") || !self.tile_url.contains("{y}") {
            return Err(ConfigError::BadTileUrl);
        }
        Ok(())
    }

    /// Time between reconciliation cycles
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_rate)
    }

    /// Time between pattern-directory rescans
    #[must_use]
    pub fn directory_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.directory_refresh_rate)
    }

    /// Reminder interval for the defacement tracker
    #[must_use]
    pub fn remind_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.remind_time as i64)
    }
}

/// Configuration loading failures, all fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("unable to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or shape error
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A timer interval of zero would spin or disable the feature
    #[error("{field} must be positive")]
    ZeroInterval { field: &'static str },

    /// No default notification target
    #[error("webhook_url must not be empty")]
    EmptyWebhookUrl,

    /// Tile endpoint cannot address individual tiles
    #[error("tile_url must contain {{x}} and {{y}} placeholders")]
    BadTileUrl,
}
