//! Sender service configuration.
//!
//! Supports loading from YAML files with environment variable overrides.
//! The playlist and player address are NOT here - they live in the JSON
//! settings store and are editable at runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Sender service configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Port to bind the HTTP server to.
    /// Override: `CHIME_BIND_PORT`
    pub bind_port: u16,

    /// Path of the JSON settings store (playlist, player address).
    /// Override: `CHIME_SETTINGS_PATH`
    pub settings_path: PathBuf,

    /// How long a single mDNS resolution attempt may take (seconds).
    /// Override: `CHIME_DISCOVERY_TIMEOUT`
    pub discovery_timeout_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            bind_port: 8000,
            settings_path: PathBuf::from("config.json"),
            discovery_timeout_secs: 5,
        }
    }
}

impl SenderConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// The mDNS browse window as a [`Duration`].
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHIME_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("CHIME_SETTINGS_PATH") {
            self.settings_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CHIME_DISCOVERY_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.discovery_timeout_secs = secs;
            }
        }
    }
}
