//! Player service configuration.
//!
//! Supports loading from YAML files with environment variable overrides.
//! Playback settings (repeats, delay, volume) are NOT here - they live in
//! the JSON settings store and are editable at runtime.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Player service configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Port to bind the HTTP server to.
    /// Override: `CHIME_BIND_PORT`
    pub bind_port: u16,

    /// Directory holding the playable audio files.
    /// Override: `CHIME_AUDIO_DIR`
    pub audio_dir: PathBuf,

    /// Path of the JSON playback-settings store.
    /// Override: `CHIME_SETTINGS_PATH`
    pub settings_path: PathBuf,

    /// Advertise this player via mDNS so senders can find it.
    pub advertise: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            bind_port: 8000,
            audio_dir: PathBuf::from("audio"),
            settings_path: PathBuf::from("config.json"),
            advertise: true,
        }
    }
}

impl PlayerConfig {
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

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHIME_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("CHIME_AUDIO_DIR") {
            self.audio_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CHIME_SETTINGS_PATH") {
            self.settings_path = PathBuf::from(val);
        }
    }
}
