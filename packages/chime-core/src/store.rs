//! JSON-file configuration store.
//!
//! Each service owns one small JSON file (player: playback settings,
//! sender: playlist and player address). The store is deliberately
//! read-on-demand: consumers that need freshness call [`JsonStore::load`]
//! per request rather than holding a cached copy, so edits made through
//! the admin API take effect on the very next button press.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed range for the per-file repeat count.
pub const REPEATS_MIN: u32 = 1;
/// Allowed range for the per-file repeat count.
pub const REPEATS_MAX: u32 = 10;
/// Allowed range for the inter-play delay (seconds).
pub const DELAY_MIN: u64 = 0;
/// Allowed range for the inter-play delay (seconds).
pub const DELAY_MAX: u64 = 60;
/// Allowed range for the mpg123 volume scale factor.
pub const VOLUME_MIN: u32 = 1;
/// Allowed range for the mpg123 volume scale factor.
pub const VOLUME_MAX: u32 = 500_000;

/// Player-side playback settings, re-read per announce request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// How many times each file is played.
    pub repeats: u32,
    /// Seconds to wait between consecutive plays.
    pub delay_secs: u64,
    /// mpg123 output scale factor (`-f`).
    pub volume: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            repeats: 2,
            delay_secs: 10,
            volume: 32768,
        }
    }
}

impl PlayerSettings {
    /// Clamps all fields into their allowed ranges.
    pub fn clamped(mut self) -> Self {
        self.repeats = self.repeats.clamp(REPEATS_MIN, REPEATS_MAX);
        self.delay_secs = self.delay_secs.clamp(DELAY_MIN, DELAY_MAX);
        self.volume = self.volume.clamp(VOLUME_MIN, VOLUME_MAX);
        self
    }

    /// Applies a partial update, clamping the result.
    pub fn apply(mut self, patch: &PlayerSettingsPatch) -> Self {
        if let Some(repeats) = patch.repeats {
            self.repeats = repeats;
        }
        if let Some(delay_secs) = patch.delay_secs {
            self.delay_secs = delay_secs;
        }
        if let Some(volume) = patch.volume {
            self.volume = volume;
        }
        self.clamped()
    }
}

/// Partial update for [`PlayerSettings`], as accepted by `PATCH /api/config`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlayerSettingsPatch {
    pub repeats: Option<u32>,
    pub delay_secs: Option<u64>,
    pub volume: Option<u32>,
}

/// Sender-side settings: which files to announce and where the player lives.
///
/// `player_base_url` is optional - when absent, the dispatcher falls back to
/// mDNS discovery. Discovery results are never written back here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderSettings {
    /// Explicit player base URL (e.g. `http://192.168.1.20:8000`).
    pub player_base_url: Option<String>,
    /// Ordered list of file identifiers sent on each trigger.
    /// May be empty (dispatch becomes a no-op announce) and may repeat entries.
    pub playlist: Vec<String>,
}

impl SenderSettings {
    /// Normalizes stored values: trims the base URL (dropping it when empty)
    /// and removes empty playlist entries.
    pub fn normalized(mut self) -> Self {
        self.player_base_url = self
            .player_base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        self.playlist.retain(|f| !f.is_empty());
        self
    }
}

/// Errors that can occur when persisting configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to serialize the configuration value.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write the configuration file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single-file JSON store for one configuration value.
///
/// Loads degrade to `T::default()` when the file is missing or unparsable,
/// so a corrupt config file never takes the service down.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Default + Serialize + DeserializeOwned> JsonStore<T> {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current value from disk.
    ///
    /// Returns `T::default()` when the file does not exist or cannot be
    /// parsed (a parse failure is logged, never fatal).
    pub fn load(&self) -> T {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                log::warn!("[Store] Failed to read {}: {}", self.path.display(), e);
                return T::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[Store] Invalid JSON in {}: {}", self.path.display(), e);
                T::default()
            }
        }
    }

    /// Writes the value to disk as pretty-printed JSON.
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
