//! Player-side playback sequencing.
//!
//! One announce request is an ordered list of file identifiers. The
//! [`Announcer`] turns it into a strictly sequential series of backend
//! invocations: each file `repeats` times, with the configured delay between
//! consecutive plays, missing or failing files isolated to a per-file result.
//!
//! The speaker is a single exclusively-owned resource, so playback across
//! concurrent announce requests is serialized through one async mutex:
//! a request that arrives mid-sequence queues and runs after the current
//! one completes in full (FCFS), never interleaved.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::library::AudioLibrary;
use crate::playback::PlaybackBackend;
use crate::store::{JsonStore, PlayerSettings};

/// Outcome of one file within an announce request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// All requested repeats completed.
    Played,
    /// The identifier does not exist in the library.
    NotFound,
    /// The backend reported a failure; remaining repeats were skipped.
    PlaybackError,
}

/// Per-file result, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// The requested file identifier.
    pub file: String,
    /// What happened to it.
    pub status: FileStatus,
}

impl FileOutcome {
    fn new(file: &str, status: FileStatus) -> Self {
        Self {
            file: file.to_string(),
            status,
        }
    }
}

/// Executes announce requests against the playback backend.
pub struct Announcer {
    library: Arc<AudioLibrary>,
    settings: Arc<JsonStore<PlayerSettings>>,
    backend: Arc<dyn PlaybackBackend>,
    /// Single playback slot. `tokio::sync::Mutex` grants the lock in request
    /// order, which gives the FCFS queue for free.
    playback_slot: Mutex<()>,
}

impl Announcer {
    /// Creates an announcer over the given library, settings store and backend.
    pub fn new(
        library: Arc<AudioLibrary>,
        settings: Arc<JsonStore<PlayerSettings>>,
        backend: Arc<dyn PlaybackBackend>,
    ) -> Self {
        Self {
            library,
            settings,
            backend,
            playback_slot: Mutex::new(()),
        }
    }

    /// Plays the requested files in order and returns one outcome per file.
    ///
    /// Order and duplicates are preserved exactly as requested. An empty
    /// request returns an empty result without touching the backend.
    pub async fn announce(&self, files: &[String]) -> Vec<FileOutcome> {
        // Queue behind any in-flight sequence before reading settings, so a
        // request always plays with the settings current at its start.
        let _slot = self.playback_slot.lock().await;
        let settings = self.settings.load().clamped();
        let delay = Duration::from_secs(settings.delay_secs);

        log::info!(
            "[Announce] {} file(s), repeats={}, delay={}s, volume={}",
            files.len(),
            settings.repeats,
            settings.delay_secs,
            settings.volume
        );

        let mut outcomes = Vec::with_capacity(files.len());
        let mut played_any = false;

        for file in files {
            let Some(path) = self.library.resolve(file) else {
                log::warn!("[Announce] Unknown file: {}", file);
                outcomes.push(FileOutcome::new(file, FileStatus::NotFound));
                continue;
            };

            let mut status = FileStatus::Played;
            for repeat in 0..settings.repeats {
                // Delay between consecutive plays; none before the first
                // play of the request and none after the last.
                if played_any && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                played_any = true;

                if let Err(e) = self.backend.play(&path, settings.volume).await {
                    log::warn!(
                        "[Announce] Playback failed for {} (repeat {}/{}): {}",
                        file,
                        repeat + 1,
                        settings.repeats,
                        e
                    );
                    status = FileStatus::PlaybackError;
                    break;
                }
            }
            outcomes.push(FileOutcome::new(file, status));
        }

        outcomes
    }
}
