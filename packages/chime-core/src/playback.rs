//! Playback backend abstraction.
//!
//! The speaker hardware is driven by an external decoder process (mpg123).
//! The [`PlaybackBackend`] trait keeps the sequencing logic in
//! [`crate::announce`] independent of it, so tests can run against fakes.

use std::path::Path;
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a playback backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The player process could not be launched.
    #[error("failed to launch player process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The player process exited unsuccessfully.
    #[error("player process exited with {0}")]
    Exit(ExitStatus),
}

/// A device that can play one audio file to completion.
///
/// Implementations must be synchronous with respect to the speaker: `play`
/// resolves only once the file has finished (or failed). The announce
/// sequencer relies on this to keep plays strictly ordered.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Plays the file at `path` at the given volume, waiting for completion.
    async fn play(&self, path: &Path, volume: u32) -> Result<(), BackendError>;
}

/// Plays audio files by spawning `mpg123` and waiting for it to exit.
#[derive(Debug, Clone)]
pub struct Mpg123Backend {
    program: String,
}

impl Default for Mpg123Backend {
    fn default() -> Self {
        Self {
            program: "mpg123".to_string(),
        }
    }
}

impl Mpg123Backend {
    /// Creates a backend that invokes the given mpg123 binary.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl PlaybackBackend for Mpg123Backend {
    async fn play(&self, path: &Path, volume: u32) -> Result<(), BackendError> {
        log::debug!(
            "[Playback] {} -f {} -q {}",
            self.program,
            volume,
            path.display()
        );
        let status = tokio::process::Command::new(&self.program)
            .arg("-f")
            .arg(volume.to_string())
            .arg("-q")
            .arg(path)
            .status()
            .await
            .map_err(BackendError::Spawn)?;

        if status.success() {
            Ok(())
        } else {
            Err(BackendError::Exit(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let backend = Mpg123Backend::new("/nonexistent/mpg123-binary");
        let err = backend
            .play(Path::new("/tmp/chime.mp3"), 32768)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Spawn(_)));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        // `false` exits 1 without touching its arguments.
        let backend = Mpg123Backend::new("false");
        let err = backend
            .play(Path::new("/tmp/chime.mp3"), 32768)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Exit(_)));
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let backend = Mpg123Backend::new("true");
        backend
            .play(Path::new("/tmp/chime.mp3"), 32768)
            .await
            .unwrap();
    }
}
