//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to the announcer and
//! dispatcher. It provides router construction for both services and the
//! shared server startup helper.

use std::sync::Arc;

use thiserror::Error;

use crate::announce::Announcer;
use crate::dispatch::{AnnounceClient, Dispatcher};
use crate::library::AudioLibrary;
use crate::store::{JsonStore, PlayerSettings, SenderSettings};

pub mod player;
pub mod response;
pub mod sender;

/// Errors that can occur when starting or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the TCP port or serve on it.
    #[error("Failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),
}

/// Shared state for the player API.
///
/// This is a thin wrapper that holds references to services.
/// All business logic lives in the services themselves.
#[derive(Clone)]
pub struct PlayerState {
    /// Executes announce requests against the speaker.
    pub announcer: Arc<Announcer>,
    /// The locally available audio files.
    pub library: Arc<AudioLibrary>,
    /// Playback settings store (repeats, delay, volume).
    pub settings: Arc<JsonStore<PlayerSettings>>,
}

/// Shared state for the sender API.
#[derive(Clone)]
pub struct SenderState {
    /// Forwards triggers to the player.
    pub dispatcher: Arc<Dispatcher>,
    /// Playlist and player-address store.
    pub settings: Arc<JsonStore<SenderSettings>>,
    /// Client used to probe a candidate player URL on config changes.
    pub client: Arc<dyn AnnounceClient>,
}

/// Binds the given port on all interfaces and serves the router until the
/// process is shut down.
pub async fn serve(router: axum::Router, port: u16) -> Result<(), ServerError> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Server listening on http://0.0.0.0:{}", port);
    axum::serve(listener, router).await?;
    Ok(())
}
