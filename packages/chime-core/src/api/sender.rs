//! Sender HTTP routes.
//!
//! `/send` runs one dispatch against the current playlist. Request-level
//! failures (discovery, player unreachable, upstream error status) come
//! back as a single structured 502; the per-file outcomes of a successful
//! announce are passed through for observability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::api::response::{api_error, api_success};
use crate::api::SenderState;
use crate::error::{ChimeError, ChimeResult, ErrorCode};
use crate::store::SenderSettings;

/// Creates the Axum router for the sender service.
pub fn create_router(state: SenderState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/send", get(handle_send).post(handle_send))
        .route("/api/config", get(get_config).patch(patch_config))
        .with_state(state)
}

/// Liveness probe: always 200 while the process is responsive.
async fn health_check() -> impl IntoResponse {
    api_success(json!({ "status": "ok", "service": "chime-sender" }))
}

/// GET|POST /send - trigger a dispatch with the current playlist.
async fn handle_send(State(state): State<SenderState>) -> Response {
    match state.dispatcher.dispatch().await {
        Ok(outcome) => api_success(json!({
            "ok": true,
            "player": outcome.player,
            "results": outcome.results,
        })),
        Err(e) => {
            log::warn!("[Send] Dispatch failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, e.code(), e)
        }
    }
}

/// GET /api/config - current sender settings.
async fn get_config(State(state): State<SenderState>) -> Json<SenderSettings> {
    Json(state.settings.load().normalized())
}

/// Partial update for the sender settings.
///
/// An empty `player_base_url` clears the configured player (and the
/// playlist, which was chosen against it).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SenderSettingsPatch {
    player_base_url: Option<String>,
    playlist: Option<Vec<String>>,
}

/// PATCH /api/config
///
/// Setting a player URL probes `<url>/files` before accepting it and prunes
/// the playlist to files that exist there. Playlist updates are accepted as
/// given - a file that disappears from the player later is a per-file
/// `not_found` at play time, not a configuration error.
async fn patch_config(
    State(state): State<SenderState>,
    Json(patch): Json<SenderSettingsPatch>,
) -> ChimeResult<Json<SenderSettings>> {
    let mut settings = state.settings.load().normalized();

    if let Some(raw_url) = patch.player_base_url {
        let url = raw_url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            settings.player_base_url = None;
            settings.playlist.clear();
        } else {
            let available = state.client.fetch_files(&url).await.map_err(|e| {
                ChimeError::InvalidRequest(format!("could not reach player at {}: {}", url, e))
            })?;
            settings.playlist.retain(|f| available.contains(f));
            if settings.playlist.is_empty() {
                if let Some(first) = available.first() {
                    settings.playlist = vec![first.clone()];
                }
            }
            settings.player_base_url = Some(url);
        }
    }

    if let Some(playlist) = patch.playlist {
        settings.playlist = playlist.into_iter().filter(|f| !f.is_empty()).collect();
    }

    state.settings.save(&settings)?;
    log::info!(
        "[Config] Updated: player={:?}, playlist={} file(s)",
        settings.player_base_url,
        settings.playlist.len()
    );
    Ok(Json(settings))
}
