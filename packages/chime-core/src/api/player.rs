//! Player HTTP routes.
//!
//! `/announce` accepts repeated `file` query parameters (order-preserving)
//! and answers 200 with per-file outcomes even when some files were not
//! found - partial success is not a transport-level error.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::api::response::api_success;
use crate::api::PlayerState;
use crate::error::ChimeResult;
use crate::store::{PlayerSettings, PlayerSettingsPatch};

/// Creates the Axum router for the player service.
pub fn create_router(state: PlayerState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/announce", get(handle_announce).post(handle_announce))
        .route("/files", get(list_files))
        .route("/api/config", get(get_config).patch(patch_config))
        .with_state(state)
}

/// Liveness probe: always 200 while the process is responsive.
async fn health_check() -> impl IntoResponse {
    api_success(json!({ "status": "ok", "service": "chime-player" }))
}

/// Extracts the ordered `file` parameters from a raw query pair list.
///
/// Duplicates are preserved; other parameters are ignored.
fn files_from_query(params: Vec<(String, String)>) -> Vec<String> {
    params
        .into_iter()
        .filter(|(key, _)| key == "file")
        .map(|(_, value)| value)
        .collect()
}

/// GET|POST /announce?file=a.mp3&file=b.mp3
///
/// Plays the requested files in order (queued behind any in-flight
/// sequence) and returns `{ "results": [ { "file", "status" }, ... ] }`.
/// Zero `file` parameters is a valid no-op announce.
async fn handle_announce(
    State(state): State<PlayerState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let files = files_from_query(params);
    let results = state.announcer.announce(&files).await;
    api_success(json!({ "results": results }))
}

/// GET /files - the available file identifiers, sorted.
async fn list_files(State(state): State<PlayerState>) -> Json<Vec<String>> {
    Json(state.library.list())
}

/// GET /api/config - current playback settings.
async fn get_config(State(state): State<PlayerState>) -> Json<PlayerSettings> {
    Json(state.settings.load().clamped())
}

/// PATCH /api/config - partial update, clamped to allowed ranges.
async fn patch_config(
    State(state): State<PlayerState>,
    Json(patch): Json<PlayerSettingsPatch>,
) -> ChimeResult<Json<PlayerSettings>> {
    let updated = state.settings.load().apply(&patch);
    state.settings.save(&updated)?;
    log::info!(
        "[Config] Updated: repeats={}, delay={}s, volume={}",
        updated.repeats,
        updated.delay_secs,
        updated.volume
    );
    Ok(Json(updated))
}
