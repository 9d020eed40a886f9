//! Shared JSON response helpers for the HTTP APIs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A 200 response with the given JSON body.
pub fn api_success(body: serde_json::Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// A structured error response: `{ "ok": false, "error", "message" }`.
pub fn api_error(
    status: StatusCode,
    code: &'static str,
    message: impl std::fmt::Display,
) -> Response {
    (
        status,
        Json(json!({
            "ok": false,
            "error": code,
            "message": message.to_string(),
        })),
    )
        .into_response()
}
