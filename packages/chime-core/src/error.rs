//! Centralized error types for the Chime core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::dispatch::{AnnounceCallError, DispatchError};
use crate::store::StoreError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Daemon(_) => "mdns_daemon_failed",
            Self::NotFound(_) => "player_not_found",
        }
    }
}

impl ErrorCode for AnnounceCallError {
    fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "player_unreachable",
            Self::Status(_) => "player_error_status",
            Self::InvalidBody(_) => "invalid_player_response",
        }
    }
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::Discovery(e) => e.code(),
            Self::Call(e) => e.code(),
        }
    }
}

/// Application-wide error type for the Chime HTTP services.
#[derive(Debug, Error)]
pub enum ChimeError {
    /// Client sent an invalid or malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persisting configuration to disk failed.
    #[error("Configuration store error: {0}")]
    Store(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChimeError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type ChimeResult<T> = Result<T, ChimeError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for ChimeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ChimeError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn invalid_request_returns_correct_code() {
        let err = ChimeError::InvalidRequest("test".into());
        assert_eq!(err.code(), "invalid_request");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_error_maps_to_internal_server_error() {
        let err = ChimeError::Store("disk full".into());
        assert_eq!(err.code(), "store_error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn dispatch_error_codes_follow_cause() {
        let discovery = DispatchError::Discovery(DiscoveryError::NotFound(Duration::from_secs(5)));
        assert_eq!(discovery.code(), "player_not_found");

        let network = DispatchError::Call(AnnounceCallError::Network("refused".into()));
        assert_eq!(network.code(), "player_unreachable");

        let status = DispatchError::Call(AnnounceCallError::Status(500));
        assert_eq!(status.code(), "player_error_status");
    }
}
