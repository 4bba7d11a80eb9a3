//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docvault_core::ports::PortError;
use serde_json::json;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status class for each failure kind. Auth-class failures are
    /// all 401, duplicate registration 409, missing records 404, malformed
    /// input 400, everything else 500.
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::InvalidKey)
            | ApiError::Port(PortError::InvalidPassword)
            | ApiError::Port(PortError::InvalidSession) => StatusCode::UNAUTHORIZED,
            ApiError::Port(PortError::DuplicateIdentity(_)) => StatusCode::CONFLICT,
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to the client. Port failures carry their own
    /// message (the legacy contract keeps invalid-key and invalid-password
    /// distinguishable); infrastructure failures are not echoed verbatim.
    fn public_message(&self) -> String {
        match self {
            ApiError::Port(e) => e.to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "message": self.public_message(),
            "success": false,
        }));
        (status, body).into_response()
    }
}
