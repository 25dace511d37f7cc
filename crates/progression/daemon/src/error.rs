//! Error types for progressiond

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use progression_service::ProgressionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Seed data could not be loaded
    #[error("Seed error: {0}")]
    Seed(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// No caller identity on the request
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Well-formed request the domain rejects
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict with the current profile state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator is down; retrying may succeed
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProgressionError> for ApiError {
    fn from(err: ProgressionError) -> Self {
        let message = err.to_string();
        match err {
            ProgressionError::NotAuthorized(_) => ApiError::Forbidden(message),
            ProgressionError::NotFound(_) => ApiError::NotFound(message),
            ProgressionError::UnknownBadge(_) => ApiError::Validation(message),
            ProgressionError::NoNextStage(_) | ProgressionError::InvalidTransition(_) => {
                ApiError::Conflict(message)
            }
            ProgressionError::UpstreamUnavailable(_) => ApiError::Unavailable(message),
            ProgressionError::Storage(_) => ApiError::Internal(message),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "NOT_AUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
