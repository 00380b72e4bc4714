//! Error types for comprank-ai
//!
//! Two layers:
//! - [`JobError`]: core job errors (validation, ordering, unrecoverable)
//! - [`ApiError`]: HTTP mapping of everything a handler can fail with

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Core job error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Input rejected before any job state is touched
    #[error("{0}")]
    Validation(String),

    /// Operation not valid for the job's current state
    #[error("{0}")]
    Conflict(String),

    /// Row processing cannot continue; the job moves to FAILED
    #[error("{0}")]
    Unrecoverable(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input validation failed (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or wrong password (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict (409) - e.g., upload before a target description
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// comprank-common error
    #[error("Common error: {0}")]
    Common(#[from] comprank_common::Error),
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(msg) => ApiError::Validation(msg),
            JobError::Conflict(msg) => ApiError::Conflict(msg),
            JobError::Unrecoverable(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
