//! Error types for slp-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slp_common::ParseError;
use thiserror::Error;
use tracing::{error, warn};

use crate::generation::{GenerationError, UpstreamError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid session (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict (409), e.g. username taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generation service call failed (502)
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Generated text could not be parsed (422)
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// slp-common error
    #[error("Common error: {0}")]
    Common(#[from] slp_common::Error),
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Upstream(e) => ApiError::Upstream(e),
            GenerationError::Parse(e) => ApiError::Parse(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Upstream(ref err) => {
                warn!("Upstream generation failure: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_FAILURE",
                    format!("{}. Check connectivity and the API key, then retry.", err),
                )
            }
            ApiError::Parse(ParseError::EmptyResult { kind }) => {
                warn!("Generated text had no usable {}", kind);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EMPTY_RESULT",
                    format!("Generation failed: no usable {} were produced. Please retry.", kind),
                )
            }
            ApiError::Parse(ParseError::MalformedRecord { line }) => {
                warn!("Malformed generated record: {}", line);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "MALFORMED_RECORD",
                    format!("Generation failed: malformed record '{}'. Please retry.", line),
                )
            }
            ApiError::Database(ref err) => {
                error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    err.to_string(),
                )
            }
            ApiError::Common(slp_common::Error::NotFound(msg)) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Common(slp_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => {
                error!("Common error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                )
            }
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
