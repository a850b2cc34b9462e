//! API error types mapped to HTTP status codes.
//!
//! Each [`ApiError`] variant maps to a specific HTTP status code and produces
//! a JSON response body `{"error": "message"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tiledict_core::error::{IngestError, ValidationError};

/// Application-level error type that implements `IntoResponse`.
///
/// Each variant maps to an HTTP status code:
/// - `BadRequest` → 400
/// - `NotFound` → 404
/// - `Conflict` → 409
/// - `Internal` → 500
/// - `IngestFailed` → 500, with `resume_from_batch` in the body
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request parameters (400).
    BadRequest(String),
    /// Resource not found (404).
    NotFound(String),
    /// Operation already in progress (409).
    Conflict(String),
    /// Unexpected server error (500).
    Internal(String),
    /// Seed run aborted; batches before `resume_from_batch` are committed (500).
    IngestFailed {
        message: String,
        resume_from_batch: Option<u64>,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            ApiError::IngestFailed {
                message,
                resume_from_batch,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message, "resume_from_batch": resume_from_batch }),
            ),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::MissingLetters => {
                ApiError::BadRequest("letters query parameter is required".into())
            }
            ValidationError::Store(err) => {
                tracing::error!("Validation lookup failed: {}", err);
                ApiError::Internal("Validation failed".into())
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidOptions(msg) => ApiError::BadRequest(msg),
            other => ApiError::IngestFailed {
                message: other.to_string(),
                resume_from_batch: other.resume_from_batch(),
            },
        }
    }
}
