//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same `{error, message}` body and maps
//! dialogue errors onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use triage_dialog::DialogError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - unknown or expired session.
    NotFound(String),
    /// 409 Conflict - the conversation is not in a state that allows the action.
    Conflict(String),
    /// 422 Unprocessable Entity - well-formed but out-of-range input.
    UnprocessableEntity(String),
    /// 500 Internal Server Error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DialogError> for ApiError {
    fn from(err: DialogError) -> Self {
        let message = err.to_string();
        match err {
            DialogError::SessionNotFound(_) => ApiError::NotFound(message),
            DialogError::ConsentRequired => ApiError::BadRequest(message),
            DialogError::InvalidAge(_) => ApiError::UnprocessableEntity(message),
            DialogError::DiagnosisUnavailable { .. }
            | DialogError::NoDiagnosis
            | DialogError::Finished => ApiError::Conflict(message),
            DialogError::StateLock(_) => {
                tracing::error!(error = %message, "Session state unavailable");
                ApiError::Internal(message)
            }
        }
    }
}
