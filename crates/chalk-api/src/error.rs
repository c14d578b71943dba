//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping chat and document errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chalk_chat::ChatError;
use chalk_document::DocumentError;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 404 Not Found - unknown session or turn.
    NotFound(String),
    /// 409 Conflict - a turn is still waiting for its answer.
    Conflict(String),
    /// 415 Unsupported Media Type - upload is neither PDF nor Word.
    UnsupportedMediaType(String),
    /// 422 Unprocessable Entity - unreadable upload, or an operation on the
    /// wrong kind of turn.
    UnprocessableEntity(String),
    /// 500 Internal Server Error.
    Internal(String),
    /// 502 Bad Gateway - the completion service failed.
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                msg,
            ),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let message = err.to_string();
        match err {
            ChatError::TurnPending => ApiError::Conflict(message),
            ChatError::TurnNotFound(_) | ChatError::SessionNotFound(_) => {
                ApiError::NotFound(message)
            }
            ChatError::NotAssistantTurn(_) => ApiError::UnprocessableEntity(message),
            ChatError::Document(DocumentError::UnsupportedFormat(_)) => {
                ApiError::UnsupportedMediaType(message)
            }
            ChatError::Document(
                DocumentError::Empty | DocumentError::Pdf(_) | DocumentError::Docx(_),
            ) => ApiError::UnprocessableEntity(message),
            ChatError::Completion(_) => ApiError::BadGateway(message),
            ChatError::Document(_) | ChatError::Config(_) | ChatError::Storage(_) => {
                tracing::error!(error = %message, "Internal error");
                ApiError::Internal(message)
            }
        }
    }
}
