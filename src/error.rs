// ── Chatmark: Error Types ──────────────────────────────────────────────────
// Single canonical error enum for the backend, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by kind (NotFound, Conflict, Malformed…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • Every variant maps to a stable HTTP status + wire code at the transport
//     boundary via the `IntoResponse` impl — handlers just use `?`.
//   • No variant carries secret material (passwords, cookies) in its message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChatError {
    /// An ID (mark, message, cursor, filename) does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// An append was attempted where a forward link already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request parameters fail basic shape validation.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Server configuration is invalid or missing.
    #[error("configuration error: {0}")]
    Config(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl ChatError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn malformed(what: impl Into<String>) -> Self {
        Self::Malformed(what.into())
    }

    /// HTTP status this error surfaces as at the transport boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Conflict(_) => StatusCode::CONFLICT,
            ChatError::Malformed(_) => StatusCode::BAD_REQUEST,
            ChatError::Io(_) | ChatError::Serialization(_) | ChatError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// ── Transport boundary ─────────────────────────────────────────────────────
// Errors become a `{success: false, code, msg}` envelope; the HTTP status
// mirrors the wire code so both styles of client checking work.

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::fail(status.as_u16(), self.to_string());
        (status, Json(body)).into_response()
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All backend operations should return this type.
pub type ChatResult<T> = Result<T, ChatError>;
