//! Error types and HTTP error response handling.
//!
//! `AppError` covers everything a handler can reject a request with.
//! `TranslationError` never reaches a client: the translator logs it and
//! degrades to the fallback query instead.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Authentication**: missing or unknown API key, bad operator token
/// - **Request**: wrong method, invalid body, unknown shop
/// - **Persistence**: any sqlx::Error from database operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// `X-API-Key` (or bearer key) is missing or matches no shop.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Merchant or operator credential rejected.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthorized")]
    Unauthorized,

    /// Returns HTTP 405 Method Not Allowed.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Returns HTTP 404 Not Found.
    #[error("Shop not found")]
    ShopNotFound,

    /// Anything else that should surface as a 500 without leaking details.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidApiKey => (StatusCode::FORBIDDEN, "invalid_api_key", self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::ShopNotFound => (StatusCode::NOT_FOUND, "shop_not_found", self.to_string()),
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Malformed bodies, wrong content type and schema mismatches all become
/// `400 invalid_request` with the standard error body.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Why a call to the chat completion upstream produced no usable query.
///
/// Every variant yields the same fallback query; the classification only
/// reaches the logs.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream rate limited the request")]
    RateLimited,

    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("upstream returned no content")]
    EmptyResponse,

    #[error("upstream content is not a JSON object: {0}")]
    MalformedResponse(String),
}

impl TranslationError {
    /// Short label used as the `kind` field in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::Timeout => "timeout",
            TranslationError::Transport(_) => "transport",
            TranslationError::RateLimited => "rate_limited",
            TranslationError::UpstreamStatus(_) => "upstream_status",
            TranslationError::EmptyResponse => "empty_response",
            TranslationError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::Timeout
        } else {
            TranslationError::Transport(err)
        }
    }
}
