//! Wire types for the matchday HTTP API.
//!
//! Every response body is one of three envelopes:
//!
//! - [`DataEnvelope`]: `{"success": true, "data": ...}`
//! - [`MessageEnvelope`]: `{"success": true, "message": "..."}`
//! - [`ErrorEnvelope`]: `{"success": false, "error": {"code": "...", "message": "..."}}`

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// -------------------------
// Success envelopes
// -------------------------

/// Successful read carrying a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for DataEnvelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Successful write acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}

impl MessageEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl IntoResponse for MessageEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// -------------------------
// Errors
// -------------------------

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidBody,
    ValidationFailed,
    Unauthorized,
    PredictionsNotFound,
    PersistenceFailed,
    CachePublishFailed,
    CacheUnavailable,
    CorruptCacheEntry,
    InternalError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidBody | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::PredictionsNotFound => StatusCode::NOT_FOUND,
            ErrorCode::CacheUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::PersistenceFailed
            | ErrorCode::CachePublishFailed
            | ErrorCode::CorruptCacheEntry
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidBody => "INVALID_BODY",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::PredictionsNotFound => "PREDICTIONS_NOT_FOUND",
            ErrorCode::PersistenceFailed => "PERSISTENCE_FAILED",
            ErrorCode::CachePublishFailed => "CACHE_PUBLISH_FAILED",
            ErrorCode::CacheUnavailable => "CACHE_UNAVAILABLE",
            ErrorCode::CorruptCacheEntry => "CORRUPT_CACHE_ENTRY",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

/// High-level API error, rendered as an [`ErrorEnvelope`].
///
/// Messages are generic; internal error detail belongs in logs.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn invalid_body() -> Self {
        Self::new(ErrorCode::InvalidBody, "Invalid request body")
    }

    pub fn validation_failed(details: Vec<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, "Invalid outcome labels").with_details(details)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Unauthorized")
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::PredictionsNotFound, "Predictions not found")
    }

    pub fn persistence_failed() -> Self {
        Self::new(
            ErrorCode::PersistenceFailed,
            "Failed to insert prediction into durable store",
        )
    }

    pub fn cache_publish_failed() -> Self {
        Self::new(
            ErrorCode::CachePublishFailed,
            "Failed to cache predictions",
        )
    }

    pub fn cache_unavailable() -> Self {
        Self::new(ErrorCode::CacheUnavailable, "Prediction cache unavailable")
    }

    pub fn corrupt_cache_entry() -> Self {
        Self::new(ErrorCode::CorruptCacheEntry, "Failed to parse prediction data")
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.code,
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_envelope())).into_response()
    }
}

/// Plain-text `404` body with status 401, the rejection older gated
/// deployments answer with.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyRejection;

impl IntoResponse for LegacyRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            "404\n",
        )
            .into_response()
    }
}
