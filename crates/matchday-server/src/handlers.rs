use std::any::Any;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use matchday_api::{ApiError, DataEnvelope, LegacyRejection, MessageEnvelope};
use serde_json::json;

use crate::access::AuthError;
use crate::cache::FetchError;
use crate::ingest::IngestError;
use crate::server::AppState;

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Parse(_) => ApiError::invalid_body(),
            IngestError::Validation(violations) => {
                ApiError::validation_failed(violations.iter().map(ToString::to_string).collect())
            }
            IngestError::Persistence { .. } => ApiError::persistence_failed(),
            IngestError::Cache(_) => ApiError::cache_publish_failed(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound => ApiError::not_found(),
            FetchError::CacheUnavailable(_) => ApiError::cache_unavailable(),
            FetchError::CorruptCacheEntry(_) => ApiError::corrupt_cache_entry(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::unauthorized()
    }
}

/// `GET /api/v1/predictions`
pub async fn get_predictions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(e) = state.gate.authorize(&headers) {
        tracing::debug!(reason = %e, "read rejected by access gate");
        if state.legacy_rejection_body {
            return LegacyRejection.into_response();
        }
        return ApiError::from(e).into_response();
    }

    match state.serving.fetch().await {
        Ok(batch) => DataEnvelope::new(batch).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// `POST /api/v1/predictions`
pub async fn post_predictions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<MessageEnvelope, ApiError> {
    let receipt = state.ingest.submit_json(&body).await?;
    tracing::debug!(records = receipt.records, "ingest acknowledged");
    Ok(MessageEnvelope::new("Predictions saved successfully"))
}

/// Turns a handler panic into the `INTERNAL_ERROR` envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    tracing::error!(panic = %detail, "request handler panicked");
    ApiError::internal().into_response()
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Readiness: the cache must be reachable. Cached data is never read here.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let cache_mode = state.cache.mode();
    let store_backend = state.store.backend_name();
    match state.cache.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "cache": cache_mode, "store": store_backend})),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "cache": cache_mode,
                    "store": store_backend,
                    "reason": "cache unreachable"
                })),
            )
        }
    }
}

pub async fn metrics() -> Response {
    match crate::metrics::render_metrics() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn panic_becomes_internal_error_envelope() {
        let resp = panic_response(Box::new("index out of bounds"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }
}
