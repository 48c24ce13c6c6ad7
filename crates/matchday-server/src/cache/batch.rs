use std::time::Duration;

use matchday_core::{CoreError, PredictionBatch};

use super::backend::{CacheBackend, CacheError};

/// Why today's batch could not be read.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Nothing published yet, or the entry expired.
    #[error("no predictions cached")]
    NotFound,

    #[error("prediction cache unavailable: {0}")]
    CacheUnavailable(#[source] CacheError),

    /// A value is present but does not decode as a batch.
    #[error("cached predictions are corrupt: {0}")]
    CorruptCacheEntry(#[source] CoreError),
}

/// Today's batch under one well-known key.
#[derive(Debug, Clone)]
pub struct PredictionCache {
    backend: CacheBackend,
    key: String,
    ttl: Duration,
}

impl PredictionCache {
    pub fn new(backend: CacheBackend, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            key: key.into(),
            ttl,
        }
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serialize the batch and overwrite the key.
    pub async fn publish(&self, batch: &PredictionBatch) -> Result<(), CacheError> {
        let bytes = batch
            .to_json_vec()
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.backend.set(&self.key, bytes, self.ttl).await
    }

    /// Read and decode the batch.
    pub async fn load(&self) -> Result<PredictionBatch, FetchError> {
        let bytes = self
            .backend
            .get(&self.key)
            .await
            .map_err(FetchError::CacheUnavailable)?
            .ok_or(FetchError::NotFound)?;

        PredictionBatch::from_json_slice(&bytes).map_err(FetchError::CorruptCacheEntry)
    }

    /// Write raw bytes under the key, bypassing serialization.
    pub async fn put_raw(&self, bytes: Vec<u8>) -> Result<(), CacheError> {
        self.backend.set(&self.key, bytes, self.ttl).await
    }
}
