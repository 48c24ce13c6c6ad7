//! Read path. Touches only the cache.

use matchday_core::PredictionBatch;

use crate::cache::{FetchError, PredictionCache};

#[derive(Clone)]
pub struct ServingService {
    cache: PredictionCache,
}

impl ServingService {
    pub fn new(cache: PredictionCache) -> Self {
        Self { cache }
    }

    /// Today's batch exactly as published.
    pub async fn fetch(&self) -> Result<PredictionBatch, FetchError> {
        let result = self.cache.load().await;
        match &result {
            Ok(batch) => tracing::debug!(records = batch.len(), "served cached predictions"),
            Err(FetchError::NotFound) => tracing::debug!("no cached predictions"),
            Err(FetchError::CacheUnavailable(e)) => {
                tracing::error!(error = %e, "prediction cache unavailable")
            }
            Err(FetchError::CorruptCacheEntry(e)) => {
                tracing::error!(key = self.cache.key(), error = %e, "corrupt prediction cache entry")
            }
        }
        result
    }
}
