//! Write path: persist each record durably, then publish the batch.

use std::time::Duration;

use matchday_core::{CoreError, LabelViolation, PredictionBatch};
use matchday_storage::{DynPredictionStore, StorageError};
use tracing::{error, info, instrument};

use crate::cache::{CacheError, PredictionCache};
use crate::metrics;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The body is not a batch. Nothing was written.
    #[error("malformed prediction batch: {0}")]
    Parse(#[source] CoreError),

    /// Label validation is on and some labels are outside their sets.
    /// Nothing was written.
    #[error("{} invalid outcome label(s)", .0.len())]
    Validation(Vec<LabelViolation>),

    /// Insert of record `failed_index` failed. Records before it are
    /// persisted; the cache was not touched.
    #[error("durable insert failed at record {failed_index} ({persisted} persisted): {source}")]
    Persistence {
        failed_index: usize,
        persisted: usize,
        #[source]
        source: StorageError,
    },

    /// Every record is persisted but the batch did not reach the cache.
    #[error("cache publish failed: {0}")]
    Cache(#[source] CacheError),
}

impl IngestError {
    fn outcome(&self) -> &'static str {
        match self {
            IngestError::Parse(_) => "parse_error",
            IngestError::Validation(_) => "validation_error",
            IngestError::Persistence { .. } => "persistence_error",
            IngestError::Cache(_) => "cache_error",
        }
    }
}

/// Acknowledgment of a fully ingested batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReceipt {
    pub records: usize,
}

/// Owns writes to the durable store and the prediction cache.
///
/// Concurrent submissions are not coordinated; the last publish wins.
#[derive(Clone)]
pub struct IngestService {
    store: DynPredictionStore,
    cache: PredictionCache,
    insert_timeout: Duration,
    validate_labels: bool,
}

impl IngestService {
    pub fn new(store: DynPredictionStore, cache: PredictionCache, insert_timeout: Duration) -> Self {
        Self {
            store,
            cache,
            insert_timeout,
            validate_labels: false,
        }
    }

    #[must_use]
    pub fn with_label_validation(mut self, enabled: bool) -> Self {
        self.validate_labels = enabled;
        self
    }

    /// Parse a request body and submit it.
    pub async fn submit_json(&self, body: &[u8]) -> Result<IngestReceipt, IngestError> {
        let batch = match PredictionBatch::from_json_slice(body) {
            Ok(batch) => batch,
            Err(e) => {
                metrics::record_ingest("parse_error");
                return Err(IngestError::Parse(e));
            }
        };
        self.submit(&batch).await
    }

    #[instrument(skip_all, fields(records = batch.len()))]
    pub async fn submit(&self, batch: &PredictionBatch) -> Result<IngestReceipt, IngestError> {
        let result = self.run(batch).await;
        match &result {
            Ok(receipt) => {
                info!(records = receipt.records, "predictions saved and published");
                metrics::record_ingest("ok");
            }
            Err(e) => metrics::record_ingest(e.outcome()),
        }
        result
    }

    async fn run(&self, batch: &PredictionBatch) -> Result<IngestReceipt, IngestError> {
        if self.validate_labels {
            let violations = batch.label_violations();
            if !violations.is_empty() {
                return Err(IngestError::Validation(violations));
            }
        }

        for (index, record) in batch.iter().enumerate() {
            let inserted = tokio::time::timeout(self.insert_timeout, self.store.insert(record))
                .await
                .unwrap_or(Err(StorageError::Timeout(self.insert_timeout)));

            if let Err(source) = inserted {
                metrics::record_records_persisted(index);
                error!(
                    failed_index = index,
                    persisted = index,
                    match_id = %record.match_id,
                    backend = self.store.backend_name(),
                    category = %source.category(),
                    error = %source,
                    "persistence failure; batch aborted before cache publish"
                );
                return Err(IngestError::Persistence {
                    failed_index: index,
                    persisted: index,
                    source,
                });
            }
        }
        metrics::record_records_persisted(batch.len());

        if let Err(e) = self.cache.publish(batch).await {
            error!(
                records = batch.len(),
                key = self.cache.key(),
                mode = self.cache.backend().mode(),
                error = %e,
                "cache publish failure; records are persisted but not served"
            );
            return Err(IngestError::Cache(e));
        }

        Ok(IngestReceipt {
            records: batch.len(),
        })
    }
}
