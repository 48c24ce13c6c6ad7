use async_trait::async_trait;
use matchday_core::PredictionRecord;

use crate::{StorageError, StoredPrediction};

/// Append-only durable store for prediction records.
///
/// Implementations must be thread-safe (`Send + Sync`); inserts are
/// independent and may run concurrently.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Inserts one record as a new document.
    ///
    /// Never updates or deduplicates: inserting the same record twice yields
    /// two documents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InsertFailed`, `ConnectionError` or `Timeout`
    /// when the document was not written.
    async fn insert(&self, record: &PredictionRecord) -> Result<StoredPrediction, StorageError>;

    /// Total number of documents ever inserted.
    async fn count(&self) -> Result<u64, StorageError>;

    /// All documents for a match id, oldest first.
    async fn list_by_match(&self, match_id: &str) -> Result<Vec<StoredPrediction>, StorageError>;

    /// Short backend name for logs and readiness output.
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness check against the backend.
    async fn health_check(&self) -> Result<(), StorageError> {
        self.count().await.map(|_| ())
    }
}
