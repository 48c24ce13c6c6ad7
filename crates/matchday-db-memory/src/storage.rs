use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use matchday_core::PredictionRecord;
use matchday_storage::{PredictionStore, StorageError, StoredPrediction};
use tokio::sync::RwLock;

/// Append-only in-memory store.
///
/// Ids are assigned from a monotonically increasing counter, so the
/// document log is always in insertion order.
#[derive(Debug)]
pub struct InMemoryStore {
    documents: RwLock<Vec<StoredPrediction>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of every document, oldest first.
    pub async fn documents(&self) -> Vec<StoredPrediction> {
        self.documents.read().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionStore for InMemoryStore {
    async fn insert(&self, record: &PredictionRecord) -> Result<StoredPrediction, StorageError> {
        // Id assignment and push happen under the same write lock so ids stay ordered.
        let mut documents = self.documents.write().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = StoredPrediction::new(id.to_string(), record.clone());
        documents.push(stored.clone());
        tracing::trace!(id, match_id = %record.match_id, "stored prediction in memory");
        Ok(stored)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.documents.read().await.len() as u64)
    }

    async fn list_by_match(&self, match_id: &str) -> Result<Vec<StoredPrediction>, StorageError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| doc.match_id() == match_id)
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
