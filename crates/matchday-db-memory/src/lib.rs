//! In-memory append-only store for prediction records.
//!
//! Used as the development default and by tests. Documents live for the
//! lifetime of the process.
//!
//! ```ignore
//! use matchday_db_memory::InMemoryStore;
//! use matchday_storage::PredictionStore;
//!
//! let store = InMemoryStore::new();
//! store.insert(&record).await?;
//! assert_eq!(store.count().await?, 1);
//! ```

mod storage;

pub use matchday_storage::{PredictionStore, StorageError, StoredPrediction};
pub use storage::InMemoryStore;

/// Creates a new shareable in-memory store.
pub fn create_store() -> matchday_storage::DynPredictionStore {
    std::sync::Arc::new(InMemoryStore::new())
}
