//! # matchday-storage
//!
//! Durable-store abstraction for prediction records.
//!
//! The durable store is an append-only audit trail: every ingested record is
//! inserted as an independent document and nothing is ever updated, merged,
//! or expired. The read path never consults it.
//!
//! Backends live in separate crates (`matchday-db-memory`,
//! `matchday-db-postgres`) and implement [`PredictionStore`].
//!
//! ```ignore
//! use matchday_storage::{PredictionStore, StorageError};
//!
//! async fn persist_all(
//!     store: &dyn PredictionStore,
//!     batch: &PredictionBatch,
//! ) -> Result<usize, StorageError> {
//!     for record in batch {
//!         store.insert(record).await?;
//!     }
//!     Ok(batch.len())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::PredictionStore;
pub use types::StoredPrediction;

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle to a store backend.
pub type DynPredictionStore = std::sync::Arc<dyn PredictionStore>;
