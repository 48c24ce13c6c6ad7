//! Durable-store selection.

use std::sync::Arc;

use matchday_db_memory::InMemoryStore;
use matchday_db_postgres::PostgresStore;
use matchday_storage::{DynPredictionStore, StorageError};

use crate::config::{StorageBackendKind, StorageConfig};

/// The configured durable store, kept concrete so it can be closed on shutdown.
#[derive(Clone)]
pub enum StorageBackend {
    Memory(Arc<InMemoryStore>),
    Postgres(PostgresStore),
}

impl StorageBackend {
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.backend {
            StorageBackendKind::Memory => {
                tracing::info!("Using in-memory durable store");
                Ok(StorageBackend::Memory(Arc::new(InMemoryStore::new())))
            }
            StorageBackendKind::Postgres => {
                let pg = config
                    .postgres
                    .clone()
                    .ok_or_else(|| StorageError::internal("storage.postgres is not configured"))?;
                let store = PostgresStore::new(pg).await?;
                tracing::info!("Using PostgreSQL durable store");
                Ok(StorageBackend::Postgres(store))
            }
        }
    }

    pub fn as_dyn(&self) -> DynPredictionStore {
        match self {
            StorageBackend::Memory(store) => store.clone(),
            StorageBackend::Postgres(store) => Arc::new(store.clone()),
        }
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        if let StorageBackend::Postgres(store) = self {
            store.close().await;
            tracing::info!("PostgreSQL pool closed");
        }
    }
}
