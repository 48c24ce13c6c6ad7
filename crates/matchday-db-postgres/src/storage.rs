//! `PredictionStore` implementation backed by PostgreSQL.

use async_trait::async_trait;
use matchday_core::PredictionRecord;
use matchday_storage::{PredictionStore, StorageError, StoredPrediction};
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use sqlx_core::types::Json;
use sqlx_postgres::PgPool;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::config::PostgresConfig;
use crate::error::PostgresError;
use crate::{migrations, pool};

/// Append-only store over the `predictions` table.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects, optionally running migrations first.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or a migration fails.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Wraps an existing pool. Migrations are not run.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

type DocumentRow = (i64, Json<PredictionRecord>, OffsetDateTime);

fn row_to_stored((id, Json(record), inserted_at): DocumentRow) -> StoredPrediction {
    StoredPrediction {
        id: id.to_string(),
        record,
        inserted_at,
    }
}

#[async_trait]
impl PredictionStore for PostgresStore {
    #[instrument(skip(self, record), fields(match_id = %record.match_id))]
    async fn insert(&self, record: &PredictionRecord) -> Result<StoredPrediction, StorageError> {
        let (id, inserted_at): (i64, OffsetDateTime) = query_as(
            "INSERT INTO predictions (match_id, document) VALUES ($1, $2) \
             RETURNING id, inserted_at",
        )
        .bind(&record.match_id)
        .bind(Json(record))
        .fetch_one(&self.pool)
        .await
        .map_err(PostgresError::from)?;

        debug!(id, "inserted prediction document");

        Ok(StoredPrediction {
            id: id.to_string(),
            record: record.clone(),
            inserted_at,
        })
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(count.max(0) as u64)
    }

    async fn list_by_match(&self, match_id: &str) -> Result<Vec<StoredPrediction>, StorageError> {
        let rows: Vec<DocumentRow> = query_as(
            "SELECT id, document, inserted_at FROM predictions \
             WHERE match_id = $1 ORDER BY id",
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
        .map_err(PostgresError::from)?;

        Ok(rows.into_iter().map(row_to_stored).collect())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx_core::query::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(())
    }
}
