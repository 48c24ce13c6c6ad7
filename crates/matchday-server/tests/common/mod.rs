//! Fixtures shared by the server integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use matchday_core::{PredictionBatch, PredictionRecord};
use matchday_db_memory::InMemoryStore;
use matchday_storage::{PredictionStore, StorageError, StoredPrediction};

pub fn record(match_id: &str, home: &str, away: &str) -> PredictionRecord {
    PredictionRecord {
        match_id: match_id.to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        result_1x2: "1".to_string(),
        over_under_3_5g: "Under".to_string(),
        over_under_2_5g: "Over".to_string(),
        btts: "Yes".to_string(),
        away_over_under_1_5: "Under".to_string(),
        away_to_score: "Yes".to_string(),
        home_over_under_1_5: "Over".to_string(),
        home_to_score: "Yes".to_string(),
        timestamp: None,
    }
}

pub fn batch_a() -> PredictionBatch {
    PredictionBatch::new(vec![
        record("m-1001", "Arsenal", "Chelsea"),
        record("m-1002", "Lazio", "Roma"),
    ])
}

pub fn batch_b() -> PredictionBatch {
    PredictionBatch::new(vec![
        record("m-2001", "Ajax", "PSV"),
        record("m-2002", "Benfica", "Porto"),
        record("m-2003", "Celtic", "Rangers"),
    ])
}

/// Wraps an in-memory store and fails the insert with the given zero-based
/// position, counting every insert attempt made through it.
pub struct FailingStore {
    pub inner: Arc<InMemoryStore>,
    fail_at: Option<usize>,
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn failing_at(fail_at: usize) -> Self {
        Self {
            inner: Arc::new(InMemoryStore::new()),
            fail_at: Some(fail_at),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Every insert fails.
    pub fn always() -> Self {
        Self::failing_at(0)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionStore for FailingStore {
    async fn insert(&self, record: &PredictionRecord) -> Result<StoredPrediction, StorageError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.fail_at {
            Some(k) if attempt >= k => Err(StorageError::insert_failed("injected write failure")),
            _ => self.inner.insert(record).await,
        }
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.inner.count().await
    }

    async fn list_by_match(&self, match_id: &str) -> Result<Vec<StoredPrediction>, StorageError> {
        self.inner.list_by_match(match_id).await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Store whose inserts never complete within any reasonable deadline.
pub struct StalledStore;

#[async_trait]
impl PredictionStore for StalledStore {
    async fn insert(&self, record: &PredictionRecord) -> Result<StoredPrediction, StorageError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(StoredPrediction::new("never", record.clone()))
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(0)
    }

    async fn list_by_match(&self, _match_id: &str) -> Result<Vec<StoredPrediction>, StorageError> {
        Ok(Vec::new())
    }

    fn backend_name(&self) -> &'static str {
        "stalled"
    }
}
