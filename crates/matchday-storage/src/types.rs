use matchday_core::PredictionRecord;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A prediction record as held by the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPrediction {
    /// Backend-assigned document id.
    pub id: String,
    pub record: PredictionRecord,
    /// When the document was inserted.
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,
}

impl StoredPrediction {
    /// Creates a new `StoredPrediction` stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, record: PredictionRecord) -> Self {
        Self {
            id: id.into(),
            record,
            inserted_at: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.record.match_id
    }
}
