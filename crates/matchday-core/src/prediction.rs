use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CoreError, LabelViolation, Result};
use crate::labels::Market;

/// One match's set of market predictions.
///
/// Categorical fields are kept as the producer sent them; see
/// [`PredictionBatch::label_violations`] for optional checking. Absent
/// string fields read as empty, as producers drop keys they could not fill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRecord {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(rename = "1x2")]
    pub result_1x2: String,
    pub over_under_3_5g: String,
    pub over_under_2_5g: String,
    pub btts: String,
    pub away_over_under_1_5: String,
    pub away_to_score: String,
    pub home_over_under_1_5: String,
    pub home_to_score: String,
    /// Creation time as reported by the producer. Serialized as RFC 3339.
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl PredictionRecord {
    /// Value of a categorical field.
    pub fn label(&self, market: Market) -> &str {
        match market {
            Market::MatchResult => &self.result_1x2,
            Market::TotalGoals3_5 => &self.over_under_3_5g,
            Market::TotalGoals2_5 => &self.over_under_2_5g,
            Market::BothTeamsToScore => &self.btts,
            Market::AwayGoals1_5 => &self.away_over_under_1_5,
            Market::AwayToScore => &self.away_to_score,
            Market::HomeGoals1_5 => &self.home_over_under_1_5,
            Market::HomeToScore => &self.home_to_score,
        }
    }

    fn check_structure(&self, index: usize) -> Result<()> {
        if self.match_id.trim().is_empty() {
            return Err(CoreError::invalid_record(index, "match_id must not be empty"));
        }
        Ok(())
    }
}

/// Today's predictions, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionBatch(Vec<PredictionRecord>);

impl PredictionBatch {
    pub fn new(records: Vec<PredictionRecord>) -> Self {
        Self(records)
    }

    /// Parse a request body or cache value.
    ///
    /// Fails on malformed JSON and on records that break structural
    /// invariants (empty `match_id`). Labels are not checked here.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let batch: Self = serde_json::from_slice(bytes)?;
        batch.check_structure()?;
        Ok(batch)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    pub fn check_structure(&self) -> Result<()> {
        self.0
            .iter()
            .enumerate()
            .try_for_each(|(index, record)| record.check_structure(index))
    }

    /// Every categorical value outside its market's label set.
    pub fn label_violations(&self) -> Vec<LabelViolation> {
        let mut violations = Vec::new();
        for (index, record) in self.0.iter().enumerate() {
            for market in Market::ALL {
                let value = record.label(market);
                if !market.accepts(value) {
                    violations.push(LabelViolation {
                        index,
                        market,
                        value: value.to_string(),
                    });
                }
            }
        }
        violations
    }

    /// Fails with [`CoreError::InvalidLabels`] when any label is off-set.
    pub fn validate_labels(&self) -> Result<()> {
        let violations = self.label_violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidLabels(violations))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PredictionRecord> {
        self.0.iter()
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.0
    }

    pub fn into_records(self) -> Vec<PredictionRecord> {
        self.0
    }
}

impl From<Vec<PredictionRecord>> for PredictionBatch {
    fn from(records: Vec<PredictionRecord>) -> Self {
        Self(records)
    }
}

impl<'a> IntoIterator for &'a PredictionBatch {
    type Item = &'a PredictionRecord;
    type IntoIter = std::slice::Iter<'a, PredictionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
