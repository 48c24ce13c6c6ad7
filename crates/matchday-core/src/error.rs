use std::fmt;

use thiserror::Error;

use crate::labels::Market;

/// Core error types for prediction data handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid prediction at index {index}: {message}")]
    InvalidRecord { index: usize, message: String },

    #[error("{} invalid outcome label(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    InvalidLabels(Vec<LabelViolation>),
}

impl CoreError {
    /// Create a new InvalidRecord error
    pub fn invalid_record(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            message: message.into(),
        }
    }

    /// True when the input itself could not be read as a batch.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::JsonError(_) | Self::InvalidRecord { .. })
    }
}

/// A categorical field whose value is outside the market's label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelViolation {
    /// Position of the record in the batch.
    pub index: usize,
    pub market: Market,
    pub value: String,
}

impl fmt::Display for LabelViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {}: {} = {:?} (expected one of {:?})",
            self.index,
            self.market.field_name(),
            self.value,
            self.market.allowed_labels()
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_record_display() {
        let err = CoreError::invalid_record(3, "match_id must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid prediction at index 3: match_id must not be empty"
        );
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_label_violation_display() {
        let violation = LabelViolation {
            index: 0,
            market: Market::MatchResult,
            value: "Home".into(),
        };
        let msg = violation.to_string();
        assert!(msg.contains("1x2"));
        assert!(msg.contains("\"Home\""));

        let err = CoreError::InvalidLabels(vec![violation]);
        assert!(err.to_string().starts_with("1 invalid outcome label(s)"));
        assert!(!err.is_parse_error());
    }
}
