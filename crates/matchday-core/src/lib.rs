//! Core data model for the matchday prediction service.
//!
//! A [`PredictionBatch`] is the unit of work on both paths: the ingest path
//! persists it record by record and publishes it whole into the cache, the
//! serving path reads it back unchanged.

pub mod error;
pub mod labels;
pub mod prediction;

pub use error::{CoreError, LabelViolation, Result};
pub use labels::{MATCH_RESULT_LABELS, Market, OVER_UNDER_LABELS, YES_NO_LABELS};
pub use prediction::{PredictionBatch, PredictionRecord};
