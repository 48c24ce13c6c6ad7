//! Outcome label sets for the prediction markets.
//!
//! Records carry labels as plain strings; these sets back the optional
//! validation in [`crate::PredictionBatch::label_violations`].

use std::fmt;

/// Full-time result ("1x2"): home win, draw, away win.
pub const MATCH_RESULT_LABELS: &[&str] = &["1", "X", "2"];

/// Goal-line markets.
pub const OVER_UNDER_LABELS: &[&str] = &["Over", "Under"];

/// Both teams to score, team to score.
pub const YES_NO_LABELS: &[&str] = &["Yes", "No"];

/// Categorical fields of a prediction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Market {
    MatchResult,
    TotalGoals3_5,
    TotalGoals2_5,
    BothTeamsToScore,
    AwayGoals1_5,
    AwayToScore,
    HomeGoals1_5,
    HomeToScore,
}

impl Market {
    pub const ALL: [Market; 8] = [
        Market::MatchResult,
        Market::TotalGoals3_5,
        Market::TotalGoals2_5,
        Market::BothTeamsToScore,
        Market::AwayGoals1_5,
        Market::AwayToScore,
        Market::HomeGoals1_5,
        Market::HomeToScore,
    ];

    /// JSON field name used on the wire and in the cache.
    pub fn field_name(&self) -> &'static str {
        match self {
            Market::MatchResult => "1x2",
            Market::TotalGoals3_5 => "over_under_3_5g",
            Market::TotalGoals2_5 => "over_under_2_5g",
            Market::BothTeamsToScore => "btts",
            Market::AwayGoals1_5 => "away_over_under_1_5",
            Market::AwayToScore => "away_to_score",
            Market::HomeGoals1_5 => "home_over_under_1_5",
            Market::HomeToScore => "home_to_score",
        }
    }

    pub fn allowed_labels(&self) -> &'static [&'static str] {
        match self {
            Market::MatchResult => MATCH_RESULT_LABELS,
            Market::TotalGoals3_5
            | Market::TotalGoals2_5
            | Market::AwayGoals1_5
            | Market::HomeGoals1_5 => OVER_UNDER_LABELS,
            Market::BothTeamsToScore | Market::AwayToScore | Market::HomeToScore => YES_NO_LABELS,
        }
    }

    /// Labels are case-sensitive, matching what producers emit.
    pub fn accepts(&self, label: &str) -> bool {
        self.allowed_labels().contains(&label)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}
