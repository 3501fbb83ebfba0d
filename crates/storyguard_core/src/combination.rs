//! Voting rules for combining several strategy verdicts.

use serde::{Deserialize, Serialize};

/// How a hybrid validator reconciles per-strategy verdicts for one entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CombinationStrategy {
    /// Every strategy must say yes.
    Unanimous,
    /// More than half of the strategies must say yes.
    #[default]
    Majority,
    /// Weight of the "yes" strategies must exceed half the total weight.
    WeightedVote,
    /// The strategy reporting the highest confidence decides.
    ConfidenceBased,
}
