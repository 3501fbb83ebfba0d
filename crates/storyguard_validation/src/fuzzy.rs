//! Lenient matching for narratives that refer to characters indirectly.

use crate::{EntityValidator, PresenceValidator, signals};
use std::collections::BTreeMap;
use storyguard_core::{ValidationConfig, ValidationResult};
use storyguard_error::StoryguardResult;
use tracing::debug;

/// Score for a cut-off name such as "Gid--".
pub const TRUNCATED_SCORE: f64 = 0.6;
/// Score for a lone expected entity referred to only by pronoun.
pub const PRONOUN_SCORE: f64 = 0.5;
/// Score for a lone expected entity implied by a subjectless action.
pub const INFERRED_ACTION_SCORE: f64 = 0.5;

/// Extends deterministic scoring with truncation, pronoun and action inference.
///
/// Pronoun resolution and action inference only apply when exactly one
/// entity is expected and the text names no group or unnamed figure that
/// could be the referent instead.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct FuzzyValidator {
    /// Deterministic scorer used for direct and partial matches.
    base: EntityValidator,
}

impl Default for FuzzyValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl FuzzyValidator {
    /// Create a fuzzy validator with the given thresholds.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            base: EntityValidator::new(config),
        }
    }

    /// Fuzzy score for one entity; `sole` marks a single expected entity.
    pub fn score_entity(&self, narrative: &str, name: &str, sole: bool) -> f64 {
        let mut score = self.base.score_entity(narrative, name);
        if signals::truncated_mention(narrative, name) {
            score = score.max(TRUNCATED_SCORE);
        }
        if sole && score == 0.0 && !signals::has_group_subject(narrative) {
            if signals::has_pronouns(narrative) {
                score = PRONOUN_SCORE;
            } else if signals::has_subjectless_action(narrative) {
                score = INFERRED_ACTION_SCORE;
            }
        }
        score
    }
}

impl PresenceValidator for FuzzyValidator {
    fn name(&self) -> &str {
        "fuzzy"
    }

    fn validate(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> StoryguardResult<ValidationResult> {
        let threshold = *self.base.min_confidence_threshold();
        if expected_entities.is_empty() {
            return Ok(ValidationResult::new(Vec::new(), Vec::new(), 1.0, threshold));
        }

        let sole = expected_entities.len() == 1;
        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut scores = BTreeMap::new();
        for name in expected_entities {
            let score = self.score_entity(narrative, name, sole);
            debug!(entity = %name, score, "Fuzzy score");
            if score >= *self.base.found_threshold() {
                found.push(name.clone());
            } else if !missing.contains(name) {
                missing.push(name.clone());
            }
            scores.insert(name.clone(), score);
        }
        let confidence = expected_entities
            .iter()
            .map(|name| scores[name])
            .sum::<f64>()
            / expected_entities.len() as f64;
        let suggestions = self
            .base
            .generate_retry_suggestions(&missing, &[], location);

        Ok(ValidationResult::new(found, missing, confidence, threshold)
            .with_entity_scores(scores)
            .with_suggestions(suggestions))
    }
}
