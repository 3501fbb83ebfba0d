//! Plain token matching.

use crate::{PresenceValidator, entity::generic_suggestion, signals};
use std::collections::BTreeMap;
use storyguard_core::{ValidationConfig, ValidationResult};
use storyguard_error::StoryguardResult;

/// Name-token coverage at which the token strategy reports an entity found.
const TOKEN_FOUND_THRESHOLD: f64 = 0.5;

/// Scores entities by whole-word token coverage only.
///
/// A full-name match scores 1.0; otherwise the score is the fraction of the
/// name's non-honorific tokens that appear as words.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct TokenValidator {
    /// Overall confidence below which a retry is requested.
    min_confidence_threshold: f64,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

impl TokenValidator {
    /// Create a token validator with the configured confidence threshold.
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            min_confidence_threshold: config.min_confidence_threshold,
        }
    }

    /// Token coverage score for one entity.
    pub fn score_entity(&self, narrative: &str, name: &str) -> f64 {
        if signals::direct_mention(narrative, name) {
            return 1.0;
        }
        let significant: Vec<String> = signals::name_tokens(name)
            .into_iter()
            .filter(|token| !signals::is_honorific(token))
            .collect();
        if significant.is_empty() {
            return 0.0;
        }
        let matched = significant
            .iter()
            .filter(|token| signals::direct_mention(narrative, token))
            .count();
        matched as f64 / significant.len() as f64
    }
}

impl PresenceValidator for TokenValidator {
    fn name(&self) -> &str {
        "token"
    }

    fn validate(
        &self,
        narrative: &str,
        expected_entities: &[String],
        _location: Option<&str>,
    ) -> StoryguardResult<ValidationResult> {
        if expected_entities.is_empty() {
            return Ok(ValidationResult::new(
                Vec::new(),
                Vec::new(),
                1.0,
                self.min_confidence_threshold,
            ));
        }

        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut scores = BTreeMap::new();
        for name in expected_entities {
            let score = self.score_entity(narrative, name);
            if score >= TOKEN_FOUND_THRESHOLD {
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
        let suggestions = missing.iter().map(|name| generic_suggestion(name)).collect();

        Ok(
            ValidationResult::new(found, missing, confidence, self.min_confidence_threshold)
                .with_entity_scores(scores)
                .with_suggestions(suggestions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_scores() {
        let validator = TokenValidator::default();
        assert_eq!(validator.score_entity("Lady Cressida bows.", "Lady Cressida"), 1.0);
        assert_eq!(validator.score_entity("Cressida bows.", "Lady Cressida"), 1.0);
        assert_eq!(validator.score_entity("The lady bows.", "Lady Cressida"), 0.0);
        assert_eq!(
            validator.score_entity("Valeriana bows.", "Lady Cressida Valeriana"),
            0.5
        );
    }

    #[test]
    fn test_token_validate() {
        let validator = TokenValidator::default();
        let expected = vec!["Sariel".to_string(), "Cassian".to_string()];
        let result = validator
            .validate("Cassian waits while Sariel reads.", &expected, None)
            .unwrap();
        assert!(result.passed());
        assert_eq!(result.confidence_score(), 1.0);
    }
}
