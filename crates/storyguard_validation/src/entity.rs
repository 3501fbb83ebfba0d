//! Deterministic entity-presence scoring and retry prompt construction.

use crate::{PresenceValidator, signals};
use std::collections::BTreeMap;
use storyguard_core::{EntityHint, StoryguardConfig, ValidationConfig, ValidationResult};
use storyguard_error::StoryguardResult;
use tracing::{debug, instrument};

/// Score for naming an entity outright.
pub const DIRECT_MENTION_SCORE: f64 = 0.8;
/// Bonus for attributing an action to a directly mentioned entity.
pub const ACTION_ATTRIBUTION_BONUS: f64 = 0.2;
/// Weight applied to the matched-token fraction of a partial name match.
pub const PARTIAL_MATCH_WEIGHT: f64 = 0.8;

/// Generic regeneration advice for an entity with no configured hint.
pub(crate) fn generic_suggestion(name: &str) -> String {
    format!("Include dialogue, actions, or reactions from {name}")
}

/// Scores each expected entity from textual signals.
///
/// | signal | contribution |
/// |---|---|
/// | full name as whole words | 0.8 |
/// | action verb right after the name | +0.2 |
/// | partial name (no full mention) | 0.8 × matched-token fraction |
///
/// An entity is found when its score reaches `found_threshold`. The overall
/// confidence is the mean entity score.
///
/// # Examples
///
/// ```
/// use storyguard_validation::EntityValidator;
///
/// let validator = EntityValidator::default();
/// let expected = vec!["Sariel".to_string(), "Cassian".to_string()];
/// let result = validator.validate_entity_presence("Sariel draws her sword.", &expected, None);
///
/// assert_eq!(result.found_entities(), &vec!["Sariel".to_string()]);
/// assert_eq!(result.missing_entities(), &vec!["Cassian".to_string()]);
/// assert!(result.retry_needed());
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct EntityValidator {
    /// Overall confidence below which a retry is requested.
    min_confidence_threshold: f64,
    /// Per-entity score at which an entity counts as found.
    found_threshold: f64,
    /// Configured per-entity regeneration hints.
    hints: Vec<EntityHint>,
}

impl Default for EntityValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl EntityValidator {
    /// Create a validator from thresholds, with no entity hints.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            min_confidence_threshold: config.min_confidence_threshold,
            found_threshold: config.found_threshold,
            hints: Vec::new(),
        }
    }

    /// Create a validator from the full configuration, including hints.
    pub fn from_config(config: &StoryguardConfig) -> Self {
        Self::new(config.validation.clone()).with_hints(config.entity_hints.clone())
    }

    /// Replace the configured entity hints.
    pub fn with_hints(mut self, hints: Vec<EntityHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Score a single entity against the narrative.
    pub fn score_entity(&self, narrative: &str, name: &str) -> f64 {
        if signals::direct_mention(narrative, name) {
            let bonus = if signals::action_attribution(narrative, name) {
                ACTION_ATTRIBUTION_BONUS
            } else {
                0.0
            };
            return (DIRECT_MENTION_SCORE + bonus).min(1.0);
        }
        PARTIAL_MATCH_WEIGHT * signals::partial_match_fraction(narrative, name)
    }

    /// Check which expected entities the narrative contains.
    ///
    /// An empty expected set passes with full confidence.
    #[instrument(skip(self, narrative), fields(narrative_len = narrative.len(), expected = expected_entities.len()))]
    pub fn validate_entity_presence(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> ValidationResult {
        if expected_entities.is_empty() {
            return ValidationResult::new(Vec::new(), Vec::new(), 1.0, self.min_confidence_threshold);
        }

        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut scores = BTreeMap::new();
        for name in expected_entities {
            let score = self.score_entity(narrative, name);
            debug!(entity = %name, score, "Scored entity");
            if score >= self.found_threshold {
                found.push(name.clone());
            } else if !missing.contains(name) {
                missing.push(name.clone());
            }
            scores.insert(name.clone(), score);
        }

        let confidence = expected_entities
            .iter()
            .map(|name| scores.get(name).copied().unwrap_or(0.0))
            .sum::<f64>()
            / expected_entities.len() as f64;

        let weak: Vec<String> = found
            .iter()
            .filter(|name| scores.get(*name).is_some_and(|s| *s < DIRECT_MENTION_SCORE))
            .cloned()
            .collect();
        let suggestions = self.generate_retry_suggestions(&missing, &weak, location);

        ValidationResult::new(found, missing, confidence, self.min_confidence_threshold)
            .with_entity_scores(scores)
            .with_suggestions(suggestions)
    }

    /// Build regeneration advice for missing and weakly present entities.
    ///
    /// Each missing entity gets its configured hint or a generic line. A
    /// location that names the entity adds a location-specific line.
    pub fn generate_retry_suggestions(
        &self,
        missing: &[String],
        weak: &[String],
        location: Option<&str>,
    ) -> Vec<String> {
        let mut suggestions = Vec::new();

        for name in missing {
            match self.hint_for(name) {
                Some(hint) => suggestions.push(hint.to_string()),
                None => suggestions.push(generic_suggestion(name)),
            }
            if let Some(location) = location
                && location_references(location, name)
            {
                suggestions.push(format!(
                    "{location} is closely tied to {name}; show {name} present and engaged there"
                ));
            }
        }

        for name in weak {
            suggestions.push(format!(
                "Refer to {name} by full name and give {name} a clear action"
            ));
        }

        suggestions
    }

    fn hint_for(&self, name: &str) -> Option<&str> {
        EntityHint::lookup(&self.hints, name)
    }

    /// Extend a prompt with corrective instructions derived from `result`.
    ///
    /// Returns the prompt unchanged when no retry is needed.
    pub fn create_retry_prompt(
        &self,
        original_prompt: &str,
        result: &ValidationResult,
        location: Option<&str>,
    ) -> String {
        if !result.retry_needed() {
            return original_prompt.to_string();
        }

        let mut prompt = format!("{original_prompt}\n\nRETRY INSTRUCTIONS:\n");
        if result.missing_entities().is_empty() {
            prompt.push_str(&format!(
                "The previous response mentioned {} too faintly.\n",
                result.found_entities().join(", ")
            ));
        } else {
            prompt.push_str(&format!(
                "The previous response did not include: {}.\n",
                result.missing_entities().join(", ")
            ));
        }
        for suggestion in result.retry_suggestions() {
            prompt.push_str(&format!("- {suggestion}\n"));
        }
        if let Some(location) = location {
            prompt.push_str(&format!("The scene takes place in {location}.\n"));
        }
        prompt.push_str("Every listed character must be clearly present in the narrative.");
        prompt
    }
}

/// Whether a location name refers to an entity by any significant name token.
fn location_references(location: &str, name: &str) -> bool {
    signals::direct_mention(location, name)
        || signals::name_tokens(name)
            .iter()
            .filter(|token| !signals::is_honorific(token))
            .any(|token| signals::direct_mention(location, token))
}

impl PresenceValidator for EntityValidator {
    fn name(&self) -> &str {
        "entity"
    }

    fn validate(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> StoryguardResult<ValidationResult> {
        Ok(self.validate_entity_presence(narrative, expected_entities, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_expected_passes() {
        let result = EntityValidator::default().validate_entity_presence("Anything.", &[], None);
        assert!(result.passed());
        assert_eq!(result.confidence_score(), 1.0);
    }

    #[test]
    fn test_scores() {
        let validator = EntityValidator::default();
        assert!((validator.score_entity("Sariel draws.", "Sariel") - 1.0).abs() < 1e-9);
        assert!((validator.score_entity("Sariel, at rest.", "Sariel") - 0.8).abs() < 1e-9);
        assert!((validator.score_entity("Cressida waits.", "Lady Cressida") - 0.4).abs() < 1e-9);
        assert_eq!(validator.score_entity("Nobody here.", "Sariel"), 0.0);
    }

    #[test]
    fn test_partial_match_counts_as_found() {
        let validator = EntityValidator::default();
        let result =
            validator.validate_entity_presence("Cressida waits.", &names(&["Lady Cressida"]), None);
        assert!(result.is_found("Lady Cressida"));
        // Found but weak: confidence 0.4 is under the 0.7 threshold.
        assert!(result.retry_needed());
        assert!(result.missing_entities().is_empty());
    }

    #[test]
    fn test_duplicate_expected_names() {
        let validator = EntityValidator::default();
        let result = validator.validate_entity_presence(
            "Nobody is here.",
            &names(&["Sariel", "Sariel"]),
            None,
        );
        assert_eq!(result.missing_entities(), &names(&["Sariel"]));
    }

    #[test]
    fn test_suggestions_use_hints() {
        let validator = EntityValidator::default().with_hints(vec![EntityHint {
            name: "Cassian".into(),
            hint: "Let Cassian speak first".into(),
        }]);
        let result =
            validator.validate_entity_presence("Sariel waits.", &names(&["Sariel", "Cassian"]), None);
        assert_eq!(result.retry_suggestions(), &names(&["Let Cassian speak first"]));
    }

    #[test]
    fn test_location_specific_suggestion() {
        let validator = EntityValidator::default();
        let result = validator.validate_entity_presence(
            "The hall is quiet.",
            &names(&["Lady Cressida"]),
            Some("Cressida's Solar"),
        );
        assert_eq!(result.retry_suggestions().len(), 2);
        assert!(result.retry_suggestions()[1].contains("Cressida's Solar"));
    }

    #[test]
    fn test_retry_prompt_unchanged_when_passing() {
        let validator = EntityValidator::default();
        let result = validator.validate_entity_presence("Sariel draws.", &names(&["Sariel"]), None);
        assert_eq!(validator.create_retry_prompt("Write.", &result, None), "Write.");
    }

    #[test]
    fn test_retry_prompt_lists_missing() {
        let validator = EntityValidator::default();
        let result =
            validator.validate_entity_presence("Sariel draws.", &names(&["Sariel", "Cassian"]), None);
        let prompt = validator.create_retry_prompt("Write.", &result, Some("the Archive"));

        assert!(prompt.starts_with("Write.\n\nRETRY INSTRUCTIONS:"));
        assert!(prompt.contains("did not include: Cassian."));
        assert!(prompt.contains("- Include dialogue, actions, or reactions from Cassian"));
        assert!(prompt.contains("the Archive"));
    }
}
