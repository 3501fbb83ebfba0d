//! Two-pass generation: generate, then ask for the missing entities.

use crate::{EntityValidator, entity::DIRECT_MENTION_SCORE};
use storyguard_core::{
    DualPassResult, GenerationPass, NarrativeDriver, PassNumber, StoryguardConfig,
};
use tracing::{debug, instrument};

/// Generates a narrative and, when entities are missing, a corrective pass.
///
/// A second pass at least `rewrite_ratio` times as long as the first (in
/// characters) is treated as a full rewrite and replaces it. A shorter second
/// pass is treated as a continuation and appended after a blank line.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct DualPassGenerator {
    validator: EntityValidator,
    rewrite_ratio: f64,
}

impl Default for DualPassGenerator {
    fn default() -> Self {
        Self::from_config(&StoryguardConfig::default())
    }
}

impl DualPassGenerator {
    /// Create a generator with an explicit rewrite ratio.
    pub fn new(validator: EntityValidator, rewrite_ratio: f64) -> Self {
        Self {
            validator,
            rewrite_ratio,
        }
    }

    /// Create a generator from validation, hint and dual-pass configuration.
    pub fn from_config(config: &StoryguardConfig) -> Self {
        Self::new(
            EntityValidator::from_config(config),
            config.dual_pass.rewrite_ratio,
        )
    }

    /// Run pass 1 and, if it fails validation, a corrective pass 2.
    #[instrument(skip(self, initial_prompt, generation_callback), fields(expected = expected_entities.len()))]
    pub fn generate_with_dual_pass(
        &self,
        initial_prompt: &str,
        expected_entities: &[String],
        location: Option<&str>,
        generation_callback: &dyn NarrativeDriver,
    ) -> DualPassResult {
        let first_response = generation_callback.generate(initial_prompt);
        let first_validation =
            self.validator
                .validate_entity_presence(&first_response, expected_entities, location);
        let first_pass = GenerationPass::new(PassNumber::First, initial_prompt, first_response.clone())
            .with_validation(first_validation.clone());

        if !first_validation.retry_needed() {
            debug!("First pass complete");
            return DualPassResult::single(first_pass);
        }

        let targets: Vec<String> = if first_validation.missing_entities().is_empty() {
            first_validation
                .found_entities()
                .iter()
                .filter(|name| first_validation.score_for(name) < DIRECT_MENTION_SCORE)
                .cloned()
                .collect()
        } else {
            first_validation.missing_entities().clone()
        };

        let injection_prompt = self.create_injection_prompt(&first_response, &targets, location);
        let second_response = generation_callback.generate(&injection_prompt);
        let second_validation =
            self.validator
                .validate_entity_presence(&second_response, expected_entities, location);
        let final_narrative = self.merge_passes(&first_response, &second_response);
        let final_validation =
            self.validator
                .validate_entity_presence(&final_narrative, expected_entities, location);
        debug!(
            passed = final_validation.passed(),
            found = final_validation.found_entities().len(),
            "Second pass merged"
        );

        let second_pass = GenerationPass::new(PassNumber::Second, injection_prompt, second_response)
            .with_validation(second_validation);
        DualPassResult::merged(first_pass, second_pass, final_narrative, &final_validation)
    }

    /// Prompt asking the model to bring `missing_entities` into the scene.
    pub fn create_injection_prompt(
        &self,
        original_narrative: &str,
        missing_entities: &[String],
        location: Option<&str>,
    ) -> String {
        let mut prompt = String::from(
            "The narrative below is missing characters who are present in the scene:\n",
        );
        for name in missing_entities {
            prompt.push_str(&format!(
                "- {name}: should be naturally present and contribute meaningfully to the scene\n"
            ));
        }
        if let Some(location) = location {
            prompt.push_str(&format!("The scene takes place in {location}.\n"));
        }
        prompt.push_str(&format!(
            "\nOriginal narrative:\n{original_narrative}\n\n\
             Continue or rewrite the scene so that each listed character speaks, acts, \
             or reacts. Keep the events of the original narrative intact."
        ));
        prompt
    }

    /// Combine the two passes into the final narrative.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyguard_validation::DualPassGenerator;
    ///
    /// let generator = DualPassGenerator::default();
    /// assert_eq!(generator.merge_passes("Short.", "A full rewrite."), "A full rewrite.");
    /// assert_eq!(
    ///     generator.merge_passes("A long opening paragraph.", "Cassian nods."),
    ///     "A long opening paragraph.\n\nCassian nods."
    /// );
    /// ```
    pub fn merge_passes(&self, first: &str, second: &str) -> String {
        let first_len = first.chars().count() as f64;
        let second_len = second.chars().count() as f64;
        if second_len >= self.rewrite_ratio * first_len {
            return second.to_string();
        }

        let separator = if first.ends_with('\n') { "\n" } else { "\n\n" };
        format!("{first}{separator}{second}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_continuation_after_newline() {
        let generator = DualPassGenerator::default();
        assert_eq!(
            generator.merge_passes("A long opening paragraph.\n", "Cassian nods."),
            "A long opening paragraph.\n\nCassian nods."
        );
    }

    #[test]
    fn test_merge_ratio() {
        let generator = DualPassGenerator::default();
        assert_eq!(generator.merge_passes("0123456789", "abcdefghi"), "abcdefghi");
        assert_eq!(
            generator.merge_passes("0123456789", "abcdefg"),
            "0123456789\n\nabcdefg"
        );
    }

    #[test]
    fn test_first_pass_success_skips_second() {
        let generator = DualPassGenerator::default();
        let prompts = RefCell::new(Vec::new());
        let driver = |prompt: &str| {
            prompts.borrow_mut().push(prompt.to_string());
            "Sariel draws her sword.".to_string()
        };
        let result = generator.generate_with_dual_pass("Write.", &names(&["Sariel"]), None, &driver);

        assert!(result.success());
        assert!(!result.improvement_achieved());
        assert!(result.second_pass().is_none());
        assert_eq!(prompts.borrow().len(), 1);
    }

    #[test]
    fn test_second_pass_continuation() {
        let generator = DualPassGenerator::default();
        let driver = |prompt: &str| {
            if prompt.starts_with("The narrative below") {
                assert!(prompt.contains("- Cassian"));
                "Cassian nods.".to_string()
            } else {
                "Sariel draws her sword and steps into the hall.".to_string()
            }
        };
        let result =
            generator.generate_with_dual_pass("Write.", &names(&["Sariel", "Cassian"]), None, &driver);

        assert!(result.success());
        assert!(result.improvement_achieved());
        assert_eq!(
            result.final_narrative(),
            "Sariel draws her sword and steps into the hall.\n\nCassian nods."
        );
        assert_eq!(result.total_entities_found(), &names(&["Sariel", "Cassian"]));
    }
}
