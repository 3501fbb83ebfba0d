//! Regenerate a narrative until every expected entity is present.

use crate::EntityValidator;
use storyguard_core::{NarrativeDriver, StoryguardConfig, ValidationResult};
use tracing::{debug, info, instrument, warn};

/// Final state of a validate-and-retry loop.
#[derive(Debug, Clone, PartialEq, serde::Serialize, derive_getters::Getters)]
pub struct RetryOutcome {
    /// Verdict on `final_narrative`.
    result: ValidationResult,
    /// Number of regenerations performed.
    attempts: u32,
    /// The last narrative that was validated.
    final_narrative: String,
}

/// Validates a narrative and asks a driver for corrected versions on failure.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct EntityRetryManager {
    validator: EntityValidator,
    max_retries: u32,
}

impl Default for EntityRetryManager {
    fn default() -> Self {
        Self::from_config(&StoryguardConfig::default())
    }
}

/// Base prompt asking the driver to revise `narrative`.
fn revision_request(narrative: &str) -> String {
    format!("Revise the following narrative so that every listed character is present.\n\n{narrative}")
}

impl EntityRetryManager {
    /// Create a manager around `validator` with a default retry budget.
    pub fn new(validator: EntityValidator, max_retries: u32) -> Self {
        Self {
            validator,
            max_retries,
        }
    }

    /// Create a manager from validation, hint and retry configuration.
    pub fn from_config(config: &StoryguardConfig) -> Self {
        Self::new(EntityValidator::from_config(config), config.retry.max_retries)
    }

    /// Validate, regenerating up to `max_retries` times while a retry is needed.
    ///
    /// Without a callback the narrative is validated once and zero attempts
    /// are reported.
    pub fn validate_with_retry(
        &self,
        narrative: &str,
        expected_entities: &[String],
        retry_callback: Option<&dyn NarrativeDriver>,
        max_retries: u32,
    ) -> (ValidationResult, u32) {
        let outcome = self.retry_loop(narrative, expected_entities, None, retry_callback, max_retries);
        (outcome.result, outcome.attempts)
    }

    /// Like [`validate_with_retry`](Self::validate_with_retry) with the
    /// configured budget, keeping the final narrative.
    pub fn run(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
        retry_callback: Option<&dyn NarrativeDriver>,
    ) -> RetryOutcome {
        self.retry_loop(
            narrative,
            expected_entities,
            location,
            retry_callback,
            self.max_retries,
        )
    }

    #[instrument(skip(self, narrative, expected_entities, retry_callback), fields(expected = expected_entities.len()))]
    fn retry_loop(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
        retry_callback: Option<&dyn NarrativeDriver>,
        max_retries: u32,
    ) -> RetryOutcome {
        let mut current = narrative.to_string();
        let mut result = self
            .validator
            .validate_entity_presence(&current, expected_entities, location);
        let mut attempts = 0;

        if let Some(driver) = retry_callback {
            while result.retry_needed() && attempts < max_retries {
                let prompt =
                    self.validator
                        .create_retry_prompt(&revision_request(&current), &result, location);
                current = driver.generate(&prompt);
                attempts += 1;
                result = self
                    .validator
                    .validate_entity_presence(&current, expected_entities, location);
                debug!(attempt = attempts, passed = result.passed(), "Retry attempt validated");
            }
        }

        if result.retry_needed() {
            warn!(
                attempts,
                missing = ?result.missing_entities(),
                "Entities still missing after retries"
            );
        } else if attempts > 0 {
            info!(attempts, "Narrative repaired by retry");
        }

        RetryOutcome {
            result,
            attempts,
            final_narrative: current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_callback_validates_once() {
        let manager = EntityRetryManager::default();
        let (result, attempts) =
            manager.validate_with_retry("Sariel draws.", &names(&["Cassian"]), None, 3);
        assert!(result.retry_needed());
        assert_eq!(attempts, 0);
    }

    #[test]
    fn test_passing_narrative_never_calls_driver() {
        let manager = EntityRetryManager::default();
        let calls = Cell::new(0);
        let driver = |_: &str| {
            calls.set(calls.get() + 1);
            String::new()
        };
        let (result, attempts) =
            manager.validate_with_retry("Sariel draws.", &names(&["Sariel"]), Some(&driver), 3);
        assert!(result.passed());
        assert_eq!(attempts, 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_stops_at_budget() {
        let manager = EntityRetryManager::default();
        let driver = |_: &str| "Still nobody.".to_string();
        let (result, attempts) =
            manager.validate_with_retry("Nobody.", &names(&["Sariel"]), Some(&driver), 2);
        assert!(!result.passed());
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_repairs_on_second_attempt() {
        let manager = EntityRetryManager::default();
        let calls = Cell::new(0);
        let driver = |prompt: &str| {
            calls.set(calls.get() + 1);
            assert!(prompt.contains("RETRY INSTRUCTIONS"));
            if calls.get() == 2 {
                "Sariel draws her sword.".to_string()
            } else {
                "Nobody.".to_string()
            }
        };
        let outcome = manager.run("Nobody.", &names(&["Sariel"]), None, Some(&driver));
        assert!(outcome.result().passed());
        assert_eq!(*outcome.attempts(), 2);
        assert_eq!(outcome.final_narrative(), "Sariel draws her sword.");
    }
}
