//! The contract every presence-validation strategy satisfies.

use storyguard_core::ValidationResult;
use storyguard_error::StoryguardResult;
use tracing::warn;

/// A strategy that decides which expected entities a narrative contains.
///
/// Implementations may fail (a judge model can return garbage); callers that
/// must not fail use [`validate_or_fail`], which folds the error into a
/// failing [`ValidationResult`].
pub trait PresenceValidator {
    /// Stable strategy name used in diagnostics.
    fn name(&self) -> &str;

    /// Score `narrative` against `expected_entities`.
    ///
    /// # Errors
    ///
    /// Returns an error when the strategy cannot produce a verdict.
    fn validate(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> StoryguardResult<ValidationResult>;
}

/// Run a strategy, turning any error into a failing result.
///
/// The failing result reports every expected entity missing with zero
/// confidence and carries the error text as a diagnostic.
pub fn validate_or_fail(
    validator: &dyn PresenceValidator,
    narrative: &str,
    expected_entities: &[String],
    location: Option<&str>,
) -> ValidationResult {
    match validator.validate(narrative, expected_entities, location) {
        Ok(result) => result,
        Err(e) => {
            warn!(strategy = validator.name(), error = %e, "Validation strategy failed");
            ValidationResult::failure(expected_entities, format!("{}: {}", validator.name(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyguard_error::{ValidationError, ValidationErrorKind};

    struct Broken;

    impl PresenceValidator for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn validate(&self, _: &str, _: &[String], _: Option<&str>) -> StoryguardResult<ValidationResult> {
            Err(ValidationError::new(ValidationErrorKind::EmptyJudgeResponse))?
        }
    }

    #[test]
    fn test_validate_or_fail_converts_error() {
        let expected = vec!["Sariel".to_string()];
        let result = validate_or_fail(&Broken, "Sariel waits.", &expected, None);

        assert!(!result.passed());
        assert!(result.retry_needed());
        assert_eq!(result.confidence_score(), 0.0);
        assert_eq!(result.missing_entities(), &expected);
        assert!(result.diagnostics()[0].starts_with("broken:"));
    }

    #[test]
    fn test_validate_or_fail_with_empty_expected_still_fails() {
        let result = validate_or_fail(&Broken, "", &[], None);
        assert!(!result.passed());
    }
}
