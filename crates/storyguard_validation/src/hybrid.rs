//! Combining several presence strategies into one verdict.

use crate::{FuzzyValidator, LlmJudgeValidator, PresenceValidator, TokenValidator, validate_or_fail};
use crate::entity::generic_suggestion;
use std::collections::BTreeMap;
use std::sync::Arc;
use storyguard_core::{CombinationStrategy, NarrativeDriver, StoryguardConfig, ValidationResult};
use storyguard_error::{
    BuilderError, BuilderErrorKind, StoryguardResult, ValidationError, ValidationErrorKind,
};
use tracing::{debug, instrument};

/// A strategy paired with its vote weight.
#[derive(Clone, derive_getters::Getters)]
pub struct WeightedStrategy {
    /// The wrapped strategy.
    validator: Arc<dyn PresenceValidator>,
    /// Vote weight used by [`CombinationStrategy::WeightedVote`].
    weight: f64,
}

impl WeightedStrategy {
    /// Pair a strategy with a weight.
    pub fn new(validator: impl PresenceValidator + 'static, weight: f64) -> Self {
        Self {
            validator: Arc::new(validator),
            weight,
        }
    }
}

impl std::fmt::Debug for WeightedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedStrategy")
            .field("validator", &self.validator.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Runs every configured strategy and combines their per-entity votes.
///
/// Strategy errors are folded into failing votes, so one broken strategy
/// never aborts the combined check. The combined confidence is the fraction
/// of expected entities accepted, so two combination rules that accept the
/// same entities produce identical results.
///
/// # Examples
///
/// ```
/// use storyguard_core::CombinationStrategy;
/// use storyguard_validation::{FuzzyValidator, HybridValidatorBuilder, TokenValidator};
///
/// let hybrid = HybridValidatorBuilder::default()
///     .strategy(TokenValidator::default(), 1.0)
///     .strategy(FuzzyValidator::default(), 1.0)
///     .combination(CombinationStrategy::Unanimous)
///     .build()
///     .unwrap();
///
/// let expected = vec!["Sariel".to_string()];
/// let result = hybrid.validate_combined("Sariel draws her sword.", &expected, None);
/// assert!(result.passed());
/// ```
#[derive(Debug, Clone, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct HybridValidator {
    /// Strategies in registration order.
    #[builder(setter(custom), default)]
    strategies: Vec<WeightedStrategy>,
    /// Rule turning per-strategy votes into a decision.
    #[builder(default)]
    combination: CombinationStrategy,
    /// Overall confidence below which a retry is requested.
    #[builder(default = 0.7)]
    min_confidence_threshold: f64,
}

impl HybridValidatorBuilder {
    /// Register a strategy with its vote weight.
    pub fn strategy(&mut self, validator: impl PresenceValidator + 'static, weight: f64) -> &mut Self {
        self.strategies
            .get_or_insert_with(Vec::new)
            .push(WeightedStrategy::new(validator, weight));
        self
    }

    /// Build the HybridValidator.
    ///
    /// # Errors
    ///
    /// Returns an error if no strategy was registered, a weight is negative
    /// or not finite, or the threshold lies outside `[0, 1]`.
    pub fn build(&self) -> StoryguardResult<HybridValidator> {
        let hybrid = self
            .build_internal()
            .map_err(|e| BuilderError::from(e.to_string()))?;
        if hybrid.strategies.is_empty() {
            Err(ValidationError::new(ValidationErrorKind::NoStrategies))?
        }
        if let Some(bad) = hybrid
            .strategies
            .iter()
            .find(|s| !s.weight.is_finite() || s.weight < 0.0)
        {
            Err(BuilderError::new(BuilderErrorKind::InvalidWeight {
                strategy: bad.validator.name().to_string(),
                weight: bad.weight,
            }))?
        }
        if !(0.0..=1.0).contains(&hybrid.min_confidence_threshold) {
            Err(BuilderError::new(BuilderErrorKind::ThresholdOutOfRange {
                name: "min_confidence_threshold".to_string(),
                value: hybrid.min_confidence_threshold,
            }))?
        }
        Ok(hybrid)
    }
}

struct Vote {
    found: bool,
    weight: f64,
    score: f64,
    overall: f64,
}

impl HybridValidator {
    /// Token and fuzzy strategies weighted and combined as configured.
    ///
    /// # Errors
    ///
    /// Propagates builder failures.
    pub fn standard(config: &StoryguardConfig) -> StoryguardResult<Self> {
        Self::configured_builder(config).build()
    }

    /// The standard strategies plus a model judge over `driver`.
    ///
    /// # Errors
    ///
    /// Propagates builder failures.
    pub fn with_judge<D>(config: &StoryguardConfig, driver: D) -> StoryguardResult<Self>
    where
        D: NarrativeDriver + 'static,
    {
        Self::configured_builder(config)
            .strategy(
                LlmJudgeValidator::with_config(driver, &config.validation),
                config.hybrid.weights.llm,
            )
            .build()
    }

    fn configured_builder(config: &StoryguardConfig) -> HybridValidatorBuilder {
        let mut builder = HybridValidatorBuilder::default();
        builder
            .strategy(TokenValidator::new(&config.validation), config.hybrid.weights.token)
            .strategy(FuzzyValidator::new(config.validation.clone()), config.hybrid.weights.fuzzy)
            .combination(config.hybrid.combination_strategy)
            .min_confidence_threshold(config.validation.min_confidence_threshold);
        builder
    }

    /// Run all strategies and combine their verdicts.
    #[instrument(skip(self, narrative), fields(strategies = self.strategies.len(), combination = %self.combination))]
    pub fn validate_combined(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> ValidationResult {
        let results: Vec<(&WeightedStrategy, ValidationResult)> = self
            .strategies
            .iter()
            .map(|strategy| {
                let result =
                    validate_or_fail(strategy.validator.as_ref(), narrative, expected_entities, location);
                (strategy, result)
            })
            .collect();

        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut scores = BTreeMap::new();
        for name in expected_entities {
            let votes: Vec<Vote> = results
                .iter()
                .map(|(strategy, result)| Vote {
                    found: result.is_found(name),
                    weight: strategy.weight,
                    score: result.score_for(name),
                    overall: result.confidence_score(),
                })
                .collect();

            let accepted = self.accepts(&votes);
            debug!(entity = %name, accepted, "Combined votes");
            if accepted {
                if !found.contains(name) {
                    found.push(name.clone());
                }
            } else if !missing.contains(name) {
                missing.push(name.clone());
            }
            let mean = votes.iter().map(|v| v.score).sum::<f64>() / votes.len().max(1) as f64;
            scores.insert(name.clone(), mean);
        }

        let confidence = if expected_entities.is_empty() {
            1.0
        } else {
            expected_entities
                .iter()
                .filter(|name| found.contains(*name))
                .count() as f64
                / expected_entities.len() as f64
        };

        let suggestions = missing.iter().map(|name| generic_suggestion(name)).collect();
        let mut combined =
            ValidationResult::new(found, missing, confidence, self.min_confidence_threshold)
                .with_entity_scores(scores)
                .with_suggestions(suggestions);
        for (strategy, result) in &results {
            for note in result.diagnostics() {
                combined = combined.with_diagnostic(format!("[{}] {}", strategy.validator.name(), note));
            }
        }
        combined
    }

    fn accepts(&self, votes: &[Vote]) -> bool {
        if votes.is_empty() {
            return false;
        }
        match self.combination {
            CombinationStrategy::Unanimous => votes.iter().all(|v| v.found),
            CombinationStrategy::Majority => {
                votes.iter().filter(|v| v.found).count() * 2 > votes.len()
            }
            CombinationStrategy::WeightedVote => {
                let total: f64 = votes.iter().map(|v| v.weight).sum();
                let yes: f64 = votes.iter().filter(|v| v.found).map(|v| v.weight).sum();
                total > 0.0 && yes * 2.0 > total
            }
            CombinationStrategy::ConfidenceBased => {
                let mut best = &votes[0];
                for vote in &votes[1..] {
                    if vote.overall > best.overall {
                        best = vote;
                    }
                }
                best.found
            }
        }
    }
}

impl PresenceValidator for HybridValidator {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn validate(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> StoryguardResult<ValidationResult> {
        Ok(self.validate_combined(narrative, expected_entities, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Reports a fixed found set with a fixed confidence.
    struct Fixed {
        found: Vec<String>,
        confidence: f64,
    }

    impl Fixed {
        fn new(found: &[&str], confidence: f64) -> Self {
            Self {
                found: names(found),
                confidence,
            }
        }
    }

    impl PresenceValidator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn validate(
            &self,
            _: &str,
            expected: &[String],
            _: Option<&str>,
        ) -> StoryguardResult<ValidationResult> {
            let missing = expected
                .iter()
                .filter(|name| !self.found.contains(name))
                .cloned()
                .collect();
            Ok(ValidationResult::new(self.found.clone(), missing, self.confidence, 0.7))
        }
    }

    struct Failing;

    impl PresenceValidator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn validate(&self, _: &str, _: &[String], _: Option<&str>) -> StoryguardResult<ValidationResult> {
            Err(ValidationError::new(ValidationErrorKind::EmptyJudgeResponse))?
        }
    }

    fn hybrid(combination: CombinationStrategy) -> HybridValidator {
        HybridValidatorBuilder::default()
            .strategy(Fixed::new(&["Sariel", "Cassian"], 0.9), 1.0)
            .strategy(Fixed::new(&["Sariel"], 0.5), 1.0)
            .strategy(Fixed::new(&["Sariel"], 0.6), 3.0)
            .combination(combination)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_builder_is_error() {
        assert!(HybridValidatorBuilder::default().build().is_err());
    }

    #[test]
    fn test_bad_weight_is_error() {
        let err = HybridValidatorBuilder::default()
            .strategy(TokenValidator::default(), f64::NAN)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("'token'"));

        assert!(
            HybridValidatorBuilder::default()
                .strategy(TokenValidator::default(), 1.0)
                .min_confidence_threshold(1.5)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_combination_rules() {
        let expected = names(&["Sariel", "Cassian"]);

        let unanimous = hybrid(CombinationStrategy::Unanimous).validate_combined("", &expected, None);
        assert_eq!(unanimous.found_entities(), &names(&["Sariel"]));

        let majority = hybrid(CombinationStrategy::Majority).validate_combined("", &expected, None);
        assert_eq!(majority.found_entities(), &names(&["Sariel"]));

        let confident =
            hybrid(CombinationStrategy::ConfidenceBased).validate_combined("", &expected, None);
        assert!(confident.passed());

        let weighted = hybrid(CombinationStrategy::WeightedVote).validate_combined("", &expected, None);
        assert_eq!(weighted.missing_entities(), &names(&["Cassian"]));
    }

    #[test]
    fn test_same_acceptance_same_result() {
        let expected = names(&["Sariel", "Cassian"]);
        let a = hybrid(CombinationStrategy::Unanimous).validate_combined("", &expected, None);
        let b = hybrid(CombinationStrategy::Majority).validate_combined("", &expected, None);
        assert_eq!(a, b);
        assert_eq!(a.confidence_score(), 0.5);
    }

    #[test]
    fn test_failing_strategy_does_not_abort() {
        let hybrid = HybridValidatorBuilder::default()
            .strategy(Fixed::new(&["Sariel"], 1.0), 1.0)
            .strategy(Fixed::new(&["Sariel"], 1.0), 1.0)
            .strategy(Failing, 1.0)
            .build()
            .unwrap();
        let result = hybrid.validate_combined("", &names(&["Sariel"]), None);

        assert!(result.passed());
        assert!(result.diagnostics()[0].starts_with("[failing]"));
    }

    #[test]
    fn test_standard_from_config() {
        let hybrid = HybridValidator::standard(&StoryguardConfig::default()).unwrap();
        assert_eq!(hybrid.strategies().len(), 2);
        let result = hybrid.validate_combined(
            "Sariel draws her sword while Cassian watches.",
            &names(&["Sariel", "Cassian"]),
            None,
        );
        assert!(result.passed());
    }
}
