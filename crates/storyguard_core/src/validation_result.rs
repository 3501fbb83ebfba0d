//! The verdict produced by every presence-validation strategy.

use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of checking one narrative against an expected entity set.
///
/// `passed` and `retry_needed` are derived from the missing set and the
/// confidence score at construction time and cannot be set independently:
/// a result passes exactly when nothing is missing and the confidence meets
/// the threshold it was built with.
///
/// # Examples
///
/// ```
/// use storyguard_core::ValidationResult;
///
/// let result = ValidationResult::new(
///     vec!["Sariel".to_string()],
///     vec!["Cassian".to_string()],
///     0.5,
///     0.7,
/// );
/// assert!(!result.passed());
/// assert!(result.retry_needed());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct ValidationResult {
    /// Whether every entity was found with sufficient confidence.
    #[getter(skip)]
    passed: bool,
    /// Entities detected in the narrative (unique).
    found_entities: Vec<String>,
    /// Expected entities not detected, in expected-set order.
    missing_entities: Vec<String>,
    /// Overall confidence in `[0, 1]`.
    #[getter(skip)]
    confidence_score: f64,
    /// Whether a regeneration pass is warranted.
    #[getter(skip)]
    retry_needed: bool,
    /// Human-readable hints for the regeneration prompt.
    retry_suggestions: Vec<String>,
    /// Per-entity score as reported by the producing strategy.
    entity_scores: BTreeMap<String, f64>,
    /// Notes about recovered failures while producing this result.
    diagnostics: Vec<String>,
}

impl ValidationResult {
    /// Build a result from the found/missing split and an overall confidence.
    ///
    /// Duplicate names in `found_entities` are dropped (first occurrence wins)
    /// and the confidence is clamped to `[0, 1]`.
    pub fn new(
        found_entities: Vec<String>,
        missing_entities: Vec<String>,
        confidence_score: f64,
        min_confidence_threshold: f64,
    ) -> Self {
        let mut unique = Vec::with_capacity(found_entities.len());
        for name in found_entities {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        let confidence_score = if confidence_score.is_nan() {
            0.0
        } else {
            confidence_score.clamp(0.0, 1.0)
        };
        let retry_needed =
            !missing_entities.is_empty() || confidence_score < min_confidence_threshold;

        Self {
            passed: !retry_needed,
            found_entities: unique,
            missing_entities,
            confidence_score,
            retry_needed,
            retry_suggestions: Vec::new(),
            entity_scores: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// A failing result for a strategy that could not score the narrative.
    ///
    /// Every expected entity is reported missing and the error text is kept
    /// in [`diagnostics`](Self::diagnostics).
    pub fn failure(expected_entities: &[String], message: impl Into<String>) -> Self {
        let mut result = Self::new(Vec::new(), expected_entities.to_vec(), 0.0, 1.0);
        // An empty expected set would otherwise "pass" with nothing missing.
        result.passed = false;
        result.retry_needed = true;
        result.diagnostics.push(message.into());
        result
    }

    /// Attach retry suggestions.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.retry_suggestions = suggestions;
        self
    }

    /// Attach per-entity scores.
    pub fn with_entity_scores(mut self, scores: BTreeMap<String, f64>) -> Self {
        self.entity_scores = scores;
        self
    }

    /// Attach a diagnostic note.
    pub fn with_diagnostic(mut self, note: impl Into<String>) -> Self {
        self.diagnostics.push(note.into());
        self
    }

    /// Whether every entity was found with sufficient confidence.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Overall confidence in `[0, 1]`.
    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Whether a regeneration pass is warranted.
    pub fn retry_needed(&self) -> bool {
        self.retry_needed
    }

    /// Whether `name` was reported as found.
    pub fn is_found(&self, name: &str) -> bool {
        self.found_entities.iter().any(|found| found == name)
    }

    /// Score recorded for `name`, or 0.0 if the strategy did not report one.
    pub fn score_for(&self, name: &str) -> f64 {
        self.entity_scores.get(name).copied().unwrap_or(0.0)
    }
}
