//! Records describing generation attempts and their combined outcome.

use crate::ValidationResult;
use serde::Serialize;

/// Which attempt of a dual-pass generation a record describes.
///
/// Serializes as the integer `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(into = "u8")]
pub enum PassNumber {
    /// The initial generation.
    #[display("1")]
    First,
    /// The single corrective pass.
    #[display("2")]
    Second,
}

impl From<PassNumber> for u8 {
    fn from(pass: PassNumber) -> Self {
        match pass {
            PassNumber::First => 1,
            PassNumber::Second => 2,
        }
    }
}

/// One generation attempt: the prompt sent, the text received and its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct GenerationPass {
    /// Attempt number.
    pass_number: PassNumber,
    /// Prompt handed to the driver.
    prompt: String,
    /// Raw driver output.
    response: String,
    /// Entities the validator found in `response`.
    entities_found: Vec<String>,
    /// Verdict for `response`, if it was validated on its own.
    validation_result: Option<ValidationResult>,
}

impl GenerationPass {
    /// Record an attempt that has not been validated yet.
    pub fn new(pass_number: PassNumber, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            pass_number,
            prompt: prompt.into(),
            response: response.into(),
            entities_found: Vec::new(),
            validation_result: None,
        }
    }

    /// Attach the verdict for this attempt.
    pub fn with_validation(mut self, result: ValidationResult) -> Self {
        self.entities_found = result.found_entities().clone();
        self.validation_result = Some(result);
        self
    }
}

/// Combined outcome of a dual-pass generation.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct DualPassResult {
    /// The initial attempt.
    first_pass: GenerationPass,
    /// The corrective attempt, present only when the first one failed.
    second_pass: Option<GenerationPass>,
    /// Narrative delivered to the caller.
    final_narrative: String,
    /// Entities found in `final_narrative`.
    total_entities_found: Vec<String>,
    /// Whether the final narrative passed validation.
    #[getter(skip)]
    success: bool,
    /// Whether the second pass found strictly more entities than the first.
    #[getter(skip)]
    improvement_achieved: bool,
}

impl DualPassResult {
    /// Outcome when the first attempt already passed.
    pub fn single(first_pass: GenerationPass) -> Self {
        let success = first_pass
            .validation_result()
            .as_ref()
            .is_some_and(ValidationResult::passed);
        Self {
            final_narrative: first_pass.response().clone(),
            total_entities_found: first_pass.entities_found().clone(),
            first_pass,
            second_pass: None,
            success,
            improvement_achieved: false,
        }
    }

    /// Outcome after a corrective pass, given the verdict on the merged text.
    pub fn merged(
        first_pass: GenerationPass,
        second_pass: GenerationPass,
        final_narrative: String,
        final_validation: &ValidationResult,
    ) -> Self {
        let total_entities_found = final_validation.found_entities().clone();
        let improvement_achieved = total_entities_found.len() > first_pass.entities_found().len();
        Self {
            first_pass,
            second_pass: Some(second_pass),
            final_narrative,
            total_entities_found,
            success: final_validation.passed(),
            improvement_achieved,
        }
    }

    /// Whether the final narrative passed validation.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Whether the second pass found strictly more entities than the first.
    pub fn improvement_achieved(&self) -> bool {
        self.improvement_achieved
    }
}
