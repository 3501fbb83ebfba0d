//! Validation strategy error types.

/// Specific failure conditions raised by presence-validation strategies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// A strategy failed while scoring
    #[display("Strategy '{}' failed: {}", strategy, message)]
    StrategyFailed {
        /// Strategy name
        strategy: String,
        /// Failure description
        message: String,
    },
    /// The judge model returned nothing
    #[display("Judge returned an empty response")]
    EmptyJudgeResponse,
    /// The judge model reply did not cover the requested entities
    #[display("Judge response could not be interpreted for: {}", _0)]
    UnparseableJudgeResponse(String),
    /// A combiner was asked to combine zero strategies
    #[display("No validation strategies configured")]
    NoStrategies,
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use storyguard_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::EmptyJudgeResponse);
/// assert!(format!("{}", err).contains("empty response"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The specific error condition
    pub kind: ValidationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }
}
