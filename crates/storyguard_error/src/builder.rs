//! Errors raised while assembling validators from parts.

/// Why a validator could not be assembled.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A generated builder reported a missing or invalid field
    #[display("Incomplete builder: {}", _0)]
    Incomplete(String),

    /// A strategy weight is negative or not finite
    #[display("Strategy '{}' has unusable weight {}", strategy, weight)]
    InvalidWeight {
        /// Strategy name
        strategy: String,
        /// The rejected weight
        weight: f64,
    },

    /// A threshold lies outside `[0, 1]`
    #[display("Threshold '{}' must lie in [0, 1], got {}", name, value)]
    ThresholdOutOfRange {
        /// Threshold name
        name: String,
        /// The rejected value
        value: f64,
    },
}

/// Builder error with location tracking.
///
/// # Examples
///
/// ```
/// use storyguard_error::{BuilderError, BuilderErrorKind};
///
/// let err = BuilderError::new(BuilderErrorKind::InvalidWeight {
///     strategy: "token".into(),
///     weight: -1.0,
/// });
/// assert!(err.to_string().contains("unusable weight -1"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create a builder error at the caller's location.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}

/// Wrap the message of a derive_builder error.
impl From<String> for BuilderError {
    #[track_caller]
    fn from(msg: String) -> Self {
        Self::new(BuilderErrorKind::Incomplete(msg))
    }
}
