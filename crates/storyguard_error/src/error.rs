//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, JsonError, ValidationError};

/// Every error condition storyguard can surface.
///
/// # Examples
///
/// ```
/// use storyguard_error::{JsonError, StoryguardError};
///
/// let err: StoryguardError = JsonError::new("bad payload").into();
/// assert!(format!("{}", err).contains("JSON Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StoryguardErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Validation strategy error
    #[from(ValidationError)]
    Validation(ValidationError),
}

/// Storyguard error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storyguard_error::{ConfigError, StoryguardResult};
///
/// fn might_fail() -> StoryguardResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storyguard Error: {}", _0)]
pub struct StoryguardError(Box<StoryguardErrorKind>);

impl StoryguardError {
    /// Create a new error from a kind.
    pub fn new(kind: StoryguardErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoryguardErrorKind {
        &self.0
    }
}

impl<T> From<T> for StoryguardError
where
    T: Into<StoryguardErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for storyguard operations.
pub type StoryguardResult<T> = std::result::Result<T, StoryguardError>;
