//! Configuration loading errors.

/// A configuration source could not be read, merged or deserialized.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What went wrong, including the offending source when known
    pub message: String,
    /// Line of the call that raised the error
    pub line: u32,
    /// Source file of the call that raised the error
    pub file: &'static str,
}

impl ConfigError {
    /// Record a configuration failure at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyguard_error::ConfigError;
    ///
    /// let err = ConfigError::new("found_threshold must be a number");
    /// assert!(err.to_string().starts_with("Configuration Error: found_threshold"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: caller.line(),
            file: caller.file(),
        }
    }
}
