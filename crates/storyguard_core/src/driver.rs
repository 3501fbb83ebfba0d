//! Generation callback contract.

/// A blocking text generator, usually an LLM round-trip.
///
/// Failures are not modelled: a driver that cannot reach its model returns
/// empty or garbage text, which simply fails validation again. Timeouts and
/// cancellation belong to whoever implements the driver.
///
/// Any `Fn(&str) -> String` is a driver:
///
/// ```
/// use storyguard_core::NarrativeDriver;
///
/// let echo = |prompt: &str| format!("You asked: {prompt}");
/// assert_eq!(echo.generate("hi"), "You asked: hi");
/// ```
pub trait NarrativeDriver {
    /// Produce a response for the given prompt.
    fn generate(&self, prompt: &str) -> String;
}

impl<F> NarrativeDriver for F
where
    F: Fn(&str) -> String,
{
    fn generate(&self, prompt: &str) -> String {
        self(prompt)
    }
}
