//! Error types for storyguard.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! Most of the pipeline never surfaces these to the player. Strategy errors are
//! folded into failing validation results, malformed model output is salvaged,
//! and unparseable timestamps degrade to "no time change". Errors exist for the
//! seams where a caller genuinely has to decide: configuration loading, builder
//! validation, and strategy failures that a combiner reports as diagnostics.
//!
//! # Examples
//!
//! ```
//! use storyguard_error::{ConfigError, StoryguardResult};
//!
//! fn load() -> StoryguardResult<String> {
//!     Err(ConfigError::new("missing [validation] section"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod json;
mod validation;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{StoryguardError, StoryguardErrorKind, StoryguardResult};
pub use json::JsonError;
pub use validation::{ValidationError, ValidationErrorKind};
