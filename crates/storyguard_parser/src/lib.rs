//! Structured-response parsing for storyguard.
//!
//! Model replies are supposed to be a JSON object carrying the narrative and a
//! handful of side-channel fields. In practice they arrive as clean JSON, JSON
//! inside a markdown fence, JSON buried in prose, JSON cut off mid-string, or
//! plain text. [`parse_structured_response`] walks an ordered list of parse
//! attempts and always produces display text plus a normalized
//! [`StructuredResponse`]; it never fails.
//!
//! # Example
//!
//! ```
//! use storyguard_parser::parse_structured_response;
//!
//! let raw = r#"```json
//! {"narrative": "The gate creaks open.", "entities_mentioned": ["Sariel"]}
//! ```"#;
//! let (text, response) = parse_structured_response(raw);
//! assert_eq!(text, "The gate creaks open.");
//! assert_eq!(response.entities_mentioned(), &vec!["Sariel".to_string()]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod parse;
mod response;
mod salvage;
mod sanitize;

pub use extraction::{extract_balanced, extract_from_code_block};
pub use parse::{ParseTier, compose_display_text, parse_structured_response, parse_with_tier};
pub use response::StructuredResponse;
pub use salvage::{contains_json_keys, extract_string_field, strip_json_artifacts, unescape_json_string};
pub use sanitize::{sanitize_choices, strip_script_tags};
