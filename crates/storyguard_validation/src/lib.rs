//! Entity presence validation for generated narrative.
//!
//! Checks that every character a scene manifest expects is acknowledged in
//! the model's narrative, and repairs the narrative when one is not:
//!
//! - [`EntityValidator`] scores each entity from textual signals and builds
//!   retry prompts.
//! - [`TokenValidator`], [`FuzzyValidator`] and [`LlmJudgeValidator`] are
//!   interchangeable [`PresenceValidator`] strategies; [`HybridValidator`]
//!   combines them under a [`CombinationStrategy`](storyguard_core::CombinationStrategy).
//! - [`EntityRetryManager`] regenerates through a
//!   [`NarrativeDriver`](storyguard_core::NarrativeDriver) until validation
//!   passes or the retry budget runs out.
//! - [`DualPassGenerator`] runs one corrective pass and merges it.
//! - [`AdaptiveEntityInjector`] appends a sentence per missing entity when
//!   regeneration is not an option.
//!
//! # Example
//!
//! ```
//! use storyguard_validation::EntityValidator;
//!
//! let validator = EntityValidator::default();
//! let expected = vec!["Sariel".to_string(), "Cassian".to_string()];
//! let result = validator.validate_entity_presence(
//!     "Sariel draws her sword while Cassian watches.",
//!     &expected,
//!     None,
//! );
//! assert!(result.passed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dual_pass;
mod entity;
mod fuzzy;
mod hybrid;
mod injector;
mod llm_judge;
mod retry;
pub mod signals;
mod strategy;
mod token;

pub use dual_pass::DualPassGenerator;
pub use entity::{
    ACTION_ATTRIBUTION_BONUS, DIRECT_MENTION_SCORE, EntityValidator, PARTIAL_MATCH_WEIGHT,
};
pub use fuzzy::{FuzzyValidator, INFERRED_ACTION_SCORE, PRONOUN_SCORE, TRUNCATED_SCORE};
pub use hybrid::{HybridValidator, HybridValidatorBuilder, WeightedStrategy};
pub use injector::{AdaptiveEntityInjector, Injection, InjectionOutcome, InjectionStyle};
pub use llm_judge::{DEFAULT_JUDGE_CONFIDENCE, LlmJudgeValidator};
pub use retry::{EntityRetryManager, RetryOutcome};
pub use strategy::{PresenceValidator, validate_or_fail};
pub use token::TokenValidator;
