//! Core data types for storyguard.
//!
//! This crate holds the records every pipeline stage exchanges, the
//! [`NarrativeDriver`] trait standing in for an LLM round-trip, and the layered
//! [`StoryguardConfig`].
//!
//! All records are built fresh for a single turn and never mutated after
//! construction. Nothing here holds per-call state, so components built from
//! these types can be owned by the caller and reused freely.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod combination;
mod config;
mod driver;
mod generation;
mod validation_result;

pub use combination::CombinationStrategy;
pub use config::{
    DualPassConfig, EntityHint, HybridConfig, RetryConfig, StoryguardConfig, StrategyWeights,
    ValidationConfig,
};
pub use driver::NarrativeDriver;
pub use generation::{DualPassResult, GenerationPass, PassNumber};
pub use validation_result::ValidationResult;
