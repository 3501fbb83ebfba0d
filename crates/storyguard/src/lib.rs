//! Storyguard - guardrails for LLM-generated story turns.
//!
//! A game master model returns a reply per player turn. Storyguard turns that
//! reply into something safe to show and persist:
//!
//! - **Response parsing**: JSON, fenced JSON, JSON in prose, truncated JSON or
//!   plain text all become display text plus a normalized record.
//! - **Entity presence**: check that every character the scene expects is
//!   acknowledged, with token, fuzzy, model-judged and hybrid strategies.
//! - **Repair**: bounded regeneration, a corrective second pass, or an
//!   appended sentence introducing whoever is missing.
//! - **Story clock**: world time never stalls or runs backwards.
//!
//! # Quick Start
//!
//! ```
//! use storyguard::{EntityValidator, parse_structured_response};
//!
//! let raw = r#"{"narrative": "Sariel draws her sword while Cassian watches."}"#;
//! let (text, _) = parse_structured_response(raw);
//!
//! let expected = vec!["Sariel".to_string(), "Cassian".to_string()];
//! let result = EntityValidator::default().validate_entity_presence(&text, &expected, None);
//! assert!(result.passed());
//! ```
//!
//! # Architecture
//!
//! - `storyguard_error` - Error types
//! - `storyguard_core` - Shared records, driver trait and configuration
//! - `storyguard_parser` - Response parsing
//! - `storyguard_validation` - Presence strategies, retry and repair
//! - `storyguard_time` - Story clock guard
//!
//! This crate (`storyguard`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
mod observability;

pub use observability::{ObservabilityConfig, init_observability, init_observability_with_config};

// Error types
pub use storyguard_error::{
    BuilderError, BuilderErrorKind, ConfigError, JsonError, StoryguardError, StoryguardErrorKind,
    StoryguardResult, ValidationError, ValidationErrorKind,
};

// Core records and configuration
pub use storyguard_core::{
    CombinationStrategy, DualPassConfig, DualPassResult, EntityHint, GenerationPass, HybridConfig,
    NarrativeDriver, PassNumber, RetryConfig, StoryguardConfig, StrategyWeights, ValidationConfig,
    ValidationResult,
};

// Parsing
pub use storyguard_parser::{
    ParseTier, StructuredResponse, compose_display_text, parse_structured_response,
    parse_with_tier,
};

// Validation and repair
pub use storyguard_validation::{
    AdaptiveEntityInjector, DualPassGenerator, EntityRetryManager, EntityValidator,
    FuzzyValidator, HybridValidator, HybridValidatorBuilder, Injection, InjectionOutcome,
    InjectionStyle, LlmJudgeValidator, PresenceValidator, RetryOutcome, TokenValidator,
    WeightedStrategy, validate_or_fail,
};

// Story clock
pub use storyguard_time::{
    WorldTime, check_temporal_violation, ensure_progressive_world_time, parse_timestamp,
};
