//! Command handlers behind the `storyguard` binary.
//!
//! Each handler takes already-read input and returns the text to print, so
//! the binary stays a thin argument-parsing shell.

use serde_json::{Map, Value, json};
use storyguard_core::{StoryguardConfig, ValidationResult};
use storyguard_error::{JsonError, StoryguardResult};
use storyguard_parser::parse_structured_response;
use storyguard_time::{WorldTime, ensure_progressive_world_time};
use storyguard_validation::{
    AdaptiveEntityInjector, EntityValidator, FuzzyValidator, HybridValidator, PresenceValidator,
    TokenValidator,
};
use tracing::{instrument, warn};

/// Presence strategy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StrategyChoice {
    /// Whole-word token matching
    Token,
    /// Token matching plus pronouns, truncations and inferred actions
    Fuzzy,
    /// Weighted signal scoring with retry suggestions
    #[default]
    Entity,
    /// Token and fuzzy combined as configured
    Hybrid,
}

fn to_pretty_json(value: &impl serde::Serialize) -> StoryguardResult<String> {
    Ok(serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to serialize output: {}", e)))?)
}

/// Parse a raw model reply and report the display text and decoded fields.
///
/// # Errors
///
/// Returns an error only if the report cannot be serialized.
pub fn parse_command(raw: &str) -> StoryguardResult<String> {
    let (display_text, response) = parse_structured_response(raw);
    to_pretty_json(&json!({
        "display_text": display_text,
        "response": response,
    }))
}

/// Validate the narrative in a raw model reply with the chosen strategy.
///
/// # Errors
///
/// Returns an error if the hybrid validator cannot be built or the result
/// cannot be serialized.
#[instrument(skip(raw, config))]
pub fn validate_command(
    raw: &str,
    entities: &[String],
    location: Option<&str>,
    strategy: StrategyChoice,
    config: &StoryguardConfig,
) -> StoryguardResult<String> {
    let result = validate_narrative(raw, entities, location, strategy, config)?;
    to_pretty_json(&result)
}

fn validate_narrative(
    raw: &str,
    entities: &[String],
    location: Option<&str>,
    strategy: StrategyChoice,
    config: &StoryguardConfig,
) -> StoryguardResult<ValidationResult> {
    let (narrative, _) = parse_structured_response(raw);
    let validator: Box<dyn PresenceValidator> = match strategy {
        StrategyChoice::Token => Box::new(TokenValidator::new(&config.validation)),
        StrategyChoice::Fuzzy => Box::new(FuzzyValidator::new(config.validation.clone())),
        StrategyChoice::Entity => Box::new(EntityValidator::from_config(config)),
        StrategyChoice::Hybrid => Box::new(HybridValidator::standard(config)?),
    };
    validator.validate(&narrative, entities, location)
}

/// Append a sentence for every entity the narrative is missing.
///
/// # Errors
///
/// Never fails today; the signature matches the other handlers.
pub fn inject_command(
    raw: &str,
    entities: &[String],
    location: Option<&str>,
    config: &StoryguardConfig,
) -> StoryguardResult<String> {
    let (narrative, _) = parse_structured_response(raw);
    let result = EntityValidator::from_config(config).validate_entity_presence(&narrative, entities, location);
    let outcome = AdaptiveEntityInjector.inject_missing(&narrative, &result, location);
    Ok(outcome.narrative().clone())
}

fn parse_json(label: &str, text: &str) -> StoryguardResult<Value> {
    Ok(serde_json::from_str(text)
        .map_err(|e| JsonError::new(format!("Invalid {} JSON: {}", label, e)))?)
}

/// Run the world-time guard over a state payload.
///
/// `previous` may be a clock object or an ISO string; an unreadable value is
/// treated as no previous tick.
///
/// # Errors
///
/// Returns an error if `state` is not a JSON object or `previous` is not JSON.
pub fn advance_time_command(
    state: &str,
    previous: Option<&str>,
    user_input: &str,
    is_god_mode: bool,
) -> StoryguardResult<String> {
    let state: Map<String, Value> = match parse_json("state", state)? {
        Value::Object(map) => map,
        other => Err(JsonError::new(format!(
            "State must be a JSON object, got: {}",
            other
        )))?,
    };

    let previous = match previous {
        Some(text) => {
            let parsed = WorldTime::from_value(&parse_json("previous", text)?);
            if parsed.is_none() {
                warn!(previous = text, "Previous world time unreadable; treating as absent");
            }
            parsed
        }
        None => None,
    };

    let guarded = ensure_progressive_world_time(state, previous.as_ref(), user_input, is_god_mode);
    to_pretty_json(&guarded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command_reports_display_text() {
        let out = parse_command(r#"{"narrative": "Rain.", "dice_rolls": "d20"}"#).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["display_text"], "Rain.");
        assert_eq!(value["response"]["dice_rolls"], json!([]));
    }

    #[test]
    fn test_validate_each_strategy() {
        let config = StoryguardConfig::default();
        for strategy in [
            StrategyChoice::Token,
            StrategyChoice::Fuzzy,
            StrategyChoice::Entity,
            StrategyChoice::Hybrid,
        ] {
            let result = validate_narrative(
                r#"{"narrative": "Sariel draws her sword while Cassian watches."}"#,
                &names(&["Sariel", "Cassian"]),
                None,
                strategy,
                &config,
            )
            .unwrap();
            assert!(result.passed(), "{strategy:?}");
        }
    }

    #[test]
    fn test_inject_command_appends() {
        let out = inject_command(
            "The hall is silent.",
            &names(&["Cassian"]),
            None,
            &StoryguardConfig::default(),
        )
        .unwrap();
        assert!(out.starts_with("The hall is silent. Cassian"));
    }

    #[test]
    fn test_advance_time_rejects_non_object() {
        assert!(advance_time_command("[1, 2]", None, "", false).is_err());
        assert!(advance_time_command("{", None, "", false).is_err());
    }

    #[test]
    fn test_advance_time_synthesizes() {
        let out = advance_time_command(
            "{}",
            Some(r#"{"year": 1492, "month": 3, "day": 15}"#),
            "I wait",
            false,
        )
        .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["world_time"]["second"], json!(1));
    }
}
