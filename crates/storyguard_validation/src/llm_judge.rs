//! Presence judged by a language model.

use crate::{PresenceValidator, entity::generic_suggestion};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use storyguard_core::{NarrativeDriver, ValidationConfig, ValidationResult};
use storyguard_error::{StoryguardResult, ValidationError, ValidationErrorKind};
use tracing::{debug, instrument};

/// Score assigned to a YES verdict that carries no explicit confidence.
pub const DEFAULT_JUDGE_CONFIDENCE: f64 = 0.9;

static VERDICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s\-*•]*(?:\d+[.)]\s*)?[*]*(?P<name>[^:\n]+?)\s*[*]*\s*:\s*[*]*\s*(?P<verdict>yes|no|present|absent|true|false)\b[^\n0-9]*(?P<confidence>[01](?:\.\d+)?)?",
    )
    .expect("valid regex")
});

/// Asks a model, through a [`NarrativeDriver`], which characters appear.
///
/// The model answers one `Name: YES` / `Name: NO` line per character,
/// optionally followed by a confidence in `[0, 1]`. A JSON object mapping
/// names to booleans is accepted too. An empty reply, or one that leaves an
/// expected entity unanswered, is an error.
pub struct LlmJudgeValidator<D> {
    driver: D,
    min_confidence_threshold: f64,
}

impl<D: NarrativeDriver> LlmJudgeValidator<D> {
    /// Create a judge over `driver` with the default thresholds.
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, &ValidationConfig::default())
    }

    /// Create a judge over `driver` with the configured confidence threshold.
    pub fn with_config(driver: D, config: &ValidationConfig) -> Self {
        Self {
            driver,
            min_confidence_threshold: config.min_confidence_threshold,
        }
    }

    /// The question sent to the model.
    pub fn build_prompt(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> String {
        let mut prompt = String::from(
            "You are checking a story passage for the presence of characters.\n\
             A character is present if they speak, act, react, or are directly described.\n\
             Answer with one line per character in the form \"Name: YES\" or \"Name: NO\", \
             optionally followed by a confidence between 0 and 1.\n\nCharacters:\n",
        );
        for name in expected_entities {
            prompt.push_str(&format!("- {name}\n"));
        }
        if let Some(location) = location {
            prompt.push_str(&format!("\nLocation: {location}\n"));
        }
        prompt.push_str(&format!("\nPassage:\n\"\"\"\n{narrative}\n\"\"\"\n"));
        prompt
    }
}

fn normalize(name: &str) -> String {
    name.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn verdict_from_json(reply: &str) -> Option<BTreeMap<String, (bool, Option<f64>)>> {
    let value: serde_json::Value = serde_json::from_str(reply.trim()).ok()?;
    let object = value.as_object()?;
    let verdicts = object
        .iter()
        .filter_map(|(name, verdict)| {
            let present = match verdict {
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::String(s) => parse_verdict_word(s)?,
                _ => return None,
            };
            Some((normalize(name), (present, None)))
        })
        .collect();
    Some(verdicts)
}

fn parse_verdict_word(word: &str) -> Option<bool> {
    match word.trim().to_lowercase().as_str() {
        "yes" | "present" | "true" => Some(true),
        "no" | "absent" | "false" => Some(false),
        _ => None,
    }
}

/// Parse a judge reply into per-name verdicts keyed by normalized name.
fn parse_verdicts(reply: &str) -> BTreeMap<String, (bool, Option<f64>)> {
    if let Some(verdicts) = verdict_from_json(reply) {
        return verdicts;
    }

    VERDICT_RE
        .captures_iter(reply)
        .filter_map(|caps| {
            let present = parse_verdict_word(&caps["verdict"])?;
            let confidence = caps
                .name("confidence")
                .and_then(|m| m.as_str().parse::<f64>().ok());
            Some((normalize(&caps["name"]), (present, confidence)))
        })
        .collect()
}

impl<D: NarrativeDriver> PresenceValidator for LlmJudgeValidator<D> {
    fn name(&self) -> &str {
        "llm"
    }

    #[instrument(skip(self, narrative, expected_entities, location), fields(expected = expected_entities.len()))]
    fn validate(
        &self,
        narrative: &str,
        expected_entities: &[String],
        location: Option<&str>,
    ) -> StoryguardResult<ValidationResult> {
        if expected_entities.is_empty() {
            return Ok(ValidationResult::new(
                Vec::new(),
                Vec::new(),
                1.0,
                self.min_confidence_threshold,
            ));
        }

        let reply = self
            .driver
            .generate(&self.build_prompt(narrative, expected_entities, location));
        if reply.trim().is_empty() {
            Err(ValidationError::new(ValidationErrorKind::EmptyJudgeResponse))?
        }

        let verdicts = parse_verdicts(&reply);
        debug!(answered = verdicts.len(), "Parsed judge verdicts");

        let unanswered: Vec<&str> = expected_entities
            .iter()
            .filter(|name| !verdicts.contains_key(&normalize(name)))
            .map(String::as_str)
            .collect();
        if !unanswered.is_empty() {
            Err(ValidationError::new(
                ValidationErrorKind::UnparseableJudgeResponse(unanswered.join(", ")),
            ))?
        }

        let mut found = Vec::new();
        let mut missing = Vec::new();
        let mut scores = BTreeMap::new();
        for name in expected_entities {
            let (present, confidence) = verdicts[&normalize(name)];
            let score = if present {
                confidence.unwrap_or(DEFAULT_JUDGE_CONFIDENCE).clamp(0.0, 1.0)
            } else {
                0.0
            };
            if present {
                found.push(name.clone());
            } else if !missing.contains(name) {
                missing.push(name.clone());
            }
            scores.insert(name.clone(), score);
        }
        let confidence = expected_entities
            .iter()
            .map(|name| scores[name])
            .sum::<f64>()
            / expected_entities.len() as f64;
        let suggestions = missing.iter().map(|name| generic_suggestion(name)).collect();

        Ok(
            ValidationResult::new(found, missing, confidence, self.min_confidence_threshold)
                .with_entity_scores(scores)
                .with_suggestions(suggestions),
        )
    }
}
