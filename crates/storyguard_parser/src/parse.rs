//! The tiered parse pipeline.

use crate::extraction::{extract_balanced, extract_from_code_block};
use crate::salvage::{
    contains_json_keys, extract_string_field, extract_string_list, strip_json_artifacts,
};
use crate::sanitize::sanitize_choices;
use crate::StructuredResponse;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Which step of the pipeline produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ParseTier {
    /// The whole reply was a JSON object.
    Direct,
    /// A JSON object inside a markdown code fence.
    Fenced,
    /// A JSON object embedded in surrounding prose.
    Embedded,
    /// Individual fields recovered from malformed JSON.
    FieldSalvage,
    /// JSON punctuation stripped from an unrecoverable reply.
    ArtifactCleanup,
    /// No JSON at all; the reply is the narrative.
    PlainText,
}

type ParseAttempt = fn(&str) -> Option<Map<String, Value>>;

const JSON_ATTEMPTS: [(ParseTier, ParseAttempt); 3] = [
    (ParseTier::Direct, parse_direct),
    (ParseTier::Fenced, parse_fenced),
    (ParseTier::Embedded, parse_embedded),
];

const RESPONSE_KEYS: [&str; 10] = [
    "narrative",
    "god_mode_response",
    "entities_mentioned",
    "location_confirmed",
    "state_updates",
    "session_header",
    "planning_block",
    "dice_rolls",
    "resources",
    "debug_info",
];

// Objects without any reply key are someone else's JSON; later tiers handle them
fn reply_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(object))
            if RESPONSE_KEYS.iter().any(|key| object.contains_key(*key)) =>
        {
            Some(object)
        }
        _ => None,
    }
}

fn parse_direct(text: &str) -> Option<Map<String, Value>> {
    reply_object(text)
}

fn parse_fenced(text: &str) -> Option<Map<String, Value>> {
    extract_from_code_block(text).and_then(reply_object)
}

fn parse_embedded(text: &str) -> Option<Map<String, Value>> {
    extract_balanced(text, '{', '}').and_then(reply_object)
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.contains("```") || contains_json_keys(text)
}

/// Parse a raw model reply into display text and structured fields.
///
/// Attempts, in order: the reply as JSON; a fenced code block; a JSON object
/// embedded in prose. Each must carry at least one reply key. Then come
/// per-field salvage of malformed JSON and a last-resort strip of JSON
/// punctuation. A reply with nothing JSON-like is
/// returned verbatim as the narrative.
///
/// The display text follows god-mode precedence (see
/// [`compose_display_text`]) and never contains the response's JSON keys.
///
/// # Examples
///
/// ```
/// use storyguard_parser::parse_structured_response;
///
/// let raw = r#"{"narrative":"","god_mode_response":"A thick fog descends.","entities_mentioned":["fog"]}"#;
/// let (text, _) = parse_structured_response(raw);
/// assert_eq!(text, "A thick fog descends.");
/// ```
pub fn parse_structured_response(raw: &str) -> (String, StructuredResponse) {
    let (text, response, _) = parse_with_tier(raw);
    (text, response)
}

/// Like [`parse_structured_response`], also reporting which tier succeeded.
#[instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn parse_with_tier(raw: &str) -> (String, StructuredResponse, ParseTier) {
    let (mut response, tier) = decode(raw);

    let narrative = scrub_json_keys(response.narrative().clone());
    response.set_narrative(narrative);
    let god_mode = response.god_mode_response().clone().map(scrub_json_keys);
    response.set_god_mode_response(god_mode);
    sanitize_choices(response.planning_block_mut());

    let text = compose_display_text(response.god_mode_text(), response.narrative());
    debug!(tier = %tier, text_len = text.len(), "Parsed model response");
    (text, response, tier)
}

/// Combine god-mode text and narrative into the text shown to the player.
///
/// Non-blank god-mode text takes precedence. When the narrative is also
/// non-blank it follows after a blank line; otherwise god-mode text stands
/// alone.
///
/// # Examples
///
/// ```
/// use storyguard_parser::compose_display_text;
///
/// assert_eq!(compose_display_text(Some("Fog."), "Sariel waits."), "Fog.\n\nSariel waits.");
/// assert_eq!(compose_display_text(Some("Fog."), "  "), "Fog.");
/// assert_eq!(compose_display_text(None, "Sariel waits."), "Sariel waits.");
/// ```
pub fn compose_display_text(god_mode_response: Option<&str>, narrative: &str) -> String {
    match god_mode_response.filter(|text| !text.trim().is_empty()) {
        Some(god_mode) if !narrative.trim().is_empty() => format!("{god_mode}\n\n{narrative}"),
        Some(god_mode) => god_mode.to_string(),
        None => narrative.to_string(),
    }
}

fn decode(raw: &str) -> (StructuredResponse, ParseTier) {
    for (tier, attempt) in JSON_ATTEMPTS {
        if let Some(object) = attempt(raw) {
            return (StructuredResponse::from_object(&object), tier);
        }
    }

    if !looks_like_json(raw) {
        return (StructuredResponse::from_narrative(raw), ParseTier::PlainText);
    }

    warn!("Model reply is not valid JSON, salvaging fields");
    salvage_fields(raw)
}

fn salvage_fields(raw: &str) -> (StructuredResponse, ParseTier) {
    let narrative = extract_string_field(raw, "narrative");
    let god_mode = extract_string_field(raw, "god_mode_response");

    if narrative.is_none() && god_mode.is_none() {
        warn!("No narrative field recoverable, stripping JSON artifacts");
        return (
            StructuredResponse::from_narrative(strip_json_artifacts(raw)),
            ParseTier::ArtifactCleanup,
        );
    }

    let mut response = StructuredResponse::from_narrative(narrative.unwrap_or_default());
    response.set_god_mode_response(god_mode);
    response.set_entities_mentioned(extract_string_list(raw, "entities_mentioned"));
    if let Some(location) = extract_string_field(raw, "location_confirmed") {
        response.set_location_confirmed(location);
    }
    (response, ParseTier::FieldSalvage)
}

/// Ensure decoded text carries no JSON keys, unwrapping double-encoded replies.
fn scrub_json_keys(text: String) -> String {
    if !contains_json_keys(&text) {
        return text;
    }
    warn!("Decoded narrative still carries JSON keys");

    let nested = JSON_ATTEMPTS
        .iter()
        .find_map(|(_, attempt)| attempt(&text))
        .and_then(|object| object.get("narrative").and_then(Value::as_str).map(str::to_string))
        .or_else(|| extract_string_field(&text, "narrative"));

    match nested {
        Some(inner) if !contains_json_keys(&inner) => inner,
        _ => strip_json_artifacts(&text),
    }
}
