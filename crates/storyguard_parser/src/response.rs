//! The normalized record carried alongside the narrative text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured fields of a model reply.
///
/// Every field has a type-appropriate empty default. Absent keys, `null`
/// values and values of the wrong type all normalize to that default, so
/// callers never branch on presence. Unknown keys are ignored.
///
/// # Examples
///
/// ```
/// use storyguard_parser::StructuredResponse;
///
/// let response: StructuredResponse = serde_json::from_str(
///     r#"{"narrative": null, "dice_rolls": "1d20: 14", "extra": true}"#,
/// ).unwrap();
/// assert_eq!(response.narrative(), "");
/// assert!(response.dice_rolls().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
#[serde(from = "Value")]
pub struct StructuredResponse {
    /// Narrative prose.
    narrative: String,
    /// Entities the model claims to have mentioned.
    entities_mentioned: Vec<String>,
    /// Location the model confirms the scene takes place in.
    location_confirmed: String,
    /// State changes requested by the model.
    state_updates: Map<String, Value>,
    /// Session header line.
    session_header: String,
    /// Player-facing choices and the model's planning notes.
    planning_block: Map<String, Value>,
    /// Dice roll descriptions.
    dice_rolls: Vec<String>,
    /// Resource summary line.
    resources: String,
    /// Debug side-channel.
    debug_info: Map<String, Value>,
    /// Authoring-mode response text.
    god_mode_response: Option<String>,
}

impl StructuredResponse {
    /// A response carrying only narrative text.
    pub fn from_narrative(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            ..Default::default()
        }
    }

    /// Build a response from a decoded JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            narrative: string_field(object, "narrative"),
            entities_mentioned: string_list_field(object, "entities_mentioned"),
            location_confirmed: string_field(object, "location_confirmed"),
            state_updates: map_field(object, "state_updates"),
            session_header: string_field(object, "session_header"),
            planning_block: map_field(object, "planning_block"),
            dice_rolls: string_list_field(object, "dice_rolls"),
            resources: string_field(object, "resources"),
            debug_info: map_field(object, "debug_info"),
            god_mode_response: object
                .get("god_mode_response")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// The god-mode text, if present and not blank.
    pub fn god_mode_text(&self) -> Option<&str> {
        self.god_mode_response
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub(crate) fn set_narrative(&mut self, narrative: String) {
        self.narrative = narrative;
    }

    pub(crate) fn set_god_mode_response(&mut self, text: Option<String>) {
        self.god_mode_response = text;
    }

    pub(crate) fn set_entities_mentioned(&mut self, entities: Vec<String>) {
        self.entities_mentioned = entities;
    }

    pub(crate) fn set_location_confirmed(&mut self, location: String) {
        self.location_confirmed = location;
    }

    pub(crate) fn planning_block_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.planning_block
    }
}

impl From<Value> for StructuredResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => Self::from_object(&object),
            Value::String(text) => Self::from_narrative(text),
            _ => Self::default(),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn string_list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn map_field(object: &Map<String, Value>, key: &str) -> Map<String, Value> {
    match object.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_normalize_to_defaults() {
        let response = StructuredResponse::from(json!({
            "narrative": null,
            "entities_mentioned": null,
            "state_updates": null,
            "planning_block": null,
            "god_mode_response": null,
        }));
        assert_eq!(response.narrative(), "");
        assert!(response.entities_mentioned().is_empty());
        assert!(response.state_updates().is_empty());
        assert!(response.planning_block().is_empty());
        assert!(response.god_mode_response().is_none());
    }

    #[test]
    fn test_non_array_dice_rolls_become_empty() {
        let response = StructuredResponse::from(json!({"dice_rolls": {"roll": "1d20"}}));
        assert!(response.dice_rolls().is_empty());

        let response = StructuredResponse::from(json!({"dice_rolls": ["1d20: 17", 4]}));
        assert_eq!(response.dice_rolls(), &vec!["1d20: 17".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let response = StructuredResponse::from(json!({"narrative": "x", "mood": "grim"}));
        assert_eq!(response, StructuredResponse::from_narrative("x"));
    }

    #[test]
    fn test_blank_god_mode_text_is_none() {
        let response = StructuredResponse::from(json!({"god_mode_response": "   "}));
        assert!(response.god_mode_response().is_some());
        assert!(response.god_mode_text().is_none());
    }

    #[test]
    fn test_serializes_every_field() {
        let value = serde_json::to_value(StructuredResponse::default()).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "narrative",
            "entities_mentioned",
            "location_confirmed",
            "state_updates",
            "session_header",
            "planning_block",
            "dice_rolls",
            "resources",
            "debug_info",
            "god_mode_response",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
    }
}
