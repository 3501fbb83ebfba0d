//! Sanitization of player-facing choice text.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static SCRIPT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

// An opening tag with no closing tag swallows the rest of the value
static SCRIPT_UNCLOSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*$").expect("valid regex"));

static SCRIPT_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</script\s*>").expect("valid regex"));

static SPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Remove `<script>` elements and their content.
///
/// Everything else, including `&`, `<`, `>` and quotes, is left untouched.
///
/// # Examples
///
/// ```
/// use storyguard_parser::strip_script_tags;
///
/// assert_eq!(
///     strip_script_tags("Attack <script>alert('x')</script> the <b> & \"guards\""),
///     "Attack the <b> & \"guards\""
/// );
/// ```
pub fn strip_script_tags(text: &str) -> String {
    if !text.to_ascii_lowercase().contains("script") {
        return text.to_string();
    }

    let stripped = SCRIPT_BLOCK_RE.replace_all(text, "");
    let stripped = SCRIPT_UNCLOSED_RE.replace_all(&stripped, "");
    let stripped = SCRIPT_CLOSE_RE.replace_all(&stripped, "");

    if stripped == text {
        return text.to_string();
    }
    SPACE_RUN_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Strip script content from every choice in a planning block.
///
/// Choices may be keyed by id (`{"choices": {"id": {"text": ...}}}`) or
/// listed (`{"choices": [{"text": ...}]}`). The `text` and `description`
/// fields of each choice are cleaned in place.
pub fn sanitize_choices(planning_block: &mut Map<String, Value>) {
    let Some(choices) = planning_block.get_mut("choices") else {
        return;
    };

    let entries: Vec<&mut Value> = match choices {
        Value::Object(map) => map.values_mut().collect(),
        Value::Array(items) => items.iter_mut().collect(),
        _ => return,
    };

    for choice in entries {
        let Value::Object(fields) = choice else {
            continue;
        };
        for key in ["text", "description"] {
            if let Some(Value::String(value)) = fields.get_mut(key) {
                let cleaned = strip_script_tags(value);
                if cleaned != *value {
                    tracing::warn!(field = key, "Removed script content from planning choice");
                    *value = cleaned;
                }
            }
        }
    }
}
