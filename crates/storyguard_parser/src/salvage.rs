//! Recovery for replies that are JSON-shaped but not valid JSON.

use regex::Regex;
use std::sync::LazyLock;

static FIELD_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*""#).expect("valid regex"));

static JSON_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""(narrative|god_mode_response|entities_mentioned|location_confirmed|state_updates|session_header|planning_block|dice_rolls|resources|debug_info)"\s*:"#,
    )
    .expect("valid regex")
});

static ANY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[A-Za-z_][A-Za-z0-9_]*"\s*:\s*"#).expect("valid regex"));

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z]*").expect("valid regex"));

/// Whether `text` still carries one of the response's JSON keys.
pub fn contains_json_keys(text: &str) -> bool {
    JSON_KEY_RE.is_match(text)
}

/// Recover the string value of `"key": "..."` from broken JSON.
///
/// Scans to the closing quote, honouring escapes; a value cut off by a
/// truncated reply is returned up to the end of the input. Returns `None`
/// when the key does not appear with a string value.
///
/// # Examples
///
/// ```
/// use storyguard_parser::extract_string_field;
///
/// let broken = r#"{"narrative": "The hall falls silent.\nSariel waits", "entit"#;
/// assert_eq!(
///     extract_string_field(broken, "narrative").as_deref(),
///     Some("The hall falls silent.\nSariel waits")
/// );
/// ```
pub fn extract_string_field(text: &str, key: &str) -> Option<String> {
    let captures = FIELD_START_RE
        .captures_iter(text)
        .find(|caps| &caps[1] == key)?;
    let value_start = captures.get(0)?.end();

    let mut raw_end = text.len();
    let mut escaped = false;
    for (i, ch) in text[value_start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => {
                raw_end = value_start + i;
                break;
            }
            _ => {}
        }
    }

    Some(unescape_json_string(&text[value_start..raw_end]))
}

/// Decode JSON string escapes (`\n`, `\"`, `\\`, `\t`, `\uXXXX`, ...).
///
/// Malformed escapes are kept literally; a dangling backslash is dropped.
pub fn unescape_json_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = (hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push_str("\\u"),
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {}
        }
    }

    out
}

/// Recover a string array value of `"key": [...]` from broken JSON.
pub(crate) fn extract_string_list(text: &str, key: &str) -> Vec<String> {
    let pattern = format!(r#""{}"\s*:\s*(\[[^\]]*\])"#, regex::escape(key));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures(text)
        .and_then(|caps| serde_json::from_str::<Vec<String>>(&caps[1]).ok())
        .unwrap_or_default()
}

/// Last-resort cleanup: strip JSON punctuation and keys, keep the prose.
///
/// Quotation marks inside a line survive so dialogue stays readable; only
/// structural quotes at line edges and before commas are removed.
pub fn strip_json_artifacts(text: &str) -> String {
    let unescaped = text.replace("\\n", "\n").replace("\\\"", "\"");
    let without_fences = FENCE_RE.replace_all(&unescaped, "");
    let without_keys = ANY_KEY_RE.replace_all(&without_fences, "");

    without_keys
        .replace(['{', '}', '[', ']'], "")
        .replace("\",", "\n")
        .lines()
        .map(|line| line.trim().trim_matches(|c: char| c == '"' || c == ',').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
