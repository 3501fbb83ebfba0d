//! Keeps the story clock moving forward between turns.

use crate::{WorldTime, parse_timestamp};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, instrument, warn};

/// State key holding the clock.
pub const WORLD_TIME_KEY: &str = "world_time";
/// Fallback timestamp keys, in lookup order.
pub const TIMESTAMP_KEYS: [&str; 2] = ["timestamp", "timestamp_iso"];

static THINK_REQUEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(think|thinks|thinking|plan|plans|planning|consider|considering|strategi[sz]e|strategi[sz]ing|options?)\b",
    )
    .expect("valid regex")
});

/// Whether the player asked to deliberate rather than act.
///
/// Deliberation costs a single microsecond of story time.
pub fn is_think_request(user_input: &str) -> bool {
    THINK_REQUEST_RE.is_match(user_input)
}

/// Whether `new` fails to move past `old`.
pub fn check_temporal_violation(old: &WorldTime, new: &WorldTime) -> bool {
    new <= old
}

/// The clock a state payload carries, if any.
///
/// Reads `world_time` (object or ISO string), falling back to the
/// `timestamp` and `timestamp_iso` string fields. Unparseable values are
/// skipped.
pub fn extract_world_time(state_changes: &Map<String, Value>) -> Option<WorldTime> {
    if let Some(value) = state_changes.get(WORLD_TIME_KEY)
        && let Some(time) = WorldTime::from_value(value)
    {
        return Some(time);
    }
    TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| state_changes.get(*key).and_then(Value::as_str))
        .find_map(parse_timestamp)
}

/// The smallest advance from `previous` for this kind of turn.
///
/// `None` when no later clock can be represented, either because a field
/// would overflow or because out-of-range fields make the carry go backwards.
pub fn minimal_advance(previous: &WorldTime, user_input: &str) -> Option<WorldTime> {
    let next = if is_think_request(user_input) {
        previous.advance_microseconds(1)
    } else {
        previous.advance_seconds(1)
    };
    next.filter(|next| next > previous)
}

/// Guarantee the state payload never stalls or rewinds the story clock.
///
/// In god mode the payload is returned untouched. Otherwise a clock value
/// strictly later than `previous_world_time` is kept verbatim; a missing,
/// identical or earlier one is replaced by [`minimal_advance`] under
/// `world_time`. Without a previous tick there is nothing to compare with and
/// the payload is returned untouched, as it is when the previous tick cannot
/// be advanced at all.
///
/// # Examples
///
/// ```
/// use serde_json::{Map, json};
/// use storyguard_time::{WorldTime, ensure_progressive_world_time};
///
/// let previous = WorldTime { year: 1492, month: 3, day: 15, hour: 10, ..Default::default() };
/// let state = ensure_progressive_world_time(Map::new(), Some(&previous), "I open the door", false);
///
/// assert_eq!(state["world_time"]["second"], json!(1));
/// ```
#[instrument(skip(state_changes, user_input), fields(god_mode = is_god_mode))]
pub fn ensure_progressive_world_time(
    mut state_changes: Map<String, Value>,
    previous_world_time: Option<&WorldTime>,
    user_input: &str,
    is_god_mode: bool,
) -> Map<String, Value> {
    if is_god_mode {
        return state_changes;
    }
    let Some(previous) = previous_world_time else {
        return state_changes;
    };

    let supplied = extract_world_time(&state_changes);
    if let Some(supplied) = supplied {
        if !check_temporal_violation(previous, &supplied) {
            debug!(%supplied, "Accepted model-supplied world time");
            return state_changes;
        }
        if supplied < *previous {
            warn!(%previous, %supplied, "Model moved world time backwards");
        }
    }

    let Some(next) = minimal_advance(previous, user_input) else {
        warn!(%previous, "World time cannot advance past previous tick");
        return state_changes;
    };
    debug!(%previous, %next, "Synthesized world time advance");
    state_changes.insert(WORLD_TIME_KEY.to_string(), next.to_value());
    state_changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn previous() -> WorldTime {
        WorldTime {
            year: 1492,
            month: 3,
            day: 15,
            hour: 10,
            ..Default::default()
        }
    }

    fn state(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_think_request_detection() {
        assert!(is_think_request("Let me think about this"));
        assert!(is_think_request("What are my OPTIONS?"));
        assert!(is_think_request("I strategise quietly"));
        assert!(!is_think_request("I attack the goblin"));
        assert!(!is_think_request("The planet glows"));
    }

    #[test]
    fn test_violation_check() {
        let t = previous();
        assert!(check_temporal_violation(&t, &t));
        let later = t.advance_microseconds(1).unwrap();
        assert!(!check_temporal_violation(&t, &later));
        assert!(check_temporal_violation(&later, &t));
    }

    #[test]
    fn test_god_mode_untouched() {
        let input = state(json!({"world_time": {"year": 1}}));
        let output = ensure_progressive_world_time(input.clone(), Some(&previous()), "x", true);
        assert_eq!(output, input);
    }

    #[test]
    fn test_no_previous_untouched() {
        let output = ensure_progressive_world_time(Map::new(), None, "x", false);
        assert!(output.is_empty());
    }

    #[test]
    fn test_later_value_accepted_verbatim() {
        let input = state(json!({"world_time": "1492-03-15T12:00:00Z", "hp": 3}));
        let output = ensure_progressive_world_time(input.clone(), Some(&previous()), "x", false);
        assert_eq!(output, input);
    }

    #[test]
    fn test_identical_value_advanced() {
        let input = state(json!({"world_time": previous().to_value()}));
        let output = ensure_progressive_world_time(input, Some(&previous()), "I wait", false);
        let next = WorldTime::from_value(&output["world_time"]).unwrap();
        assert_eq!(next.second, 1);
        assert!(next > previous());
    }

    #[test]
    fn test_think_request_advances_one_microsecond() {
        let output =
            ensure_progressive_world_time(Map::new(), Some(&previous()), "I consider my plan", false);
        let next = WorldTime::from_value(&output["world_time"]).unwrap();
        assert_eq!(next.microsecond, 1);
        assert_eq!(next.second, 0);
    }

    #[test]
    fn test_earlier_value_replaced() {
        let input = state(json!({"world_time": {"year": 1400, "month": "January", "day": 1}}));
        let output = ensure_progressive_world_time(input, Some(&previous()), "I run", false);
        let next = WorldTime::from_value(&output["world_time"]).unwrap();
        assert!(next > previous());
    }

    #[test]
    fn test_unadvanceable_previous_leaves_state_alone() {
        let last = WorldTime {
            day: i64::MAX,
            hour: 23,
            minute: 59,
            second: 59,
            ..Default::default()
        };
        let input = state(json!({"hp": 3}));
        let output = ensure_progressive_world_time(input.clone(), Some(&last), "I wait", false);
        assert_eq!(output, input);
    }

    #[test]
    fn test_negative_fields_never_rewind() {
        let odd = WorldTime {
            second: -5,
            ..previous()
        };
        assert_eq!(minimal_advance(&odd, "I wait"), None);
    }

    #[test]
    fn test_timestamp_fallback() {
        let input = state(json!({"timestamp_iso": "1492-03-15T11:00:00+00:00"}));
        let output = ensure_progressive_world_time(input.clone(), Some(&previous()), "x", false);
        assert_eq!(output, input);

        let malformed = state(json!({"timestamp": "dawn-ish"}));
        let output = ensure_progressive_world_time(malformed, Some(&previous()), "x", false);
        assert!(output.contains_key("world_time"));
    }
}
