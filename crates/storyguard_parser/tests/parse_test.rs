//! Behavioural tests for the structured-response parser.

use serde_json::json;
use storyguard_parser::parse_structured_response;

const FORBIDDEN: [&str; 3] = ["\"narrative\":", "\"entities_mentioned\":", "\"state_updates\":"];

fn assert_clean(text: &str) {
    for marker in FORBIDDEN {
        assert!(!text.contains(marker), "{marker} leaked into {text:?}");
    }
}

#[test]
fn test_god_mode_only_has_no_padding() {
    let raw = r#"{"narrative":"","god_mode_response":"A thick fog descends.","entities_mentioned":["fog"],"location_confirmed":"Moor","state_updates":{},"planning_block":{}}"#;
    let (text, response) = parse_structured_response(raw);
    assert_eq!(text, "A thick fog descends.");
    assert_eq!(response.location_confirmed(), "Moor");
}

#[test]
fn test_json_round_trip_returns_narrative() {
    let samples = [
        "Plain sentence.",
        "Line one.\nLine two.",
        "\"Hold,\" Cassian says, \"the gate is {sealed}.\"",
        "Symbols & <angles> stay put: 5 < 7 > 3",
        "Unicode works too: café, 龍, 🗡",
        "",
    ];
    for narrative in samples {
        let raw = json!({
            "narrative": narrative,
            "entities_mentioned": ["Cassian"],
            "state_updates": {"turn": 3},
        })
        .to_string();
        let (text, response) = parse_structured_response(&raw);
        assert_eq!(text, narrative);
        assert_eq!(response.narrative(), narrative);
    }
}

#[test]
fn test_never_leaks_json_keys() {
    let inputs = [
        r#"{"narrative": "Clean.", "entities_mentioned": [], "state_updates": {}}"#.to_string(),
        "```json\n{\"narrative\": \"Fenced.\", \"state_updates\": {}}\n```".to_string(),
        "```\n{\"narrative\": \"Fenced, no tag.\"}".to_string(),
        r#"{"narrative": "Truncated mid-sent"#.to_string(),
        r#"{"entities_mentioned": ["Sariel"], "state_updates": {"x": 1"#.to_string(),
        r#"{"narrative": "{\"narrative\": \"nested\", \"state_updates\": {}}"}"#.to_string(),
        "Preamble {\"narrative\": \"Embedded.\", \"entities_mentioned\": []} trailing".to_string(),
    ];
    for raw in inputs {
        let (text, _) = parse_structured_response(&raw);
        assert_clean(&text);
    }
}

#[test]
fn test_plain_text_returned_verbatim() {
    let raw = "  Sariel looks around the empty throne room.\n";
    let (text, response) = parse_structured_response(raw);
    assert_eq!(text, raw);
    assert!(response.entities_mentioned().is_empty());
}

#[test]
fn test_full_wire_shape() {
    let raw = json!({
        "narrative": "The dice clatter.",
        "session_header": "Session 4 | Day 12",
        "planning_block": {
            "thinking": "options",
            "context": "tavern",
            "choices": {
                "bribe": {
                    "text": "Bribe the guard <script>document.cookie</script>",
                    "description": "Costs 10gp & some pride",
                    "risk_level": "low"
                }
            }
        },
        "dice_rolls": ["Persuasion: 1d20+3 = 17"],
        "resources": "HP 12/15",
        "debug_info": {"dm_notes": "guard is corrupt"},
        "unknown_key": 42
    })
    .to_string();

    let (text, response) = parse_structured_response(&raw);
    assert_eq!(text, "The dice clatter.");
    assert_eq!(response.session_header(), "Session 4 | Day 12");
    assert_eq!(response.dice_rolls(), &vec!["Persuasion: 1d20+3 = 17".to_string()]);
    assert_eq!(response.resources(), "HP 12/15");
    assert_eq!(response.debug_info()["dm_notes"], "guard is corrupt");
    assert_eq!(
        response.planning_block()["choices"]["bribe"]["text"],
        "Bribe the guard"
    );
    assert_eq!(
        response.planning_block()["choices"]["bribe"]["description"],
        "Costs 10gp & some pride"
    );
}

#[test]
fn test_dice_rolls_non_array_normalized() {
    let (_, response) =
        parse_structured_response(r#"{"narrative": "x", "dice_rolls": "1d6: 4"}"#);
    assert!(response.dice_rolls().is_empty());
}

#[test]
fn test_god_mode_with_narrative_joined_by_blank_line() {
    let raw = r#"{"narrative": "The fog thins.", "god_mode_response": "Weather changed."}"#;
    let (text, _) = parse_structured_response(raw);
    assert_eq!(text, "Weather changed.\n\nThe fog thins.");
}

#[test]
fn test_truncated_god_mode_salvaged() {
    let raw = r#"{"narrative": "", "god_mode_response": "The tower crumbles"#;
    let (text, response) = parse_structured_response(raw);
    assert_eq!(text, "The tower crumbles");
    assert_eq!(response.god_mode_response().as_deref(), Some("The tower crumbles"));
}
