//! Textual signals used to score entity presence.
//!
//! Each signal is a pure function of the narrative and one entity name so the
//! scoring formulas built on top of them stay auditable. Name matching is
//! case-insensitive and respects word boundaries, so "Cass" never matches
//! inside "Cassian".

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Verbs that attribute an action or utterance to the word before them.
pub const ACTION_VERBS: &[&str] = &[
    "says", "said", "asks", "asked", "replies", "replied", "whispers", "whispered", "shouts",
    "shouted", "murmurs", "murmured", "mutters", "muttered", "calls", "called", "answers",
    "answered", "speaks", "spoke", "exclaims", "exclaimed", "laughs", "laughed", "sighs",
    "sighed", "nods", "nodded", "smiles", "smiled", "grins", "grinned", "frowns", "frowned",
    "draws", "drew", "watches", "watched", "moves", "moved", "walks", "walked", "turns",
    "turned", "looks", "looked", "glances", "glanced", "steps", "stepped", "raises", "raised",
    "reaches", "reached", "stands", "stood", "sits", "sat", "enters", "entered", "points",
    "pointed", "runs", "ran", "grabs", "grabbed", "kneels", "knelt", "bows", "bowed",
];

/// Title words that never identify an entity on their own.
const HONORIFICS: &[&str] = &[
    "lady", "lord", "sir", "dame", "king", "queen", "prince", "princess", "captain", "master",
    "mistress", "the", "of", "de", "van", "von", "dr", "mr", "mrs", "ms",
];

static PRONOUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(he|she|him|her|his|hers)\b").expect("valid regex")
});

// Collective or unnamed actors that must never resolve to a named character.
static GROUP_SUBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(the\s+(party|group|company|crowd|others|figures?|stranger)|a\s+figure|everyone|everybody|someone|somebody|they|them|we|us)\b",
    )
    .expect("valid regex")
});

// "Gid--", "Gid—", "Gid-" at a word edge
static TRUNCATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\p{L}{3,})(?:--|—|-(?:\s|$|["'.,!?]))"#).expect("valid regex")
});

static SENTENCE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[.!?]["'”]?\s+)(\p{L}+)"#).expect("valid regex")
});

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offsets just past each whole-word occurrence of `needle` in `haystack`.
///
/// Both arguments must already be lowercased.
fn word_match_ends(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }

    haystack
        .match_indices(needle)
        .filter(|(start, matched)| {
            let end = start + matched.len();
            let before_ok = haystack[..*start]
                .chars()
                .next_back()
                .is_none_or(|c| !is_word_char(c));
            let after_ok = haystack[end..]
                .chars()
                .next()
                .is_none_or(|c| !is_word_char(c));
            before_ok && after_ok
        })
        .map(|(start, matched)| start + matched.len())
        .collect()
}

/// Lowercased name tokens with surrounding punctuation removed.
pub fn name_tokens(name: &str) -> Vec<String> {
    name.split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Whether `token` is a title word rather than part of a proper name.
pub fn is_honorific(token: &str) -> bool {
    HONORIFICS.contains(&token)
}

/// Whether the full name appears as whole words, ignoring case.
///
/// # Examples
///
/// ```
/// use storyguard_validation::signals::direct_mention;
///
/// assert!(direct_mention("Later, CASSIAN returns.", "Cassian"));
/// assert!(direct_mention("Cassian's blade", "Cassian"));
/// assert!(!direct_mention("Cassiana waves.", "Cassian"));
/// ```
pub fn direct_mention(text: &str, name: &str) -> bool {
    let name = name.trim().to_lowercase();
    !word_match_ends(&text.to_lowercase(), &name).is_empty()
}

/// Whether the name is immediately followed by an action or reporting verb.
///
/// One adverb between name and verb is tolerated ("Cassian quietly says").
pub fn action_attribution(text: &str, name: &str) -> bool {
    let lowered = text.to_lowercase();
    let name = name.trim().to_lowercase();

    word_match_ends(&lowered, &name).into_iter().any(|end| {
        let mut words = lowered[end..]
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()));
        match words.next() {
            Some(first) if ACTION_VERBS.contains(&first) => true,
            Some(first) if first.ends_with("ly") => {
                words.next().is_some_and(|second| ACTION_VERBS.contains(&second))
            }
            _ => false,
        }
    })
}

/// Fraction of the name's tokens that appear as whole words.
///
/// Returns 0.0 for single-token names (a full match is a direct mention) and
/// when only honorifics matched ("the lady" is not "Lady Cressida").
///
/// # Examples
///
/// ```
/// use storyguard_validation::signals::partial_match_fraction;
///
/// let fraction = partial_match_fraction("Cressida Valeriana bows.", "Lady Cressida Valeriana");
/// assert!((fraction - 2.0 / 3.0).abs() < 1e-9);
/// assert_eq!(partial_match_fraction("The lady bows.", "Lady Cressida"), 0.0);
/// ```
pub fn partial_match_fraction(text: &str, name: &str) -> f64 {
    let tokens = name_tokens(name);
    if tokens.len() < 2 {
        return 0.0;
    }

    let words: HashSet<String> = text
        .split_whitespace()
        .map(|w| {
            w.to_lowercase()
                .trim_matches(|c: char| !c.is_alphanumeric())
                .trim_end_matches("'s")
                .trim_end_matches("’s")
                .to_string()
        })
        .collect();

    let matched: Vec<&String> = tokens.iter().filter(|t| words.contains(*t)).collect();
    if !matched.iter().any(|t| !is_honorific(t)) {
        return 0.0;
    }
    matched.len() as f64 / tokens.len() as f64
}

/// Whether a cut-off form of one of the name's tokens appears ("Gid--" for "Gideon").
pub fn truncated_mention(text: &str, name: &str) -> bool {
    let tokens: Vec<String> = name_tokens(name)
        .into_iter()
        .filter(|t| t.chars().count() >= 4 && !is_honorific(t))
        .collect();

    TRUNCATED_RE.captures_iter(text).any(|caps| {
        let stub = caps[1].to_lowercase();
        tokens
            .iter()
            .any(|token| token.starts_with(&stub) && token.len() > stub.len())
    })
}

/// Whether the text uses singular third-person pronouns.
pub fn has_pronouns(text: &str) -> bool {
    PRONOUN_RE.is_match(text)
}

/// Whether the text names a group or an unnamed figure ("the party", "someone").
pub fn has_group_subject(text: &str) -> bool {
    GROUP_SUBJECT_RE.is_match(text)
}

/// Whether some sentence opens with an action verb and no subject ("Draws her sword.").
pub fn has_subjectless_action(text: &str) -> bool {
    SENTENCE_START_RE.captures_iter(text).any(|caps| {
        let first = caps[1].to_lowercase();
        ACTION_VERBS.contains(&first.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_subject() {
        assert!(has_group_subject("The party moves on."));
        assert!(has_group_subject("Someone laughs behind the door."));
        assert!(has_group_subject("A figure turns away."));
        assert!(!has_group_subject("She turns away from the theory."));
    }

    #[test]
    fn test_direct_mention_word_boundaries() {
        assert!(direct_mention("Sariel draws her sword.", "Sariel"));
        assert!(direct_mention("\"Sariel!\"", "sariel"));
        assert!(!direct_mention("Sarielle draws.", "Sariel"));
        assert!(!direct_mention("", "Sariel"));
    }

    #[test]
    fn test_direct_mention_multi_word() {
        assert!(direct_mention("Then Lady Cressida smiles.", "Lady Cressida"));
        assert!(!direct_mention("Then Lady Cressidas smiles.", "Lady Cressida"));
    }

    #[test]
    fn test_action_attribution() {
        assert!(action_attribution("Sariel draws her sword.", "Sariel"));
        assert!(action_attribution("\"No,\" Cassian says.", "Cassian"));
        assert!(action_attribution("Cassian quietly says no.", "Cassian"));
        assert!(!action_attribution("They speak of Cassian often.", "Cassian"));
        assert!(!action_attribution("Cassian, the scholar.", "Cassian"));
    }

    #[test]
    fn test_partial_match_single_token_is_zero() {
        assert_eq!(partial_match_fraction("Cassian is here", "Cassian"), 0.0);
    }

    #[test]
    fn test_partial_match_possessive() {
        let fraction = partial_match_fraction("Cressida's fan snaps shut.", "Lady Cressida");
        assert!((fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_mention() {
        assert!(truncated_mention("\"Gid--\" the voice breaks off.", "Gideon"));
        assert!(truncated_mention("She calls out, Gid— and falls silent.", "Gideon"));
        assert!(!truncated_mention("A well-known path.", "Gideon"));
        assert!(!truncated_mention("Gideon-- finished.", "Gid"));
    }

    #[test]
    fn test_subjectless_action() {
        assert!(has_subjectless_action("Draws her sword. Waits."));
        assert!(has_subjectless_action("The hall is quiet. Steps forward slowly."));
        assert!(!has_subjectless_action("The sword is drawn."));
    }

    #[test]
    fn test_pronouns() {
        assert!(has_pronouns("She waits by the door."));
        assert!(!has_pronouns("The party waits by the door."));
    }
}
