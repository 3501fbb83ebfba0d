//! Append-only repair: introduce a missing entity with one templated sentence.

use regex::Regex;
use std::sync::LazyLock;
use storyguard_core::ValidationResult;
use tracing::debug;

static DIALOGUE_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"["“”]|(?i)\b(says|said|asks|asked|replies|replied|whispers|whispered|shouts|shouted|exclaims|exclaimed|murmurs|murmured|mutters|muttered)\b"#,
    )
    .expect("valid regex")
});

static ACTION_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(moves?|moved|walks?|walked|turns?|turned|looks?|looked|runs?|ran|steps?|stepped|reaches|reached|draws?|drew|climbs?|climbed|enters?|entered)\b",
    )
    .expect("valid regex")
});

static REACTION_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(scared|afraid|helpless|worried|angry|furious|terrified|anxious|nervous|desperate|grief|tears|trembl\w*|panic\w*)\b",
    )
    .expect("valid regex")
});

/// How an injected sentence introduces the entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InjectionStyle {
    /// The entity speaks.
    DialogueBased,
    /// The entity moves or acts.
    ActionBased,
    /// The entity reacts to the mood of the scene.
    ReactionBased,
    /// The entity is simply noted as present.
    PresenceBased,
}

/// One entity introduced by the injector.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, derive_getters::Getters)]
pub struct Injection {
    /// Entity name.
    entity: String,
    /// Style chosen for its sentence.
    style: InjectionStyle,
}

/// Narrative after batch injection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, derive_getters::Getters)]
pub struct InjectionOutcome {
    /// The original narrative with the injected sentences appended.
    narrative: String,
    /// Injected entities in order.
    injected: Vec<Injection>,
}

/// Appends a sentence per missing entity, styled after cues in the text.
///
/// Existing text is never rewritten: the output always starts with the input.
///
/// # Examples
///
/// ```
/// use storyguard_validation::{AdaptiveEntityInjector, InjectionStyle};
///
/// let injector = AdaptiveEntityInjector;
/// let narrative = "\"We should go,\" Sariel says.";
/// assert_eq!(injector.detect_style(narrative), InjectionStyle::DialogueBased);
///
/// let repaired = injector.inject_entity(narrative, "Cassian", None);
/// assert!(repaired.starts_with(narrative));
/// assert!(repaired.contains("Cassian"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptiveEntityInjector;

impl AdaptiveEntityInjector {
    /// Pick a style from cues in priority order: dialogue, action, reaction.
    pub fn detect_style(&self, narrative: &str) -> InjectionStyle {
        if DIALOGUE_CUE_RE.is_match(narrative) {
            InjectionStyle::DialogueBased
        } else if ACTION_CUE_RE.is_match(narrative) {
            InjectionStyle::ActionBased
        } else if REACTION_CUE_RE.is_match(narrative) {
            InjectionStyle::ReactionBased
        } else {
            InjectionStyle::PresenceBased
        }
    }

    /// The templated sentence introducing `entity` in `style`.
    pub fn sentence(&self, style: InjectionStyle, entity: &str, location: Option<&str>) -> String {
        match (style, location) {
            (InjectionStyle::DialogueBased, _) => {
                format!("{entity} speaks up, \"I'm here too. Tell me what you need.\"")
            }
            (InjectionStyle::ActionBased, Some(location)) => {
                format!("{entity} moves through {location} to stand with the others, ready to act.")
            }
            (InjectionStyle::ActionBased, None) => {
                format!("{entity} moves to stand with the others, ready to act.")
            }
            (InjectionStyle::ReactionBased, _) => {
                format!("{entity} reacts to the tension, jaw tight, watching everything closely.")
            }
            (InjectionStyle::PresenceBased, Some(location)) => {
                format!("{entity} is there in {location} as well, quietly taking in the scene.")
            }
            (InjectionStyle::PresenceBased, None) => {
                format!("{entity} is there as well, quietly taking in the scene.")
            }
        }
    }

    /// Append one sentence introducing `entity`.
    ///
    /// A blank entity name leaves the narrative unchanged.
    pub fn inject_entity(&self, narrative: &str, entity: &str, location: Option<&str>) -> String {
        self.inject_with_style(narrative, entity, location).0
    }

    fn inject_with_style(
        &self,
        narrative: &str,
        entity: &str,
        location: Option<&str>,
    ) -> (String, Option<InjectionStyle>) {
        let entity = entity.trim();
        if entity.is_empty() {
            return (narrative.to_string(), None);
        }

        let style = self.detect_style(narrative);
        let sentence = self.sentence(style, entity, location);
        debug!(entity, %style, "Injecting entity");

        let mut repaired = narrative.to_string();
        if !repaired.is_empty() && !repaired.ends_with(char::is_whitespace) {
            repaired.push(' ');
        }
        repaired.push_str(&sentence);
        (repaired, Some(style))
    }

    /// Inject every entity `result` reports missing, re-detecting the style
    /// on the growing text each time.
    pub fn inject_missing(
        &self,
        narrative: &str,
        result: &ValidationResult,
        location: Option<&str>,
    ) -> InjectionOutcome {
        let mut current = narrative.to_string();
        let mut injected = Vec::new();
        for entity in result.missing_entities() {
            let (next, style) = self.inject_with_style(&current, entity, location);
            current = next;
            if let Some(style) = style {
                injected.push(Injection {
                    entity: entity.clone(),
                    style,
                });
            }
        }
        InjectionOutcome {
            narrative: current,
            injected,
        }
    }
}
