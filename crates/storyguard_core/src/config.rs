//! Configuration for the validation pipeline.
//!
//! Configuration is layered:
//! - Bundled defaults (include_str! from storyguard.toml)
//! - User overrides (./storyguard.toml or ~/.config/storyguard/storyguard.toml)
//! - Later sources override earlier ones key by key

use crate::CombinationStrategy;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use storyguard_error::{ConfigError, StoryguardError, StoryguardResult};
use tracing::{debug, instrument};

/// Scoring thresholds for presence validation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Overall confidence required for a narrative to pass.
    #[serde(default = "default_min_confidence")]
    pub min_confidence_threshold: f64,

    /// Per-entity score above which an entity is reported as found.
    #[serde(default = "default_found_threshold")]
    pub found_threshold: f64,
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_found_threshold() -> f64 {
    0.3
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_confidence_threshold: default_min_confidence(),
            found_threshold: default_found_threshold(),
        }
    }
}

/// Bounds for the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum number of regeneration attempts after the initial validation.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

/// Merge policy for dual-pass generation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DualPassConfig {
    /// Second pass counts as a full rewrite at this fraction of the first pass length.
    #[serde(default = "default_rewrite_ratio")]
    pub rewrite_ratio: f64,
}

fn default_rewrite_ratio() -> f64 {
    0.8
}

impl Default for DualPassConfig {
    fn default() -> Self {
        Self {
            rewrite_ratio: default_rewrite_ratio(),
        }
    }
}

/// Vote weight per strategy family.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategyWeights {
    /// Exact token matching.
    #[serde(default = "default_weight")]
    pub token: f64,
    /// Fuzzy matching.
    #[serde(default = "default_weight")]
    pub fuzzy: f64,
    /// LLM-judged matching.
    #[serde(default = "default_weight")]
    pub llm: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            token: default_weight(),
            fuzzy: default_weight(),
            llm: default_weight(),
        }
    }
}

/// Hybrid combiner settings.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct HybridConfig {
    /// Rule used to combine verdicts.
    #[serde(default)]
    pub combination_strategy: CombinationStrategy,

    /// Weights used by [`CombinationStrategy::WeightedVote`].
    #[serde(default)]
    pub weights: StrategyWeights,
}

/// Entity-specific phrasing for retry suggestions.
///
/// ```toml
/// [[entity_hints]]
/// name = "Cassian"
/// hint = "Cassian should speak or act on his own initiative"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityHint {
    /// Entity display name.
    pub name: String,
    /// Suggestion text used instead of the generic phrasing.
    pub hint: String,
}

impl EntityHint {
    /// The hint configured for `name` among `hints`, matched case-insensitively.
    pub fn lookup<'a>(hints: &'a [EntityHint], name: &str) -> Option<&'a str> {
        hints
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.hint.as_str())
    }
}

/// Top-level storyguard configuration.
///
/// # Example
///
/// ```no_run
/// use storyguard_core::StoryguardConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StoryguardConfig::load()?;
/// println!("threshold: {}", config.validation.min_confidence_threshold);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct StoryguardConfig {
    /// Scoring thresholds.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Retry loop bounds.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Dual-pass merge policy.
    #[serde(default)]
    pub dual_pass: DualPassConfig,

    /// Hybrid combiner settings.
    #[serde(default)]
    pub hybrid: HybridConfig,

    /// Entity-specific retry phrasing.
    #[serde(default)]
    pub entity_hints: Vec<EntityHint>,
}

impl StoryguardConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> StoryguardResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                StoryguardError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StoryguardError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (storyguard.toml shipped with the library)
    /// 2. User config in home directory (~/.config/storyguard/storyguard.toml)
    /// 3. User config in current directory (./storyguard.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> StoryguardResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../storyguard.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/storyguard/storyguard.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("storyguard").required(false));

        builder
            .build()
            .map_err(|e| {
                StoryguardError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StoryguardError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}
