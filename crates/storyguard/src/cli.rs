//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storyguard::commands::StrategyChoice;

/// Storyguard - parse, validate and repair LLM story turns
#[derive(Parser, Debug)]
#[command(name = "storyguard")]
#[command(about = "Parse, validate and repair LLM story turns", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file (defaults to bundled, home and ./storyguard.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a raw model reply and print its display text and fields
    Parse {
        /// File holding the raw reply
        file: PathBuf,
    },

    /// Check which expected entities a reply's narrative contains
    Validate {
        /// File holding the raw reply or plain narrative
        file: PathBuf,

        /// Expected entity (repeatable)
        #[arg(long = "entity", required = true)]
        entities: Vec<String>,

        /// Scene location
        #[arg(long)]
        location: Option<String>,

        /// Presence strategy
        #[arg(long, value_enum, default_value_t = StrategyChoice::Entity)]
        strategy: StrategyChoice,
    },

    /// Append sentences introducing missing entities
    Inject {
        /// File holding the raw reply or plain narrative
        file: PathBuf,

        /// Expected entity (repeatable)
        #[arg(long = "entity", required = true)]
        entities: Vec<String>,

        /// Scene location
        #[arg(long)]
        location: Option<String>,
    },

    /// Guard the world time in a state-update payload
    AdvanceTime {
        /// State updates as a JSON object
        #[arg(long)]
        state: String,

        /// Previous world time as a JSON object or ISO string
        #[arg(long)]
        previous: Option<String>,

        /// The player's input for this turn
        #[arg(long, default_value = "")]
        input: String,

        /// Time is player-controlled in god mode
        #[arg(long)]
        god_mode: bool,
    },
}
