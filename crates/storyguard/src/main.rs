//! Storyguard CLI binary.
//!
//! This binary exposes the turn pipeline stages for inspection:
//! - Parse raw model replies
//! - Validate and repair entity presence
//! - Guard the story clock

use clap::Parser;
use storyguard::{ObservabilityConfig, StoryguardConfig, commands, init_observability_with_config};

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands};

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    init_observability_with_config(
        ObservabilityConfig::new("storyguard")
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs),
    )?;

    let config = match &cli.config {
        Some(path) => StoryguardConfig::from_file(path)?,
        None => StoryguardConfig::load()?,
    };

    let output = match cli.command {
        Commands::Parse { file } => commands::parse_command(&std::fs::read_to_string(file)?)?,

        Commands::Validate {
            file,
            entities,
            location,
            strategy,
        } => commands::validate_command(
            &std::fs::read_to_string(file)?,
            &entities,
            location.as_deref(),
            strategy,
            &config,
        )?,

        Commands::Inject {
            file,
            entities,
            location,
        } => commands::inject_command(
            &std::fs::read_to_string(file)?,
            &entities,
            location.as_deref(),
            &config,
        )?,

        Commands::AdvanceTime {
            state,
            previous,
            input,
            god_mode,
        } => commands::advance_time_command(&state, previous.as_deref(), &input, god_mode)?,
    };

    println!("{output}");
    Ok(())
}
