//! Star Sentinel CLI
//!
//! Command-line front end for the fear fusion pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recorded sensor log through the live pipeline
//! star-sentinel run --replay session.jsonl --classifier-url http://localhost:8000/predict
//!
//! # Run the built-in calm / surge / scream scenario
//! star-sentinel simulate --seconds 90
//!
//! # Dump the default configuration
//! star-sentinel config > sentinel.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use star_sentinel_fusion::FusionConfig;

pub mod replay;
pub mod run;
pub mod simulate;

/// Star Sentinel Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "star-sentinel")]
#[command(author, version, about = "Heart-rate and audio fear detection with emergency alerts")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSON-lines sensor log through the pipeline
    Run(run::RunArgs),

    /// Run a synthetic calm, surge and scream scenario
    Simulate(simulate::SimulateArgs),

    /// Print the effective configuration as JSON
    Config(ConfigArgs),

    /// Display version information
    Version,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file to validate and print (defaults if omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Load a configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<FusionConfig> {
    match path {
        Some(path) => FusionConfig::from_json(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(FusionConfig::default()),
    }
}

/// Execute the config command
pub fn print_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate() {
        let cli = Cli::try_parse_from(["star-sentinel", "simulate", "--seconds", "30"]).unwrap();
        match cli.command {
            Commands::Simulate(args) => assert_eq!(args.seconds, 30),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_requires_replay_file() {
        assert!(Cli::try_parse_from(["star-sentinel", "run"]).is_err());
    }

    #[test]
    fn defaults_without_config_file() {
        assert_eq!(load_config(None).unwrap(), FusionConfig::default());
    }
}
