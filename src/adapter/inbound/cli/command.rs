//! Command-line interface definitions.
//!
//! Defines the CLI structure for the armada binary using `clap`: a
//! long-running `run` loop, a one-shot `train` cycle and configuration
//! checks.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Training, ranking and deployment engine for agent fleets
#[derive(Parser, Debug)]
#[command(name = "armada")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect hosts and train continuously until Ctrl-C
    Run(RunArgs),

    /// Run a single training cycle and print the leaderboard
    Train(TrainArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `armada check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file and report readiness.
    Config(ConfigPathArg),
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for `armada run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Historical dataset (overrides training.dataset)
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Seconds between training cycles (overrides training.interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log level (overrides logging.level)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Arguments for `armada train`.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Historical dataset to train on
    #[arg(long)]
    pub dataset: PathBuf,

    /// Number of leaderboard rows to print
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}
