//! Command-line adapter: argument parsing, output and command handlers.

pub mod check;
pub mod command;
pub mod diagnostic;
pub mod output;
pub mod run;
pub mod train;

use command::{CheckCommand, Cli, ColorChoice, Commands};
use output::OutputConfig;

/// Apply global flags and run the selected command.
///
/// # Errors
///
/// Returns the command's diagnostic on failure.
pub async fn dispatch(cli: Cli) -> miette::Result<()> {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Train(args) => train::execute(&args).await,
        Commands::Check(CheckCommand::Config(arg)) => check::execute_config(&arg),
    }
}
