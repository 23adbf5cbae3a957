//! Handler for the `run` command.

use std::sync::Arc;
use std::time::Duration;

use miette::IntoDiagnostic;

use super::command::RunArgs;
use super::diagnostic::{load_config, CheckFailed, TrainingFailed};
use super::output;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::health::{health_check, HealthStatus};
use crate::infrastructure::{bootstrap, runtime};

/// Execute the run command.
///
/// # Errors
///
/// Fails on an invalid configuration, a missing dataset, or a failure to
/// start continuous training.
pub async fn execute(args: &RunArgs) -> miette::Result<()> {
    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, args);
    config.init_logging();

    let report = health_check(&config);
    let failed = report
        .checks()
        .iter()
        .filter(|check| check.critical() && !check.is_healthy())
        .count();
    if failed > 0 {
        for check in report.checks().iter().filter(|c| !c.is_healthy()) {
            if let HealthStatus::Unhealthy(reason) = check.status() {
                output::error(&format!("{}: {reason}", check.name()));
            }
        }
        return Err(CheckFailed { count: failed }.into());
    }

    let source = bootstrap::dataset_source(&config, None).map_err(TrainingFailed::from)?;
    let interval = config.training.interval();
    let engine = Arc::new(bootstrap::build_engine(&config));

    if !args.json_logs {
        print_startup(&config, &source.describe(), interval);
    }

    runtime::run(engine, &config.hosts, source, interval)
        .await
        .into_diagnostic()
}

/// Fold command-line flags into the loaded configuration.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(dataset) = &args.dataset {
        config.training.dataset = Some(dataset.clone());
    }
    if let Some(interval) = args.interval.filter(|secs| *secs > 0) {
        config.training.interval_secs = interval;
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || output::is_json() {
        config.logging.format = "json".to_string();
    }
}

fn print_startup(config: &Config, dataset: &str, interval: Duration) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Fleet", config.fleet.size);
    output::field("Dataset", dataset);
    output::field("Interval", format!("{}s", interval.as_secs()));
    output::field("Hosts", config.hosts.len());
    if output::verbosity() > 0 {
        output::field("Workers", config.training.effective_workers());
        output::field("Seed", config.fleet.seed);
        for host in &config.hosts {
            output::field(
                "Host",
                format!("{} {} (capacity {})", host.id, host.address, host.max_capacity),
            );
        }
    }
    output::hint("press Ctrl-C to stop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: PathBuf::from("config.toml"),
            dataset: None,
            interval: None,
            json_logs: false,
            log_level: None,
        }
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = Config::default();
        let args = RunArgs {
            dataset: Some(PathBuf::from("eurusd.csv")),
            interval: Some(60),
            json_logs: true,
            log_level: Some("debug".into()),
            ..args()
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.training.dataset, Some(PathBuf::from("eurusd.csv")));
        assert_eq!(config.training.interval_secs, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_zero_interval_is_ignored() {
        let mut config = Config::default();
        let before = config.training.interval_secs;
        apply_overrides(
            &mut config,
            &RunArgs {
                interval: Some(0),
                ..args()
            },
        );
        assert_eq!(config.training.interval_secs, before);
    }
}
