//! Handler for `armada check config`.

use serde_json::json;

use super::command::ConfigPathArg;
use super::diagnostic::{load_config, CheckFailed};
use super::output;
use crate::infrastructure::health::{health_check, HealthStatus};

/// Validate the configuration and report whether it is ready to run.
///
/// # Errors
///
/// Fails with a source-annotated diagnostic when the file is invalid, or
/// with [`CheckFailed`] when a critical readiness check fails.
pub fn execute_config(arg: &ConfigPathArg) -> miette::Result<()> {
    let config = load_config(&arg.config)?;
    let report = health_check(&config);
    let failed = report
        .checks()
        .iter()
        .filter(|check| check.critical() && !check.is_healthy())
        .count();

    if output::is_json() {
        let checks: Vec<_> = report
            .checks()
            .iter()
            .map(|check| {
                let reason = match check.status() {
                    HealthStatus::Healthy => None,
                    HealthStatus::Unhealthy(reason) => Some(reason.as_str()),
                };
                json!({
                    "name": check.name(),
                    "critical": check.critical(),
                    "healthy": check.is_healthy(),
                    "reason": reason,
                })
            })
            .collect();
        output::json_output(json!({
            "config": arg.config.display().to_string(),
            "valid": true,
            "ready": report.is_healthy(),
            "fleet_size": config.fleet.size,
            "hosts": config.hosts.len(),
            "checks": checks,
        }));
    } else {
        output::header(env!("CARGO_PKG_VERSION"));
        output::field("Config", arg.config.display());
        output::field("Fleet", config.fleet.size);
        output::field("Seed", config.fleet.seed);
        output::field("Interval", format!("{}s", config.training.interval_secs));
        output::field("Workers", config.training.effective_workers());
        output::field("Hosts", config.hosts.len());
        if output::verbosity() > 0 {
            output::field("Learning rate", config.scoring.learning_rate);
            output::field(
                "Backoff",
                format!(
                    "{} attempts, {}ms..{}ms",
                    config.deployment.backoff.max_attempts,
                    config.deployment.backoff.initial_delay_ms,
                    config.deployment.backoff.max_delay_ms
                ),
            );
        }

        output::section("Checks");
        for check in report.checks() {
            match check.status() {
                HealthStatus::Healthy => output::success(check.name()),
                HealthStatus::Unhealthy(reason) if check.critical() => {
                    output::error(&format!("{}: {reason}", check.name()));
                }
                HealthStatus::Unhealthy(reason) => {
                    output::warning(&format!("{}: {reason}", check.name()));
                }
            }
        }
    }

    if failed > 0 {
        return Err(CheckFailed { count: failed }.into());
    }
    if !output::is_json() {
        output::section("Result");
        output::success("configuration is valid and ready to run");
    }
    Ok(())
}
