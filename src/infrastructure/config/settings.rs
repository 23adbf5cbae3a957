//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all engine settings.
//! Configuration is loaded from a TOML file; every section is optional and
//! falls back to its defaults.
//!
//! # Example
//!
//! ```no_run
//! use armada::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::host::HostConfig;
use super::logging::LoggingConfig;
use crate::application::deployment::config::DeploymentConfig;
use crate::application::population::FleetConfig;
use crate::application::scoring::config::ScoringConfig;
use crate::application::training::config::TrainingConfig;
use crate::error::{ConfigError, Result};

/// Main engine configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fleet size and initial population.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Scoring curve parameters.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Training scheduler settings.
    #[serde(default)]
    pub training: TrainingConfig,

    /// Deployment channel timing and backoff.
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Deployment hosts connected by `armada run`.
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        let fleet = &self.fleet;
        if fleet.size == 0 {
            return Err(invalid("fleet.size", "must be greater than 0"));
        }
        if fleet.size > u32::MAX as usize {
            return Err(invalid("fleet.size", "must fit in a 32-bit agent id"));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&fleet.initial_confidence_min)
            || !unit.contains(&fleet.initial_confidence_max)
        {
            return Err(invalid(
                "fleet.initial_confidence",
                "bounds must be between 0 and 1",
            ));
        }
        if fleet.initial_confidence_min > fleet.initial_confidence_max {
            return Err(invalid(
                "fleet.initial_confidence_max",
                "must be >= initial_confidence_min",
            ));
        }

        let scoring = &self.scoring;
        let rate = scoring.learning_rate;
        if rate.is_nan() || rate <= 0.0 || rate > 0.5 {
            return Err(invalid("scoring.learning_rate", "must be in (0, 0.5]"));
        }
        if !(0.0..1.0).contains(&scoring.exploration) {
            return Err(invalid("scoring.exploration", "must be in [0, 1)"));
        }
        if scoring.xp_half_life == 0 {
            return Err(invalid("scoring.xp_half_life", "must be greater than 0"));
        }

        if self.training.interval_secs == 0 {
            return Err(invalid("training.interval_secs", "must be greater than 0"));
        }
        if self.training.history_limit == 0 {
            return Err(invalid("training.history_limit", "must be greater than 0"));
        }

        let deployment = &self.deployment;
        if deployment.health_check_interval_secs == 0 {
            return Err(invalid(
                "deployment.health_check_interval_secs",
                "must be greater than 0",
            ));
        }
        if deployment.request_timeout_ms == 0 {
            return Err(invalid(
                "deployment.request_timeout_ms",
                "must be greater than 0",
            ));
        }
        let backoff = &deployment.backoff;
        if backoff.max_attempts == 0 {
            return Err(invalid(
                "deployment.backoff.max_attempts",
                "must be greater than 0",
            ));
        }
        if backoff.max_delay_ms < backoff.initial_delay_ms {
            return Err(invalid(
                "deployment.backoff.max_delay_ms",
                "must be >= initial_delay_ms",
            ));
        }
        if backoff.multiplier.is_nan() || backoff.multiplier < 1.0 {
            return Err(invalid("deployment.backoff.multiplier", "must be >= 1.0"));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if host.id.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "hosts.id" }.into());
            }
            if !seen.insert(host.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "hosts.id",
                    reason: format!("duplicate host id `{}`", host.id),
                }
                .into());
            }
            if let Err(e) = url::Url::parse(&host.address) {
                return Err(ConfigError::InvalidValue {
                    field: "hosts.address",
                    reason: format!("`{}` is not a valid URL: {e}", host.address),
                }
                .into());
            }
            if host.max_capacity == 0 {
                return Err(invalid("hosts.max_capacity", "must be greater than 0"));
            }
        }

        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}
