//! Deployment channel and backoff configuration.

use std::time::Duration;

use serde::Deserialize;

/// Exponential backoff for host connects and failed health checks.
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Attempts before the host settles in `Error`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

const fn default_initial_delay_ms() -> u64 {
    1000 // 1 second
}

const fn default_max_delay_ms() -> u64 {
    30_000 // 30 seconds
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_attempts() -> u32 {
    5
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl BackoffConfig {
    /// Delay before retry `attempt` (zero-based).
    ///
    /// `initial_delay_ms * multiplier^attempt`, capped at `max_delay_ms`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Every delay a full run of failed attempts waits, in order.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts).map(|attempt| self.delay(attempt)).collect()
    }
}

/// Deployment channel settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Seconds between health checks of a connected host.
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
    /// Timeout for a single connect or ping request (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

const fn default_health_check_interval_secs() -> u64 {
    30
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

impl DeploymentConfig {
    #[must_use]
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: default_health_check_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            backoff: BackoffConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = BackoffConfig::default();
        let secs: Vec<u64> = (0..7).map(|a| backoff.delay(a).as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn test_schedule_has_one_delay_per_attempt() {
        let backoff = BackoffConfig::default();
        assert_eq!(
            backoff.schedule(),
            [1, 2, 4, 8, 16].map(Duration::from_secs).to_vec()
        );
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let backoff = BackoffConfig::default();
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(30));
    }
}
