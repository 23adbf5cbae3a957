//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::application::deployment::config::{BackoffConfig, DeploymentConfig};
use crate::application::population::FleetConfig;
use crate::application::scoring::config::ScoringConfig;
use crate::application::training::config::TrainingConfig;

/// Backoff with the production schedule: 1s, 2s, 4s, 8s, 16s.
///
/// Pair with `#[tokio::test(start_paused = true)]`.
pub fn backoff() -> BackoffConfig {
    BackoffConfig::default()
}

/// Zero-delay backoff - no waiting in tests.
pub fn fast_backoff(max_attempts: u32) -> BackoffConfig {
    BackoffConfig {
        initial_delay_ms: 0,
        max_delay_ms: 0,
        multiplier: 1.0,
        max_attempts,
    }
}

/// Deployment config using `backoff`, a 30s health check and 5s timeout.
pub fn deployment(backoff: BackoffConfig) -> DeploymentConfig {
    DeploymentConfig {
        health_check_interval_secs: 30,
        request_timeout_ms: 5000,
        backoff,
    }
}

/// Fleet of `size` agents with the default seed.
pub fn fleet(size: usize) -> FleetConfig {
    FleetConfig {
        size,
        ..FleetConfig::default()
    }
}

/// Scoring without exploration noise, so outcomes are easy to predict.
pub fn scoring() -> ScoringConfig {
    ScoringConfig {
        exploration: 0.0,
        ..ScoringConfig::default()
    }
}

/// Two workers, short history, screenshots on.
pub fn training() -> TrainingConfig {
    TrainingConfig {
        workers: 2,
        history_limit: 4,
        ..TrainingConfig::default()
    }
}
