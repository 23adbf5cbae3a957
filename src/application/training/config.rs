//! Training scheduler configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Training scheduler settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Scoring worker count; `0` means one per CPU.
    #[serde(default)]
    pub workers: usize,
    /// Period of continuous training in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Historical data file used by continuous training.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
    /// Number of recent results kept for polling.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Seed mixed into every cycle's exploration noise.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Capture a screenshot when an agent first reaches Godmode.
    #[serde(default = "default_capture_godmode_screenshots")]
    pub capture_godmode_screenshots: bool,
}

const fn default_interval_secs() -> u64 {
    300
}

const fn default_history_limit() -> usize {
    64
}

const fn default_seed() -> u64 {
    0x5eed
}

const fn default_capture_godmode_screenshots() -> bool {
    true
}

impl TrainingConfig {
    /// Worker count with `0` resolved to the number of CPUs.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            interval_secs: default_interval_secs(),
            dataset: None,
            history_limit: default_history_limit(),
            seed: default_seed(),
            capture_godmode_screenshots: default_capture_godmode_screenshots(),
        }
    }
}
