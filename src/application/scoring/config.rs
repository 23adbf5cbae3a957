//! Scoring engine configuration.

use serde::Deserialize;

/// Scoring curve parameters.
///
/// Each cycle moves confidence a fraction `step` of the way toward the
/// sample's win ratio, where
/// `step = learning_rate / (1 + xp / xp_half_life)`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Step size for an agent with no experience. Must be in `(0, 0.5]`.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// XP at which the step size has halved.
    #[serde(default = "default_xp_half_life")]
    pub xp_half_life: u64,
    /// XP granted for every cycle an agent is scored in.
    #[serde(default = "default_base_xp")]
    pub base_xp: u64,
    /// Additional XP per simulated trade.
    #[serde(default = "default_xp_per_trade")]
    pub xp_per_trade: u64,
    /// Relative jitter applied to each step, in `[0, 1)`.
    #[serde(default = "default_exploration")]
    pub exploration: f64,
}

const fn default_learning_rate() -> f64 {
    0.2
}

const fn default_xp_half_life() -> u64 {
    2000
}

const fn default_base_xp() -> u64 {
    50
}

const fn default_xp_per_trade() -> u64 {
    2
}

const fn default_exploration() -> f64 {
    0.1
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            xp_half_life: default_xp_half_life(),
            base_xp: default_base_xp(),
            xp_per_trade: default_xp_per_trade(),
            exploration: default_exploration(),
        }
    }
}
