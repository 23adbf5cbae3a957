//! Initial fleet population.
//!
//! Agents are numbered `1..=size`. Descriptive attributes rotate through
//! their enumerations; learned values are drawn from a seeded RNG so the
//! same configuration always produces the same fleet.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::agent::{Agent, AgentStats, EngineKind, Specialization, StrategyKind};
use crate::domain::id::AgentId;

const NAME_PREFIXES: [&str; 5] = ["ProBot", "GoldHunter", "TradeMaster", "AI-Warrior", "GoldexBot"];
const NAME_SUFFIXES: [&str; 6] = ["Elite", "Pro", "Master", "X", "Alpha", "Prime"];

/// How the fleet is generated at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    /// Number of agents; fixed for the lifetime of the process.
    #[serde(default = "default_size")]
    pub size: usize,
    /// Seed for initial confidence, xp and statistics.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Lower bound of the initial confidence draw.
    #[serde(default = "default_initial_confidence_min")]
    pub initial_confidence_min: f64,
    /// Upper bound of the initial confidence draw.
    #[serde(default = "default_initial_confidence_max")]
    pub initial_confidence_max: f64,
}

const fn default_size() -> usize {
    5000
}

const fn default_seed() -> u64 {
    7
}

const fn default_initial_confidence_min() -> f64 {
    0.5
}

const fn default_initial_confidence_max() -> f64 {
    0.8
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            seed: default_seed(),
            initial_confidence_min: default_initial_confidence_min(),
            initial_confidence_max: default_initial_confidence_max(),
        }
    }
}

/// Fleet factory.
pub struct Fleet;

impl Fleet {
    /// Generate `config.size` agents.
    #[must_use]
    pub fn generate(config: &FleetConfig) -> Vec<Agent> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let (low, high) = (config.initial_confidence_min, config.initial_confidence_max);
        let count = u32::try_from(config.size).unwrap_or(u32::MAX);

        (1..=count)
            .map(|number| {
                let n = number as usize;
                let confidence = if high > low {
                    rng.gen_range(low..=high)
                } else {
                    low
                };
                let wins: u64 = rng.gen_range(50..=200);
                let losses: u64 = rng.gen_range(10..=50);
                let cents: i64 = rng.gen_range(50_000..=500_000);

                Agent::new(
                    AgentId::new(number),
                    agent_name(number),
                    StrategyKind::ALL[n % StrategyKind::ALL.len()],
                    Specialization::ALL[n % Specialization::ALL.len()],
                    EngineKind::ALL[n % EngineKind::ALL.len()],
                    confidence,
                    rng.gen_range(100..=500),
                    AgentStats {
                        total_trades: wins + losses,
                        wins,
                        profit_loss: Decimal::new(cents, 2),
                    },
                )
            })
            .collect()
    }
}

/// Display name for agent `number`, e.g. `GoldHunter-0001-Elite`.
#[must_use]
pub fn agent_name(number: u32) -> String {
    let n = number as usize;
    let prefix = NAME_PREFIXES[n % NAME_PREFIXES.len()];
    let suffix = NAME_SUFFIXES[(n / 100) % NAME_SUFFIXES.len()];
    format!("{prefix}-{number:04}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tier::classify;

    fn config(size: usize) -> FleetConfig {
        FleetConfig {
            size,
            ..FleetConfig::default()
        }
    }

    #[test]
    fn test_names_follow_numbering() {
        assert_eq!(agent_name(1), "GoldHunter-0001-Elite");
        assert_eq!(agent_name(5), "ProBot-0005-Elite");
        assert_eq!(agent_name(250), "ProBot-0250-Master");
        assert_eq!(agent_name(5000), "ProBot-5000-Master");
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(Fleet::generate(&config(50)), Fleet::generate(&config(50)));
    }

    #[test]
    fn test_generate_respects_bounds() {
        let agents = Fleet::generate(&config(200));
        assert_eq!(agents.len(), 200);
        assert_eq!(agents[0].id(), AgentId::new(1));
        for agent in &agents {
            assert!((0.5..=0.8).contains(&agent.confidence()));
            assert_eq!(agent.tier(), classify(agent.confidence()));
            assert!((100..=500).contains(&agent.xp()));
            assert!(agent.stats().wins <= agent.stats().total_trades);
        }
    }

    #[test]
    fn test_attributes_rotate() {
        let agents = Fleet::generate(&config(20));
        assert_eq!(agents[0].strategy(), StrategyKind::ALL[1]);
        assert_eq!(agents[9].strategy(), StrategyKind::ALL[0]);
        assert_eq!(agents[4].engine(), EngineKind::ALL[0]);
    }

    #[test]
    fn test_degenerate_confidence_range() {
        let agents = Fleet::generate(&FleetConfig {
            size: 3,
            initial_confidence_min: 0.9,
            initial_confidence_max: 0.9,
            ..FleetConfig::default()
        });
        assert!(agents.iter().all(|a| a.confidence() == 0.9));
    }
}
