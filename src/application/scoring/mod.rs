//! Scoring engine.
//!
//! Turns one agent's prior state plus a [`TrainingSample`] into a
//! commit-eligible [`AgentUpdate`]. Scoring is a pure function of its
//! inputs: exploration noise comes from an explicitly seeded RNG that the
//! caller derives per agent and per cycle.

pub mod config;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::domain::agent::{Agent, AgentStats, AgentUpdate};
use crate::domain::dataset::TrainingSample;
use crate::domain::id::AgentId;

pub use config::ScoringConfig;

/// Golden-ratio increment used to spread agent ids across seeds.
const SEED_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// A per-agent scoring failure. Never aborts a cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("malformed sample for agent {id}: {reason}")]
    MalformedSample { id: AgentId, reason: String },

    #[error("score for agent {id} is not a finite confidence")]
    NonFiniteScore { id: AgentId },

    #[error("profit/loss for agent {id} overflows")]
    ProfitOverflow { id: AgentId },
}

impl ScoringError {
    #[must_use]
    pub const fn agent(&self) -> AgentId {
        match self {
            Self::MalformedSample { id, .. }
            | Self::NonFiniteScore { id }
            | Self::ProfitOverflow { id } => *id,
        }
    }
}

/// Confidence/XP update rule.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    #[must_use]
    pub const fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Deterministic RNG for one agent in one cycle.
    #[must_use]
    pub fn agent_rng(cycle_seed: u64, id: AgentId) -> StdRng {
        StdRng::seed_from_u64(cycle_seed ^ u64::from(id.get()).wrapping_mul(SEED_SPREAD))
    }

    /// Fraction of the remaining distance to the target covered per cycle.
    ///
    /// Halves every `xp_half_life` experience points.
    #[must_use]
    pub fn step_size(&self, xp: u64) -> f64 {
        let half_life = self.config.xp_half_life.max(1) as f64;
        self.config.learning_rate / (1.0 + xp as f64 / half_life)
    }

    /// XP earned for a cycle with `trades` simulated trades.
    #[must_use]
    pub fn xp_gain(&self, trades: u32) -> u64 {
        self.config
            .base_xp
            .saturating_add(self.config.xp_per_trade.saturating_mul(u64::from(trades)))
    }

    /// Score one agent.
    ///
    /// Confidence moves toward the sample's win ratio by
    /// `step_size(xp) * (1 + noise)`, with `noise` drawn uniformly from
    /// `[-exploration, exploration]`. Since `learning_rate <= 0.5` and
    /// `exploration < 1` the move never overshoots, so repeated identical
    /// samples converge monotonically. A sample without trades leaves
    /// confidence unchanged but still earns the base XP.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::MalformedSample`] for inconsistent samples,
    /// [`ScoringError::ProfitOverflow`] when the running P&L leaves the
    /// decimal range and [`ScoringError::NonFiniteScore`] if the result is
    /// not a valid confidence.
    pub fn score<R: Rng>(
        &self,
        agent: &Agent,
        sample: &TrainingSample,
        rng: &mut R,
    ) -> Result<AgentUpdate, ScoringError> {
        let id = agent.id();
        sample
            .validate()
            .map_err(|reason| ScoringError::MalformedSample { id, reason })?;

        let current = agent.confidence();
        let exploration = self.config.exploration;
        let noise = if exploration > 0.0 {
            rng.gen_range(-exploration..=exploration)
        } else {
            0.0
        };
        let confidence = match sample.win_signal() {
            Some(target) => {
                let step = self.step_size(agent.xp()) * (1.0 + noise);
                (current + (target - current) * step).clamp(0.0, 1.0)
            }
            None => current,
        };

        let prior = agent.stats();
        let profit_loss = prior
            .profit_loss
            .checked_add(sample.profit_loss)
            .ok_or(ScoringError::ProfitOverflow { id })?;
        let stats = AgentStats {
            total_trades: prior.total_trades.saturating_add(u64::from(sample.trades)),
            wins: prior.wins.saturating_add(u64::from(sample.wins)),
            profit_loss,
        };
        let xp = agent.xp().saturating_add(self.xp_gain(sample.trades));

        AgentUpdate::new(id, confidence, xp, stats).ok_or(ScoringError::NonFiniteScore { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{EngineKind, Specialization, StrategyKind};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn agent(confidence: f64, xp: u64) -> Agent {
        Agent::new(
            AgentId::new(42),
            "bot-42",
            StrategyKind::Trend,
            Specialization::Technical,
            EngineKind::Custom,
            confidence,
            xp,
            AgentStats::default(),
        )
    }

    fn with_update(agent: &Agent, update: &AgentUpdate) -> Agent {
        let mut next = agent.clone();
        next.apply(update);
        next
    }

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig::default())
    }

    #[test]
    fn test_repeated_samples_converge_monotonically() {
        let engine = engine();
        let sample = TrainingSample::new(10, 9, dec!(120));
        let mut agent = agent(0.5, 0);
        let mut distance = (0.9 - agent.confidence()).abs();

        for cycle in 0..200 {
            let mut rng = ScoringEngine::agent_rng(cycle, agent.id());
            let update = engine.score(&agent, &sample, &mut rng).unwrap();
            agent = with_update(&agent, &update);
            let next = (0.9 - agent.confidence()).abs();
            assert!(next < distance, "cycle {cycle}: {next} >= {distance}");
            distance = next;
        }
        assert!(distance < 0.05);
    }

    #[test]
    fn test_convergence_from_above() {
        let engine = engine();
        let sample = TrainingSample::new(10, 2, dec!(-50));
        let mut agent = agent(0.99, 0);
        for cycle in 0..50 {
            let mut rng = ScoringEngine::agent_rng(cycle, agent.id());
            let before = agent.confidence();
            agent = with_update(&agent, &engine.score(&agent, &sample, &mut rng).unwrap());
            assert!(agent.confidence() < before);
            assert!(agent.confidence() > 0.2);
        }
    }

    #[test]
    fn test_output_stays_in_bounds() {
        let engine = ScoringEngine::new(ScoringConfig {
            learning_rate: 0.5,
            exploration: 0.99,
            ..ScoringConfig::default()
        });
        for (confidence, wins) in [(0.0, 0), (1.0, 10), (0.3, 10), (0.97, 0)] {
            let sample = TrainingSample::new(10, wins, dec!(0));
            for seed in 0..20 {
                let mut rng = ScoringEngine::agent_rng(seed, AgentId::new(1));
                let update = engine.score(&agent(confidence, 0), &sample, &mut rng).unwrap();
                assert!((0.0..=1.0).contains(&update.confidence()));
            }
        }
    }

    #[test]
    fn test_xp_grows_with_trades() {
        let engine = engine();
        let mut rng = ScoringEngine::agent_rng(0, AgentId::new(42));
        let update = engine
            .score(&agent(0.5, 1000), &TrainingSample::new(5, 3, dec!(10)), &mut rng)
            .unwrap();
        assert_eq!(update.xp(), 1000 + 50 + 2 * 5);
        assert_eq!(update.stats().total_trades, 5);
        assert_eq!(update.stats().profit_loss, dec!(10));
    }

    #[test]
    fn test_xp_saturates() {
        let engine = engine();
        let mut rng = ScoringEngine::agent_rng(0, AgentId::new(42));
        let update = engine
            .score(&agent(0.5, u64::MAX - 1), &TrainingSample::new(5, 3, dec!(0)), &mut rng)
            .unwrap();
        assert_eq!(update.xp(), u64::MAX);
    }

    #[test]
    fn test_step_size_shrinks_with_experience() {
        let engine = engine();
        assert!((engine.step_size(0) - 0.2).abs() < 1e-12);
        assert!((engine.step_size(2000) - 0.1).abs() < 1e-12);
        assert!(engine.step_size(10_000) < engine.step_size(2000));
    }

    #[test]
    fn test_sample_without_trades_keeps_confidence() {
        let engine = engine();
        let mut rng = ScoringEngine::agent_rng(3, AgentId::new(42));
        let update = engine
            .score(&agent(0.61, 10), &TrainingSample::new(0, 0, dec!(0)), &mut rng)
            .unwrap();
        assert_eq!(update.confidence(), 0.61);
        assert_eq!(update.xp(), 60);
    }

    #[test]
    fn test_malformed_sample_is_rejected() {
        let engine = engine();
        let mut rng = ScoringEngine::agent_rng(0, AgentId::new(42));
        let err = engine
            .score(&agent(0.5, 0), &TrainingSample::new(2, 5, dec!(0)), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ScoringError::MalformedSample { .. }));
        assert_eq!(err.agent(), AgentId::new(42));
    }

    #[test]
    fn test_profit_overflow_fails_only_this_agent() {
        let engine = engine();
        let mut rich = agent(0.5, 0);
        let sample = TrainingSample::new(3, 2, Decimal::MAX);
        let mut rng = ScoringEngine::agent_rng(0, rich.id());
        rich = with_update(&rich, &engine.score(&rich, &sample, &mut rng).unwrap());
        assert_eq!(rich.profit_loss(), Decimal::MAX);

        let err = engine.score(&rich, &sample, &mut rng).unwrap_err();

        assert_eq!(err, ScoringError::ProfitOverflow { id: AgentId::new(42) });
        assert_eq!(err.agent(), AgentId::new(42));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let engine = engine();
        let sample = TrainingSample::new(8, 5, dec!(33));
        let a = engine
            .score(&agent(0.7, 500), &sample, &mut ScoringEngine::agent_rng(9, AgentId::new(42)))
            .unwrap();
        let b = engine
            .score(&agent(0.7, 500), &sample, &mut ScoringEngine::agent_rng(9, AgentId::new(42)))
            .unwrap();
        assert_eq!(a, b);
    }
}
