//! Aggregate statistics over a fleet snapshot.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::agent::{Agent, AgentStatus};
use super::tier::Tier;

/// Fleet-wide counts and totals, computed from one committed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetStats {
    pub total_agents: usize,
    pub godmode: usize,
    pub elite: usize,
    pub learning: usize,
    pub idle: usize,
    pub training: usize,
    pub deployed: usize,
    pub errored: usize,
    pub total_xp: u64,
    pub average_confidence: f64,
    pub total_trades: u64,
    pub total_wins: u64,
    pub total_profit_loss: Decimal,
    /// Wins over trades across the whole fleet.
    pub overall_win_rate: f64,
    /// Mean of per-agent win rates.
    pub average_win_rate: f64,
    pub best_performer: Option<String>,
    pub screenshots_captured: u64,
    /// Registry version the numbers were taken from.
    pub version: u64,
}

impl FleetStats {
    /// Compute statistics over a slice of agents.
    ///
    /// `best` is the leaderboard leader, resolved by the caller so the
    /// ordering rule lives in one place.
    pub fn compute<'a, I>(agents: I, best: Option<&Agent>, version: u64) -> Self
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        let mut stats = Self {
            version,
            best_performer: best.map(|a| a.name().to_string()),
            ..Self::default()
        };
        let mut confidence_sum = 0.0;
        let mut win_rate_sum = 0.0;

        for agent in agents {
            stats.total_agents += 1;
            match agent.tier() {
                Tier::Godmode => stats.godmode += 1,
                Tier::Elite => stats.elite += 1,
                Tier::Learning => stats.learning += 1,
            }
            match agent.status() {
                AgentStatus::Idle => stats.idle += 1,
                AgentStatus::Training => stats.training += 1,
                AgentStatus::Deployed => stats.deployed += 1,
                AgentStatus::Error => stats.errored += 1,
            }
            stats.total_xp = stats.total_xp.saturating_add(agent.xp());
            stats.total_trades = stats.total_trades.saturating_add(agent.stats().total_trades);
            stats.total_wins = stats.total_wins.saturating_add(agent.stats().wins);
            stats.total_profit_loss = stats.total_profit_loss.saturating_add(agent.profit_loss());
            confidence_sum += agent.confidence();
            win_rate_sum += agent.win_rate();
        }

        if stats.total_agents > 0 {
            let n = stats.total_agents as f64;
            stats.average_confidence = confidence_sum / n;
            stats.average_win_rate = win_rate_sum / n;
        }
        if stats.total_trades > 0 {
            stats.overall_win_rate = stats.total_wins as f64 / stats.total_trades as f64;
        }
        stats
    }

    /// Count per tier, strongest first.
    #[must_use]
    pub fn tiers(&self) -> BTreeMap<Tier, usize> {
        BTreeMap::from([
            (Tier::Godmode, self.godmode),
            (Tier::Elite, self.elite),
            (Tier::Learning, self.learning),
        ])
    }
}
