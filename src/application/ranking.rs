//! Ranking service: leaderboard over the last committed snapshot.
//!
//! The sorted order is cached per registry version and rebuilt lazily the
//! first time it is requested after a commit.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::registry::{AgentRegistry, FleetSnapshot};
use crate::domain::agent::Agent;

/// Sorted view of one snapshot.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    version: u64,
    ranked: Arc<[Arc<Agent>]>,
}

impl Leaderboard {
    /// Sort a snapshot by leaderboard order.
    #[must_use]
    pub fn build(snapshot: &FleetSnapshot) -> Self {
        let mut ranked = snapshot.agents().to_vec();
        ranked.sort_by(|a, b| leaderboard_order(a, b));
        Self {
            version: snapshot.version(),
            ranked: ranked.into(),
        }
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The best `n` agents; the whole fleet if `n` exceeds its size.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<Arc<Agent>> {
        self.ranked.iter().take(n).cloned().collect()
    }

    #[must_use]
    pub fn leader(&self) -> Option<&Arc<Agent>> {
        self.ranked.first()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.ranked.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Confidence descending, then profit/loss descending, then id ascending.
#[must_use]
pub fn leaderboard_order(a: &Agent, b: &Agent) -> Ordering {
    b.confidence()
        .total_cmp(&a.confidence())
        .then_with(|| b.profit_loss().cmp(&a.profit_loss()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Leaderboard queries with a per-version cache.
pub struct RankingService {
    registry: Arc<AgentRegistry>,
    cache: RwLock<Option<Arc<Leaderboard>>>,
}

impl RankingService {
    #[must_use]
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(None),
        }
    }

    /// Leaderboard for the current committed snapshot.
    #[must_use]
    pub fn leaderboard(&self) -> Arc<Leaderboard> {
        let snapshot = self.registry.snapshot();
        if let Some(cached) = self.cache.read().as_ref() {
            if cached.version == snapshot.version() {
                return Arc::clone(cached);
            }
        }

        let built = Arc::new(Leaderboard::build(&snapshot));
        trace!(version = built.version, "Leaderboard rebuilt");
        let mut cache = self.cache.write();
        match cache.as_ref() {
            Some(existing) if existing.version > built.version => {}
            _ => *cache = Some(Arc::clone(&built)),
        }
        built
    }

    /// The best `n` agents in leaderboard order.
    #[must_use]
    pub fn top_performers(&self, n: usize) -> Vec<Arc<Agent>> {
        self.leaderboard().top(n)
    }

    /// Version of the cached leaderboard, if one has been built.
    #[must_use]
    pub fn cached_version(&self) -> Option<u64> {
        self.cache.read().as_ref().map(|l| l.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentStats, AgentUpdate, EngineKind, Specialization, StrategyKind};
    use crate::domain::id::AgentId;
    use crate::domain::tier::Tier;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn agent(id: u32, confidence: f64, pnl: Decimal) -> Agent {
        Agent::new(
            AgentId::new(id),
            format!("bot-{id}"),
            StrategyKind::Trend,
            Specialization::Technical,
            EngineKind::Custom,
            confidence,
            0,
            AgentStats {
                total_trades: 0,
                wins: 0,
                profit_loss: pnl,
            },
        )
    }

    fn ids(agents: &[Arc<Agent>]) -> Vec<u32> {
        agents.iter().map(|a| a.id().get()).collect()
    }

    #[test]
    fn test_top_performers_scenario() {
        let registry = Arc::new(AgentRegistry::new(vec![
            agent(1, 0.50, dec!(0)),
            agent(2, 0.96, dec!(0)),
            agent(3, 0.82, dec!(0)),
        ]));
        let ranking = RankingService::new(registry);

        let top = ranking.top_performers(2);
        assert_eq!(ids(&top), vec![2, 3]);
        assert_eq!(top[0].tier(), Tier::Godmode);
        assert_eq!(top[1].tier(), Tier::Elite);
    }

    #[test]
    fn test_ties_break_on_profit_then_id() {
        let registry = Arc::new(AgentRegistry::new(vec![
            agent(4, 0.7, dec!(10)),
            agent(2, 0.7, dec!(10)),
            agent(3, 0.7, dec!(99)),
            agent(1, 0.6, dec!(500)),
        ]));
        let ranking = RankingService::new(registry);
        assert_eq!(ids(&ranking.top_performers(10)), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_top_n_is_prefix_of_top_n_plus_one() {
        let agents = (1..=40)
            .map(|i| agent(i, f64::from(i % 7) / 7.0, Decimal::from(i % 3)))
            .collect();
        let ranking = RankingService::new(Arc::new(AgentRegistry::new(agents)));
        for n in 0..40 {
            let shorter = ids(&ranking.top_performers(n));
            let longer = ids(&ranking.top_performers(n + 1));
            assert_eq!(shorter[..], longer[..n]);
        }
    }

    #[test]
    fn test_cache_invalidated_by_commit() {
        let registry = Arc::new(AgentRegistry::new(vec![
            agent(1, 0.50, dec!(0)),
            agent(2, 0.60, dec!(0)),
        ]));
        let ranking = RankingService::new(Arc::clone(&registry));
        assert_eq!(ids(&ranking.top_performers(1)), vec![2]);
        assert_eq!(ranking.cached_version(), Some(0));

        let first = ranking.leaderboard();
        assert!(Arc::ptr_eq(&first, &ranking.leaderboard()));

        let update = AgentUpdate::new(AgentId::new(1), 0.99, 10, AgentStats::default()).unwrap();
        registry.apply_batch(&[update]);

        assert_eq!(ids(&ranking.top_performers(1)), vec![1]);
        assert_eq!(ranking.cached_version(), Some(1));
    }

    #[test]
    fn test_n_larger_than_fleet() {
        let registry = Arc::new(AgentRegistry::new(vec![agent(1, 0.5, dec!(0))]));
        let ranking = RankingService::new(registry);
        assert_eq!(ranking.top_performers(5000).len(), 1);
    }
}
