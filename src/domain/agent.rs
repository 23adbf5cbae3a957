//! Agents: simulated trading bots and their lifecycle state.
//!
//! An [`Agent`] carries descriptive data fixed at creation, a learned
//! confidence/XP pair, simulation statistics, and a status governed by the
//! [`AgentStatus`] state machine. Its [`Tier`] is always derived from
//! confidence and is refreshed by every mutation that touches confidence.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::DomainError;
use super::id::{AgentId, HostId};
use super::tier::{classify, Tier};

/// Trading strategy an agent simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Scalping,
    Swing,
    News,
    Breakout,
    SupportResistance,
    Trend,
    CounterTrend,
    Volatility,
    Session,
    Experimental,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 10] = [
        Self::Scalping,
        Self::Swing,
        Self::News,
        Self::Breakout,
        Self::SupportResistance,
        Self::Trend,
        Self::CounterTrend,
        Self::Volatility,
        Self::Session,
        Self::Experimental,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scalping => "Ultra Aggressive Scalping",
            Self::Swing => "Conservative Swing Trading",
            Self::News => "News Trading Specialist",
            Self::Breakout => "Technical Breakout Hunter",
            Self::SupportResistance => "Support/Resistance Master",
            Self::Trend => "Trend Following",
            Self::CounterTrend => "Counter-Trend Specialist",
            Self::Volatility => "Volatility Trader",
            Self::Session => "Session-Specific Strategy",
            Self::Experimental => "Experimental Model",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Market session or skill an agent focuses on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Tokyo,
    London,
    NewYork,
    Overlap,
    News,
    Technical,
    Sentiment,
    Risk,
    Scalp,
    Swing,
}

impl Specialization {
    pub const ALL: [Specialization; 10] = [
        Self::Tokyo,
        Self::London,
        Self::NewYork,
        Self::Overlap,
        Self::News,
        Self::Technical,
        Self::Sentiment,
        Self::Risk,
        Self::Scalp,
        Self::Swing,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tokyo => "Tokyo Session",
            Self::London => "London Session",
            Self::NewYork => "New York Session",
            Self::Overlap => "London/NY Overlap",
            Self::News => "News Events",
            Self::Technical => "Technical Analysis",
            Self::Sentiment => "Market Sentiment",
            Self::Risk => "Risk Management",
            Self::Scalp => "Scalping",
            Self::Swing => "Swing Trading",
        }
    }

    /// UTC hour window `[start, end)` this specialization trades in.
    ///
    /// Specializations that are not session-bound trade around the clock.
    #[must_use]
    pub const fn session_hours(self) -> (u32, u32) {
        match self {
            Self::Tokyo => (0, 9),
            Self::London => (7, 16),
            Self::NewYork => (12, 21),
            Self::Overlap => (12, 16),
            _ => (0, 24),
        }
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decision engine backing an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Gradient,
    Transformer,
    Ensemble,
    Custom,
    Hybrid,
}

impl EngineKind {
    pub const ALL: [EngineKind; 5] = [
        Self::Gradient,
        Self::Transformer,
        Self::Ensemble,
        Self::Custom,
        Self::Hybrid,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gradient => "Gradient Boosting",
            Self::Transformer => "Transformer",
            Self::Ensemble => "Ensemble",
            Self::Custom => "Custom Neural Net",
            Self::Hybrid => "Hybrid",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of an agent.
///
/// ```text
/// Idle ──> Training ──> Idle
///  │  └──> Deployed ──> Idle
///  └─────> Error ─────> Idle        (Training -> Error also allowed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Training,
    Deployed,
    Error,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [Self::Idle, Self::Training, Self::Deployed, Self::Error];

    /// Whether moving from `self` to `to` is a legal transition.
    #[must_use]
    pub const fn can_transition(self, to: AgentStatus) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Training)
                | (Self::Idle, Self::Deployed)
                | (Self::Idle, Self::Error)
                | (Self::Training, Self::Idle)
                | (Self::Training, Self::Error)
                | (Self::Deployed, Self::Idle)
                | (Self::Error, Self::Idle)
        )
    }

    /// Validate a transition, returning the target status.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] when the move is illegal.
    pub fn transition(self, to: AgentStatus) -> Result<AgentStatus, DomainError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition { from: self, to })
        }
    }
}

/// Letter grade combining confidence, win rate and profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PerformanceGrade {
    C,
    CPlus,
    B,
    BPlus,
    A,
    APlus,
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::C => "C",
            Self::CPlus => "C+",
            Self::B => "B",
            Self::BPlus => "B+",
            Self::A => "A",
            Self::APlus => "A+",
        };
        f.write_str(label)
    }
}

/// Simulation-derived trading statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// Lifetime number of simulated trades.
    pub total_trades: u64,
    /// Lifetime number of winning trades (`<= total_trades`).
    pub wins: u64,
    /// Lifetime simulated profit or loss.
    pub profit_loss: Decimal,
}

impl AgentStats {
    /// Fraction of winning trades in `0.0..=1.0`; zero without trades.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.wins.min(self.total_trades) as f64 / self.total_trades as f64
    }
}

/// A fully computed, commit-eligible change to one agent.
///
/// Only constructible with a finite confidence inside `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentUpdate {
    id: AgentId,
    confidence: f64,
    xp: u64,
    stats: AgentStats,
}

impl AgentUpdate {
    /// Build an update, rejecting confidence outside `[0, 1]` or non-finite.
    #[must_use]
    pub fn new(id: AgentId, confidence: f64, xp: u64, stats: AgentStats) -> Option<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return None;
        }
        Some(Self {
            id,
            confidence,
            xp,
            stats,
        })
    }

    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub const fn xp(&self) -> u64 {
        self.xp
    }

    #[must_use]
    pub const fn stats(&self) -> &AgentStats {
        &self.stats
    }
}

/// One simulated trading bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    id: AgentId,
    name: String,
    strategy: StrategyKind,
    specialization: Specialization,
    engine: EngineKind,
    confidence: f64,
    xp: u64,
    stats: AgentStats,
    tier: Tier,
    status: AgentStatus,
    deployed_host: Option<HostId>,
}

impl Agent {
    /// Create an idle agent. Confidence is clamped into `[0, 1]`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        strategy: StrategyKind,
        specialization: Specialization,
        engine: EngineKind,
        confidence: f64,
        xp: u64,
        stats: AgentStats,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id,
            name: name.into(),
            strategy,
            specialization,
            engine,
            confidence,
            xp,
            stats,
            tier: classify(confidence),
            status: AgentStatus::Idle,
            deployed_host: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    #[must_use]
    pub const fn specialization(&self) -> Specialization {
        self.specialization
    }

    #[must_use]
    pub const fn engine(&self) -> EngineKind {
        self.engine
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub const fn xp(&self) -> u64 {
        self.xp
    }

    #[must_use]
    pub const fn stats(&self) -> &AgentStats {
        &self.stats
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        self.stats.win_rate()
    }

    #[must_use]
    pub const fn profit_loss(&self) -> Decimal {
        self.stats.profit_loss
    }

    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    #[must_use]
    pub const fn deployed_host(&self) -> Option<&HostId> {
        self.deployed_host.as_ref()
    }

    /// Grade from `0.4 * confidence + 0.3 * win rate + 0.3 * min(P&L / 1000, 1)`.
    #[must_use]
    pub fn performance_grade(&self) -> PerformanceGrade {
        let profit = (self.stats.profit_loss / Decimal::ONE_THOUSAND)
            .to_f64()
            .unwrap_or(0.0)
            .min(1.0);
        let score = self.confidence * 0.4 + self.win_rate() * 0.3 + profit * 0.3;
        match score {
            s if s >= 0.9 => PerformanceGrade::APlus,
            s if s >= 0.8 => PerformanceGrade::A,
            s if s >= 0.7 => PerformanceGrade::BPlus,
            s if s >= 0.6 => PerformanceGrade::B,
            s if s >= 0.5 => PerformanceGrade::CPlus,
            _ => PerformanceGrade::C,
        }
    }

    /// Apply a scored update. The tier is re-derived from the new confidence.
    pub(crate) fn apply(&mut self, update: &AgentUpdate) {
        self.confidence = update.confidence;
        self.xp = self.xp.max(update.xp);
        self.stats = update.stats.clone();
        self.tier = classify(self.confidence);
    }

    pub(crate) fn set_status(&mut self, status: AgentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition(status)?;
        Ok(())
    }

    pub(crate) fn deploy_to(&mut self, host: HostId) -> Result<(), DomainError> {
        self.status = self.status.transition(AgentStatus::Deployed)?;
        self.deployed_host = Some(host);
        Ok(())
    }

    pub(crate) fn release(&mut self) -> Result<HostId, DomainError> {
        let host = self
            .deployed_host
            .take()
            .ok_or(DomainError::AgentNotDeployed { id: self.id })?;
        self.status = AgentStatus::Idle;
        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn agent(confidence: f64) -> Agent {
        Agent::new(
            AgentId::new(1),
            "ProBot-0001-Elite",
            StrategyKind::Trend,
            Specialization::London,
            EngineKind::Hybrid,
            confidence,
            100,
            AgentStats::default(),
        )
    }

    #[test]
    fn new_agent_clamps_confidence_and_derives_tier() {
        assert_eq!(agent(1.7).confidence(), 1.0);
        assert_eq!(agent(1.7).tier(), Tier::Godmode);
        assert_eq!(agent(-0.2).confidence(), 0.0);
        assert_eq!(agent(f64::NAN).confidence(), 0.0);
        assert_eq!(agent(0.85).tier(), Tier::Elite);
    }

    #[test]
    fn status_machine_rejects_illegal_moves() {
        assert!(AgentStatus::Idle.can_transition(AgentStatus::Training));
        assert!(AgentStatus::Error.can_transition(AgentStatus::Idle));
        assert!(!AgentStatus::Idle.can_transition(AgentStatus::Idle));
        assert!(!AgentStatus::Training.can_transition(AgentStatus::Deployed));
        assert!(!AgentStatus::Error.can_transition(AgentStatus::Training));
        assert_eq!(
            AgentStatus::Deployed.transition(AgentStatus::Training),
            Err(DomainError::InvalidTransition {
                from: AgentStatus::Deployed,
                to: AgentStatus::Training,
            })
        );
    }

    #[test]
    fn apply_rederives_tier_and_keeps_xp_monotonic() {
        let mut a = agent(0.5);
        let update = AgentUpdate::new(a.id(), 0.96, 50, AgentStats::default()).unwrap();
        a.apply(&update);
        assert_eq!(a.tier(), Tier::Godmode);
        assert_eq!(a.xp(), 100);
    }

    #[test]
    fn update_rejects_out_of_range_confidence() {
        assert!(AgentUpdate::new(AgentId::new(1), 1.01, 0, AgentStats::default()).is_none());
        assert!(AgentUpdate::new(AgentId::new(1), f64::NAN, 0, AgentStats::default()).is_none());
        assert!(AgentUpdate::new(AgentId::new(1), 0.0, 0, AgentStats::default()).is_some());
    }

    #[test]
    fn deploy_and_release_track_host() {
        let mut a = agent(0.5);
        a.deploy_to(HostId::new("vps-1")).unwrap();
        assert_eq!(a.status(), AgentStatus::Deployed);
        assert_eq!(a.deployed_host(), Some(&HostId::new("vps-1")));

        assert_eq!(a.release().unwrap(), HostId::new("vps-1"));
        assert_eq!(a.status(), AgentStatus::Idle);
        assert!(a.deployed_host().is_none());
        assert!(a.release().is_err());
    }

    #[test]
    fn win_rate_handles_zero_trades() {
        let stats = AgentStats::default();
        assert_eq!(stats.win_rate(), 0.0);
        let stats = AgentStats {
            total_trades: 4,
            wins: 3,
            profit_loss: dec!(10),
        };
        assert!((stats.win_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn performance_grade_rewards_strong_agents() {
        let mut a = agent(0.99);
        let update = AgentUpdate::new(
            a.id(),
            0.99,
            100,
            AgentStats {
                total_trades: 10,
                wins: 9,
                profit_loss: dec!(2500),
            },
        )
        .unwrap();
        a.apply(&update);
        assert_eq!(a.performance_grade(), PerformanceGrade::APlus);
        assert_eq!(agent(0.1).performance_grade(), PerformanceGrade::C);
    }
}
