//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for agents, candles, datasets and
//! hosts so tests focus on assertions rather than construction boilerplate.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::agent::{Agent, AgentStats, EngineKind, Specialization, StrategyKind};
use crate::domain::dataset::{Candle, Dataset};
use crate::domain::host::HostSpec;
use crate::domain::id::AgentId;

/// Agent `id` with the given confidence and no history.
pub fn agent(id: u32, confidence: f64) -> Agent {
    agent_with(id, confidence, 0, Decimal::ZERO)
}

/// Agent `id` with explicit confidence, XP and profit/loss.
pub fn agent_with(id: u32, confidence: f64, xp: u64, profit_loss: Decimal) -> Agent {
    Agent::new(
        AgentId::new(id),
        format!("bot-{id}"),
        StrategyKind::ALL[id as usize % StrategyKind::ALL.len()],
        Specialization::Technical,
        EngineKind::Custom,
        confidence,
        xp,
        AgentStats {
            total_trades: 0,
            wins: 0,
            profit_loss,
        },
    )
}

/// Agents numbered from 1 with the given confidences.
pub fn agents(confidences: &[f64]) -> Vec<Agent> {
    confidences
        .iter()
        .zip(1..)
        .map(|(&c, id)| agent(id, c))
        .collect()
}

/// `len` fifteen-minute candles alternating up and down around 2000.
pub fn candles(len: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().unwrap_or_default();
    (0..len)
        .map(|i| {
            let base = 2000.0 + (i % 7) as f64;
            let (open, close) = if i % 2 == 0 {
                (base, base + 1.0)
            } else {
                (base + 1.0, base)
            };
            Candle {
                timestamp: start + Duration::minutes(i as i64 * 15),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: Some(100.0),
            }
        })
        .collect()
}

/// Dataset of `len` candles labelled `test`.
pub fn dataset(len: usize) -> Dataset {
    Dataset::new("test", candles(len))
}

/// Host spec `id` at a dummy address.
pub fn host(id: &str, max_capacity: usize) -> HostSpec {
    HostSpec::new(id, format!("http://{id}.test"), max_capacity)
}
