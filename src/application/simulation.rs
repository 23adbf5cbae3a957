//! Strategy replay over historical candles.
//!
//! Each strategy looks at the bars up to `i` and decides to go long, go
//! short, or stay flat. A position opened at bar `i` is closed at bar
//! `i + 1`; the trade wins when the close moved in its direction.

use chrono::Timelike;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::domain::agent::{Agent, StrategyKind};
use crate::domain::dataset::{Candle, Dataset, TrainingSample};

/// Bars a strategy needs before it may trade.
const LOOKBACK: usize = 20;

/// Position size applied to price moves when computing P&L.
const LOT_SIZE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Self::Long
        } else if value < 0.0 {
            Self::Short
        } else {
            Self::Flat
        }
    }

    fn inverted(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
            Self::Flat => Self::Flat,
        }
    }

    const fn direction(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
            Self::Flat => 0.0,
        }
    }
}

/// Training sample for `agent` on `dataset`.
///
/// An explicit per-agent sample attached to the dataset wins over replay.
#[must_use]
pub fn sample_for(agent: &Agent, dataset: &Dataset) -> TrainingSample {
    if let Some(sample) = dataset.sample_override(agent.id()) {
        return sample.clone();
    }
    replay(agent, dataset.candles())
}

/// Replay the agent's strategy over `candles`.
#[must_use]
pub fn replay(agent: &Agent, candles: &[Candle]) -> TrainingSample {
    let mut trades = 0u32;
    let mut wins = 0u32;
    let mut pnl = 0.0;

    if candles.len() > LOOKBACK {
        for i in LOOKBACK..candles.len() - 1 {
            let signal = decide(agent, &candles[..=i], i);
            if signal == Signal::Flat {
                continue;
            }
            let outcome = signal.direction() * (candles[i + 1].close - candles[i].close) * LOT_SIZE;
            trades = trades.saturating_add(1);
            if outcome > 0.0 {
                wins = wins.saturating_add(1);
            }
            pnl += outcome;
        }
    }

    let profit_loss = Decimal::from_f64(pnl).unwrap_or_default().round_dp(2);
    TrainingSample::new(trades, wins, profit_loss)
}

/// `history` ends with the bar being traded.
fn decide(agent: &Agent, history: &[Candle], bar: usize) -> Signal {
    let n = history.len();
    let last = &history[n - 1];
    match agent.strategy() {
        StrategyKind::Scalping => Signal::from_sign(last.body()),
        StrategyKind::Swing => {
            if bar % 4 == 0 {
                Signal::from_sign(last.close - history[n - 5].close)
            } else {
                Signal::Flat
            }
        }
        StrategyKind::News => {
            if last.range() > 2.0 * average_range(&history[n - 11..n - 1]) {
                Signal::from_sign(last.body())
            } else {
                Signal::Flat
            }
        }
        StrategyKind::Breakout => {
            let window = &history[n - 11..n - 1];
            let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            if last.close > high {
                Signal::Long
            } else if last.close < low {
                Signal::Short
            } else {
                Signal::Flat
            }
        }
        StrategyKind::SupportResistance => {
            let window = &history[n - LOOKBACK..n];
            let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let band = (high - low) * 0.1;
            if last.close <= low + band {
                Signal::Long
            } else if last.close >= high - band {
                Signal::Short
            } else {
                Signal::Flat
            }
        }
        StrategyKind::Trend => Signal::from_sign(
            average_close(&history[n - 5..]) - average_close(&history[n - LOOKBACK..]),
        ),
        StrategyKind::CounterTrend => {
            Signal::from_sign(last.close - history[n - 4].close).inverted()
        }
        StrategyKind::Volatility => {
            if last.range() > average_range(&history[n - LOOKBACK..n - 1]) {
                Signal::from_sign(last.body())
            } else {
                Signal::Flat
            }
        }
        StrategyKind::Session => {
            let (start, end) = agent.specialization().session_hours();
            let hour = last.timestamp.hour();
            if (start..end).contains(&hour) {
                Signal::from_sign(last.body())
            } else {
                Signal::Flat
            }
        }
        StrategyKind::Experimental => {
            let signal = Signal::from_sign(last.body());
            if (agent.id().get() as usize + bar) % 3 == 0 {
                signal.inverted()
            } else {
                signal
            }
        }
    }
}

fn average_range(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(Candle::range).sum::<f64>() / candles.len() as f64
}

fn average_close(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(|c| c.close).sum::<f64>() / candles.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentStats, EngineKind, Specialization};
    use crate::domain::id::AgentId;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn agent(strategy: StrategyKind) -> Agent {
        Agent::new(
            AgentId::new(7),
            "bot-7",
            strategy,
            Specialization::Technical,
            EngineKind::Gradient,
            0.6,
            0,
            AgentStats::default(),
        )
    }

    /// Steadily rising market: every bar closes one point above its open.
    fn uptrend(len: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                let open = 2000.0 + i as f64;
                Candle {
                    timestamp: start + Duration::minutes(i as i64 * 15),
                    open,
                    high: open + 1.5,
                    low: open - 0.5,
                    close: open + 1.0,
                    volume: None,
                }
            })
            .collect()
    }

    #[test]
    fn test_short_history_produces_no_trades() {
        let sample = replay(&agent(StrategyKind::Scalping), &uptrend(LOOKBACK));
        assert_eq!(sample, TrainingSample::new(0, 0, dec!(0)));
    }

    #[test]
    fn test_momentum_wins_in_uptrend() {
        let sample = replay(&agent(StrategyKind::Scalping), &uptrend(60));
        assert_eq!(sample.trades, 39);
        assert_eq!(sample.wins, 39);
        assert_eq!(sample.profit_loss, dec!(39));
    }

    #[test]
    fn test_counter_trend_loses_in_uptrend() {
        let sample = replay(&agent(StrategyKind::CounterTrend), &uptrend(60));
        assert!(sample.trades > 0);
        assert_eq!(sample.wins, 0);
        assert!(sample.profit_loss < Decimal::ZERO);
    }

    #[test]
    fn test_every_strategy_yields_a_valid_sample() {
        let candles = uptrend(80);
        for strategy in StrategyKind::ALL {
            let sample = replay(&agent(strategy), &candles);
            assert!(sample.validate().is_ok(), "{strategy}");
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let agent = agent(StrategyKind::Trend);
        let dataset = Dataset::new("t", uptrend(60))
            .with_sample(agent.id(), TrainingSample::new(3, 1, dec!(-5)));
        assert_eq!(sample_for(&agent, &dataset), TrainingSample::new(3, 1, dec!(-5)));
    }
}
