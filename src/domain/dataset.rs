//! Imported market data and the per-agent training samples derived from it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::AgentId;

/// Gap between consecutive candles that counts against data quality.
const QUALITY_GAP_SECS: i64 = 2 * 3600;

/// One OHLC bar of historical market data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// Whether the bar is internally consistent.
    ///
    /// Requires finite prices, `high >= low`, and the open and close to sit
    /// inside the high/low range.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite())
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }

    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[must_use]
    pub fn body(&self) -> f64 {
        self.close - self.open
    }
}

/// Outcome of replaying one agent's strategy over a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Number of simulated trades.
    pub trades: u32,
    /// Number of those trades that made money.
    pub wins: u32,
    /// Net simulated profit or loss.
    pub profit_loss: Decimal,
}

impl TrainingSample {
    #[must_use]
    pub fn new(trades: u32, wins: u32, profit_loss: Decimal) -> Self {
        Self {
            trades,
            wins,
            profit_loss,
        }
    }

    /// Check internal consistency, describing the first problem found.
    ///
    /// # Errors
    ///
    /// Returns a reason when the sample cannot have come from a real replay.
    pub fn validate(&self) -> Result<(), String> {
        if self.wins > self.trades {
            return Err(format!(
                "wins ({}) exceed trades ({})",
                self.wins, self.trades
            ));
        }
        Ok(())
    }

    /// Win ratio implied by the sample, if it contains any trades.
    #[must_use]
    pub fn win_signal(&self) -> Option<f64> {
        (self.trades > 0).then(|| f64::from(self.wins) / f64::from(self.trades))
    }
}

/// Immutable training input for one cycle.
///
/// Shared read-only across all scoring workers for the cycle's duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Where the data came from (file path, URL, or a test label).
    pub source: String,
    /// Candles sorted by timestamp.
    candles: Vec<Candle>,
    /// Explicit samples that take precedence over strategy replay.
    overrides: HashMap<AgentId, TrainingSample>,
}

impl Dataset {
    /// Build a dataset, sorting candles by time.
    pub fn new(source: impl Into<String>, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        Self {
            source: source.into(),
            candles,
            overrides: HashMap::new(),
        }
    }

    /// Attach an explicit sample for one agent.
    #[must_use]
    pub fn with_sample(mut self, id: AgentId, sample: TrainingSample) -> Self {
        self.overrides.insert(id, sample);
        self
    }

    #[must_use]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    #[must_use]
    pub fn sample_override(&self, id: AgentId) -> Option<&TrainingSample> {
        self.overrides.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty() && self.overrides.is_empty()
    }

    /// Data quality score in `0.0..=100.0`.
    ///
    /// Penalizes gaps longer than two hours and closes more than three
    /// standard deviations from the mean.
    #[must_use]
    pub fn quality(&self) -> f64 {
        if self.candles.is_empty() {
            return 0.0;
        }
        let count = self.candles.len() as f64;
        let mut score = 100.0;

        let gaps = self
            .candles
            .windows(2)
            .filter(|w| (w[1].timestamp - w[0].timestamp).num_seconds() > QUALITY_GAP_SECS)
            .count();
        score *= 1.0 - gaps as f64 / count;

        let mean = self.candles.iter().map(|c| c.close).sum::<f64>() / count;
        let variance = self
            .candles
            .iter()
            .map(|c| (c.close - mean).powi(2))
            .sum::<f64>()
            / count;
        let std_dev = variance.sqrt();
        let outliers = self
            .candles
            .iter()
            .filter(|c| (c.close - mean).abs() > std_dev * 3.0)
            .count();
        score *= 1.0 - (outliers as f64 / count) * 0.5;

        score.clamp(0.0, 100.0)
    }
}
