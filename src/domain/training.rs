//! Training cycle outcomes and scheduler state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::{AgentId, CycleId};

/// Lifecycle of the training scheduler.
///
/// `Idle -> Running -> Committing -> Idle`, or `Running -> Failed -> Idle`
/// when the cycle cannot proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Committing,
    Failed,
}

/// Immutable summary of one completed training cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingResult {
    pub cycle_id: CycleId,
    /// Agents whose update was committed.
    pub agents_processed: usize,
    /// Agents that crossed into Godmode during this cycle.
    pub new_godmode_count: usize,
    /// Agents that crossed into Elite or above during this cycle.
    pub new_elite_count: usize,
    pub cycle_started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub cycle_duration: Duration,
    /// Agents whose update could not be computed or applied.
    pub failures: usize,
    /// Ids behind `failures`, in ascending order.
    pub failed_agents: Vec<AgentId>,
    /// Agents left out because they are in the `Error` status.
    pub skipped: usize,
    pub data_points: usize,
    pub data_quality: f64,
    pub total_xp_gained: u64,
    /// Net confidence change summed over committed agents; negative when the
    /// fleet lost confidence.
    pub total_confidence_gained: f64,
    /// Agents deployed to a connected host at commit time.
    pub live_eligible: usize,
    /// Registry version produced by the commit.
    pub committed_version: u64,
}

impl TrainingResult {
    /// One-paragraph human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "trained {} agents ({} failed, {} skipped) on {} data points (quality {:.1}); \
             +{} xp, {:+.3} confidence, {} new elite, {} new godmode in {:.2}s",
            self.agents_processed,
            self.failures,
            self.skipped,
            self.data_points,
            self.data_quality,
            self.total_xp_gained,
            self.total_confidence_gained,
            self.new_elite_count,
            self.new_godmode_count,
            self.cycle_duration.as_secs_f64(),
        )
    }
}

/// Pollable view of the scheduler for progress reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub current_cycle: Option<CycleId>,
    /// Agents scored so far in the current cycle.
    pub scored: usize,
    /// Agents to score in the current cycle.
    pub total: usize,
    pub completed_cycles: u64,
    /// Continuous-training ticks skipped because a cycle was still running.
    pub missed_ticks: u64,
    pub continuous: bool,
    pub last_failure: Option<String>,
}

impl SchedulerStatus {
    /// Fraction of the current cycle completed, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.scored as f64 / self.total as f64).min(1.0)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_bounded() {
        let mut status = SchedulerStatus {
            state: SchedulerState::Running,
            current_cycle: None,
            scored: 0,
            total: 0,
            completed_cycles: 0,
            missed_ticks: 0,
            continuous: false,
            last_failure: None,
        };
        assert_eq!(status.progress(), 0.0);
        status.total = 4;
        status.scored = 2;
        assert!((status.progress() - 0.5).abs() < f64::EPSILON);
        status.scored = 9;
        assert_eq!(status.progress(), 1.0);
    }
}
