//! Training scheduler.
//!
//! Drives batch training cycles: `Idle -> Running -> Committing -> Idle`, or
//! `Running -> Failed -> Idle` when the dataset cannot be obtained. Scoring
//! fans out over blocking worker threads against one registry snapshot; the
//! results are committed with a single [`AgentRegistry::apply_batch`] call,
//! so a cycle that is cancelled or dropped before that point leaves the
//! registry untouched.

pub mod config;
mod continuous;
mod cycle;
mod worker;


use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use self::continuous::ContinuousHandle;
use self::cycle::{CancelSignal, CycleGuard};
use self::worker::{partition, score_chunk, Progress, WorkerContext};
use super::registry::{AgentRegistry, FleetSnapshot};
use super::scoring::ScoringEngine;
use crate::domain::agent::{Agent, AgentStatus, AgentUpdate};
use crate::domain::dataset::Dataset;
use crate::domain::id::{AgentId, CycleId};
use crate::domain::tier::Tier;
use crate::domain::training::{SchedulerState, SchedulerStatus, TrainingResult};
use crate::error::TrainingError;
use crate::port::outbound::dataset::DatasetSource;
use crate::port::outbound::screenshot::ScreenshotCapture;

pub use config::TrainingConfig;

/// Capacity of the result broadcast channel.
const RESULT_CHANNEL_CAPACITY: usize = 16;

/// Mutable scheduler state guarded by one lock.
#[derive(Debug)]
struct CycleSlot {
    state: SchedulerState,
    current: Option<CycleId>,
    active: Option<Arc<CancelSignal>>,
    last_failure: Option<String>,
}

struct Inner {
    registry: Arc<AgentRegistry>,
    engine: ScoringEngine,
    config: TrainingConfig,
    screenshots: Option<Arc<dyn ScreenshotCapture>>,
    cycle: Mutex<CycleSlot>,
    progress: Arc<Progress>,
    cycles_started: AtomicU64,
    completed: AtomicU64,
    missed_ticks: AtomicU64,
    screenshots_captured: Arc<AtomicU64>,
    history: Mutex<VecDeque<TrainingResult>>,
    results: broadcast::Sender<TrainingResult>,
    continuous: Mutex<Option<ContinuousHandle>>,
}

/// Batch training driver. Cheap to clone; clones share one scheduler.
#[derive(Clone)]
pub struct TrainingScheduler {
    inner: Arc<Inner>,
}

impl TrainingScheduler {
    #[must_use]
    pub fn new(
        registry: Arc<AgentRegistry>,
        engine: ScoringEngine,
        config: TrainingConfig,
        screenshots: Option<Arc<dyn ScreenshotCapture>>,
    ) -> Self {
        let (results, _) = broadcast::channel(RESULT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                registry,
                engine,
                config,
                screenshots,
                cycle: Mutex::new(CycleSlot {
                    state: SchedulerState::Idle,
                    current: None,
                    active: None,
                    last_failure: None,
                }),
                progress: Arc::new(Progress::default()),
                cycles_started: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                missed_ticks: AtomicU64::new(0),
                screenshots_captured: Arc::new(AtomicU64::new(0)),
                history: Mutex::new(VecDeque::new()),
                results,
                continuous: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.inner.cycle.lock().state
    }

    /// Pollable progress and counters.
    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        let cycle = self.inner.cycle.lock();
        SchedulerStatus {
            state: cycle.state,
            current_cycle: cycle.current,
            scored: self.inner.progress.scored.load(Ordering::Relaxed),
            total: self.inner.progress.total.load(Ordering::Relaxed),
            completed_cycles: self.inner.completed.load(Ordering::Relaxed),
            missed_ticks: self.inner.missed_ticks.load(Ordering::Relaxed),
            continuous: self.is_continuous(),
            last_failure: cycle.last_failure.clone(),
        }
    }

    /// Receive every result as its cycle commits.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrainingResult> {
        self.inner.results.subscribe()
    }

    /// Recent results, oldest first.
    #[must_use]
    pub fn recent_results(&self) -> Vec<TrainingResult> {
        self.inner.history.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<TrainingResult> {
        self.inner.history.lock().back().cloned()
    }

    #[must_use]
    pub fn screenshots_captured(&self) -> u64 {
        self.inner.screenshots_captured.load(Ordering::Relaxed)
    }

    /// Run one training cycle on `dataset`.
    ///
    /// Dropping the returned future before it resolves abandons the cycle
    /// without committing anything.
    ///
    /// # Errors
    ///
    /// - [`TrainingError::AlreadyRunning`] if a cycle is in progress
    /// - [`TrainingError::DatasetUnavailable`] for an empty dataset
    /// - [`TrainingError::Cancelled`] if [`Self::cancel_training`] was called
    pub async fn start_training(
        &self,
        dataset: Arc<Dataset>,
    ) -> Result<TrainingResult, TrainingError> {
        let guard = self.begin()?;
        self.run_cycle(guard, dataset).await
    }

    /// Load a dataset from `source` and run one training cycle on it.
    ///
    /// The scheduler is `Running` while the dataset loads.
    ///
    /// # Errors
    ///
    /// As [`Self::start_training`]; load failures are reported as
    /// [`TrainingError::DatasetUnavailable`].
    pub async fn start_training_from(
        &self,
        source: &dyn DatasetSource,
    ) -> Result<TrainingResult, TrainingError> {
        let guard = self.begin()?;
        self.run_from_source(guard, source).await
    }

    /// Abort the in-flight cycle before it commits.
    ///
    /// Returns `false` if no cycle is running or it is already committing.
    pub fn cancel_training(&self) -> bool {
        let cycle = self.inner.cycle.lock();
        if cycle.state == SchedulerState::Committing {
            return false;
        }
        match &cycle.active {
            Some(signal) => {
                let cancelled = signal.cancel();
                if cancelled {
                    info!(cycle_id = ?cycle.current, "Training cancellation requested");
                }
                cancelled
            }
            None => false,
        }
    }

    /// Claim the cycle slot: `Idle -> Running`.
    fn begin(&self) -> Result<CycleGuard, TrainingError> {
        let mut cycle = self.inner.cycle.lock();
        if cycle.state != SchedulerState::Idle {
            return Err(TrainingError::AlreadyRunning);
        }
        let id = CycleId::new();
        let signal = Arc::new(CancelSignal::new());
        cycle.state = SchedulerState::Running;
        cycle.current = Some(id);
        cycle.active = Some(Arc::clone(&signal));
        drop(cycle);

        self.inner.progress.reset();
        debug!(cycle_id = %id, "Training cycle claimed");
        Ok(CycleGuard::new(Arc::clone(&self.inner), id, signal))
    }

    async fn run_from_source(
        &self,
        guard: CycleGuard,
        source: &dyn DatasetSource,
    ) -> Result<TrainingResult, TrainingError> {
        let cancel = guard.cancel_signal();
        let loaded = tokio::select! {
            loaded = source.load() => loaded,
            () = cancel.cancelled() => return Err(TrainingError::Cancelled),
        };
        match loaded {
            Ok(dataset) => self.run_cycle(guard, Arc::new(dataset)).await,
            Err(e) => {
                let reason = format!("{}: {e}", source.describe());
                warn!(cycle_id = %guard.id(), error = %reason, "Dataset load failed");
                guard.fail(reason.clone());
                Err(TrainingError::DatasetUnavailable(reason))
            }
        }
    }

    async fn run_cycle(
        &self,
        guard: CycleGuard,
        dataset: Arc<Dataset>,
    ) -> Result<TrainingResult, TrainingError> {
        if dataset.is_empty() {
            let reason = format!("{} contains no training data", dataset.source);
            warn!(cycle_id = %guard.id(), "Empty dataset");
            guard.fail(reason.clone());
            return Err(TrainingError::DatasetUnavailable(reason));
        }

        let cycle_id = guard.id();
        let started_at = Utc::now();
        let clock = Instant::now();
        let base = self.inner.registry.snapshot();

        let (targets, skipped): (Vec<Arc<Agent>>, Vec<Arc<Agent>>) = base
            .agents()
            .iter()
            .cloned()
            .partition(|a| a.status() != AgentStatus::Error);
        self.inner.progress.start(targets.len());

        let workers = self.inner.config.effective_workers();
        info!(
            %cycle_id,
            agents = targets.len(),
            skipped = skipped.len(),
            workers,
            data_points = dataset.len(),
            "Training cycle started"
        );

        let cancel = guard.cancel_signal();
        let ctx = Arc::new(WorkerContext {
            engine: self.inner.engine.clone(),
            dataset: Arc::clone(&dataset),
            seed: self.cycle_seed(),
            cancel: Arc::clone(&cancel),
            progress: Arc::clone(&self.inner.progress),
        });

        let mut chunk_ids = Vec::new();
        let mut handles = Vec::new();
        for chunk in partition(targets, workers) {
            chunk_ids.push(chunk.iter().map(|a| a.id()).collect::<Vec<_>>());
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::task::spawn_blocking(move || score_chunk(&ctx, &chunk)));
        }

        let joined = tokio::select! {
            joined = join_all(handles) => joined,
            () = cancel.cancelled() => return Err(TrainingError::Cancelled),
        };

        let mut updates = Vec::new();
        let mut failed: Vec<AgentId> = Vec::new();
        for (ids, outcome) in chunk_ids.into_iter().zip(joined) {
            match outcome {
                Ok(Some(results)) => {
                    for result in results {
                        match result {
                            Ok(update) => updates.push(update),
                            Err(e) => {
                                debug!(%cycle_id, agent_id = %e.agent(), error = %e, "Agent not scored");
                                failed.push(e.agent());
                            }
                        }
                    }
                }
                Ok(None) => return Err(TrainingError::Cancelled),
                Err(e) => {
                    warn!(%cycle_id, error = %e, agents = ids.len(), "Scoring worker failed");
                    failed.extend(ids);
                }
            }
        }
        guard.try_commit()?;
        let outcome = self.inner.registry.apply_batch(&updates);
        failed.extend(outcome.unknown.iter().copied());
        failed.sort_unstable();
        let committed = self.inner.registry.snapshot();

        let mut result = TrainingResult {
            cycle_id,
            agents_processed: outcome.applied,
            new_godmode_count: 0,
            new_elite_count: 0,
            cycle_started_at: started_at,
            cycle_duration: Duration::ZERO,
            failures: failed.len(),
            failed_agents: failed,
            skipped: skipped.len(),
            data_points: dataset.len(),
            data_quality: dataset.quality(),
            total_xp_gained: 0,
            total_confidence_gained: 0.0,
            live_eligible: committed
                .agents()
                .iter()
                .filter(|a| a.status() == AgentStatus::Deployed)
                .count(),
            committed_version: outcome.version,
        };
        let promoted = tally_promotions(&base, &committed, &updates, &mut result);
        result.cycle_duration = clock.elapsed();

        self.publish(&result);
        guard.finish();
        self.capture_screenshots(promoted, cycle_id);

        info!(
            %cycle_id,
            processed = result.agents_processed,
            failures = result.failures,
            new_godmode = result.new_godmode_count,
            new_elite = result.new_elite_count,
            version = result.committed_version,
            duration_ms = result.cycle_duration.as_millis() as u64,
            "Training cycle committed"
        );
        Ok(result)
    }

    fn cycle_seed(&self) -> u64 {
        let n = self.inner.cycles_started.fetch_add(1, Ordering::Relaxed);
        self.inner.config.seed ^ n.rotate_left(32)
    }

    fn publish(&self, result: &TrainingResult) {
        {
            let mut history = self.inner.history.lock();
            history.push_back(result.clone());
            while history.len() > self.inner.config.history_limit.max(1) {
                history.pop_front();
            }
        }
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
        // No receivers is fine.
        let _ = self.inner.results.send(result.clone());
    }

    fn capture_screenshots(&self, promoted: Vec<Arc<Agent>>, cycle_id: CycleId) {
        if !self.inner.config.capture_godmode_screenshots || promoted.is_empty() {
            return;
        }
        let Some(capture) = self.inner.screenshots.clone() else {
            return;
        };
        let counter = Arc::clone(&self.inner.screenshots_captured);
        tokio::spawn(async move {
            for agent in promoted {
                let context = format!("godmode promotion in cycle {cycle_id}");
                match capture.capture(&agent, &context).await {
                    Ok(reference) => {
                        counter.fetch_add(1, Ordering::Relaxed);
                        debug!(agent_id = %agent.id(), screenshot = %reference.0, "Screenshot captured");
                    }
                    Err(e) => warn!(agent_id = %agent.id(), error = %e, "Screenshot capture failed"),
                }
            }
        });
    }

    fn record_missed_tick(&self) {
        let missed = self.inner.missed_ticks.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(missed, "Training tick skipped, previous cycle still running");
    }
}

/// Fill promotion counts, XP and confidence gained; return the agents newly
/// in Godmode.
fn tally_promotions(
    base: &FleetSnapshot,
    committed: &FleetSnapshot,
    updates: &[AgentUpdate],
    result: &mut TrainingResult,
) -> Vec<Arc<Agent>> {
    let before: HashMap<AgentId, &Arc<Agent>> = updates
        .iter()
        .filter_map(|u| base.get(u.id()).map(|a| (u.id(), a)))
        .collect();

    let mut promoted = Vec::new();
    for update in updates {
        let (Some(prior), Some(agent)) = (before.get(&update.id()), committed.get(update.id()))
        else {
            continue;
        };
        let tier = prior.tier();
        result.total_xp_gained = result
            .total_xp_gained
            .saturating_add(agent.xp().saturating_sub(prior.xp()));
        result.total_confidence_gained += agent.confidence() - prior.confidence();
        if tier == Tier::Learning && agent.tier() >= Tier::Elite {
            result.new_elite_count += 1;
        }
        if tier != Tier::Godmode && agent.tier() == Tier::Godmode {
            result.new_godmode_count += 1;
            promoted.push(Arc::clone(agent));
        }
    }
    promoted
}
