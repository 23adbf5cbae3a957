use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::cycle::CancelSignal;
use crate::application::scoring::{ScoringEngine, ScoringError};
use crate::application::simulation;
use crate::domain::agent::{Agent, AgentUpdate};
use crate::domain::dataset::Dataset;

/// Per-cycle counters read by status polling.
#[derive(Debug, Default)]
pub(super) struct Progress {
    pub(super) scored: AtomicUsize,
    pub(super) total: AtomicUsize,
}

impl Progress {
    pub(super) fn start(&self, total: usize) {
        self.scored.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub(super) fn reset(&self) {
        self.start(0);
    }
}

/// Everything a scoring worker reads. Shared read-only for the cycle.
pub(super) struct WorkerContext {
    pub(super) engine: ScoringEngine,
    pub(super) dataset: Arc<Dataset>,
    pub(super) seed: u64,
    pub(super) cancel: Arc<CancelSignal>,
    pub(super) progress: Arc<Progress>,
}

/// Score one chunk of agents. Returns `None` if the cycle was cancelled.
pub(super) fn score_chunk(
    ctx: &WorkerContext,
    agents: &[Arc<Agent>],
) -> Option<Vec<Result<AgentUpdate, ScoringError>>> {
    let mut results = Vec::with_capacity(agents.len());
    for agent in agents {
        if ctx.cancel.is_cancelled() {
            return None;
        }
        let sample = simulation::sample_for(agent, &ctx.dataset);
        let mut rng = ScoringEngine::agent_rng(ctx.seed, agent.id());
        results.push(ctx.engine.score(agent, &sample, &mut rng));
        ctx.progress.scored.fetch_add(1, Ordering::Relaxed);
    }
    Some(results)
}

/// Split `agents` into at most `workers` contiguous chunks.
pub(super) fn partition(agents: Vec<Arc<Agent>>, workers: usize) -> Vec<Vec<Arc<Agent>>> {
    if agents.is_empty() {
        return Vec::new();
    }
    let size = agents.len().div_ceil(workers.max(1));
    agents.chunks(size).map(<[Arc<Agent>]>::to_vec).collect()
}
