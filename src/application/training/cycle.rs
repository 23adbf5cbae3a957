use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::Inner;
use crate::domain::id::CycleId;
use crate::domain::training::SchedulerState;
use crate::error::TrainingError;

/// Cancellation flag shared by one cycle's task and its scoring workers.
#[derive(Debug)]
pub(super) struct CancelSignal {
    tx: watch::Sender<bool>,
}

impl CancelSignal {
    pub(super) fn new() -> Self {
        Self {
            tx: watch::Sender::new(false),
        }
    }

    /// Returns whether this call performed the cancellation.
    pub(super) fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub(super) fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the cycle is cancelled.
    pub(super) async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Ownership of the scheduler's single cycle slot.
///
/// Created by the `Idle -> Running` transition. Dropping it before
/// [`CycleGuard::finish`] (cancellation, a dropped future, a panic) puts the
/// scheduler back to `Idle` without touching the registry.
pub(super) struct CycleGuard {
    inner: Arc<Inner>,
    id: CycleId,
    cancel: Arc<CancelSignal>,
    finished: bool,
}

impl CycleGuard {
    pub(super) fn new(inner: Arc<Inner>, id: CycleId, cancel: Arc<CancelSignal>) -> Self {
        Self {
            inner,
            id,
            cancel,
            finished: false,
        }
    }

    pub(super) const fn id(&self) -> CycleId {
        self.id
    }

    pub(super) fn cancel_signal(&self) -> Arc<CancelSignal> {
        Arc::clone(&self.cancel)
    }

    pub(super) fn set_state(&self, state: SchedulerState) {
        self.inner.cycle.lock().state = state;
        debug!(cycle_id = %self.id, ?state, "Scheduler state changed");
    }

    /// `Running -> Committing`, unless the cycle was cancelled first.
    ///
    /// Checked under the same lock [`super::TrainingScheduler::cancel_training`]
    /// takes, so an accepted cancellation never sees a commit.
    pub(super) fn try_commit(&self) -> Result<(), TrainingError> {
        let mut cycle = self.inner.cycle.lock();
        if self.cancel.is_cancelled() {
            return Err(TrainingError::Cancelled);
        }
        cycle.state = SchedulerState::Committing;
        drop(cycle);
        debug!(cycle_id = %self.id, "Cycle committing");
        Ok(())
    }

    /// Record an unrecoverable failure: `Running -> Failed -> Idle`.
    pub(super) fn fail(mut self, reason: String) {
        self.set_state(SchedulerState::Failed);
        self.inner.cycle.lock().last_failure = Some(reason);
        self.release();
    }

    /// Return to `Idle` after a commit.
    pub(super) fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.finished = true;
        let mut cycle = self.inner.cycle.lock();
        cycle.state = SchedulerState::Idle;
        cycle.current = None;
        cycle.active = None;
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        // Stops any scoring workers still running for this cycle.
        self.cancel.cancel();
        if !self.finished {
            self.release();
            self.inner.progress.reset();
            info!(cycle_id = %self.id, "Training cycle abandoned before commit");
        }
    }
}
