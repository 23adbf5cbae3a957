use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::TrainingScheduler;
use crate::error::TrainingError;
use crate::port::outbound::dataset::DatasetSource;

/// Background ticker driving continuous training.
pub(super) struct ContinuousHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TrainingScheduler {
    /// Run a cycle every `interval` until stopped, loading a fresh dataset
    /// from `source` each time.
    ///
    /// The first cycle starts immediately. A tick that finds the previous
    /// cycle still running is skipped and counted in
    /// [`SchedulerStatus::missed_ticks`](crate::domain::training::SchedulerStatus).
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::ContinuousAlreadyRunning`] if a ticker is
    /// already active.
    pub fn start_continuous_training(
        &self,
        source: Arc<dyn DatasetSource>,
        interval: Duration,
    ) -> Result<(), TrainingError> {
        let mut slot = self.inner.continuous.lock();
        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Err(TrainingError::ContinuousAlreadyRunning);
        }

        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_ticker(self.clone(), source, interval, stop_rx));
        *slot = Some(ContinuousHandle { stop, task });
        info!(interval_secs = interval.as_secs_f64(), "Continuous training started");
        Ok(())
    }

    /// Stop scheduling new cycles. An in-flight cycle runs to completion.
    ///
    /// Returns `false` if continuous training was not running.
    pub fn stop_continuous_training(&self) -> bool {
        let Some(handle) = self.inner.continuous.lock().take() else {
            return false;
        };
        let _ = handle.stop.send(true);
        handle.task.abort();
        info!("Continuous training stopped");
        true
    }

    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.inner
            .continuous
            .lock()
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }
}

async fn run_ticker(
    scheduler: TrainingScheduler,
    source: Arc<dyn DatasetSource>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let guard = match scheduler.begin() {
                    Ok(guard) => guard,
                    Err(_) => {
                        scheduler.record_missed_tick();
                        continue;
                    }
                };
                let scheduler = scheduler.clone();
                let source = Arc::clone(&source);
                tokio::spawn(async move {
                    match scheduler.run_from_source(guard, source.as_ref()).await {
                        Ok(result) => info!(summary = %result.summary(), "Scheduled training complete"),
                        Err(TrainingError::DatasetUnavailable(reason)) => {
                            warn!(%reason, "Scheduled training skipped")
                        }
                        Err(e) => error!(error = %e, "Scheduled training failed"),
                    }
                });
            }
        }
    }
}
