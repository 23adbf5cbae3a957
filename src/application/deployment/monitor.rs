//! Periodic health checks for connected hosts.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Inner;
use crate::domain::host::HostSpec;

/// Spawn the health monitor for one connection.
///
/// The task holds a weak reference so a dropped channel stops it, and exits
/// as soon as the connection it was started for is superseded.
pub(super) fn spawn(
    inner: Weak<Inner>,
    spec: HostSpec,
    generation: u64,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let Some(channel) = inner.upgrade() else {
                return;
            };
            if !check(&channel, &spec, generation).await {
                return;
            }
        }
    })
}

/// One health check including retries. Returns whether monitoring should
/// continue.
async fn check(inner: &Inner, spec: &HostSpec, generation: u64) -> bool {
    let mut last_error = match inner.ping(spec).await {
        Ok(latency) => return record_success(inner, spec, generation, latency),
        Err(e) => e.to_string(),
    };
    if !record_failure(inner, spec, generation, &last_error) {
        return false;
    }

    let backoff = &inner.config.backoff;
    for attempt in 0..backoff.max_attempts {
        tokio::time::sleep(backoff.delay(attempt)).await;
        match inner.ping(spec).await {
            Ok(latency) => return record_success(inner, spec, generation, latency),
            Err(e) => {
                last_error = e.to_string();
                if !record_failure(inner, spec, generation, &last_error) {
                    return false;
                }
            }
        }
    }

    inner.fail_host(&spec.id, generation, &last_error);
    false
}

fn record_success(inner: &Inner, spec: &HostSpec, generation: u64, latency: Duration) -> bool {
    let current = inner.with_current(&spec.id, generation, |entry| {
        entry.host.last_latency_ms = Some(latency.as_millis() as u64);
        entry.host.consecutive_failures = 0;
    });
    if current.is_some() {
        debug!(host_id = %spec.id, latency_ms = latency.as_millis() as u64, "Health check ok");
    }
    current.is_some()
}

fn record_failure(inner: &Inner, spec: &HostSpec, generation: u64, reason: &str) -> bool {
    inner
        .with_current(&spec.id, generation, |entry| {
            entry.host.consecutive_failures += 1;
            warn!(
                host_id = %spec.id,
                failures = entry.host.consecutive_failures,
                reason,
                "Health check failed"
            );
        })
        .is_some()
}
