//! Mock [`HostTransport`] for testing.
//!
//! [`ScriptedTransport`] pops pre-loaded connect/ping results and falls back
//! to a switchable health flag once a script is exhausted. Best for: backoff
//! schedules, health-check failure cascades, connect cancellation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::host::HostSpec;
use crate::error::{Error, Result};
use crate::port::outbound::host::HostTransport;

/// Latency reported by successful scripted calls.
pub const LATENCY: Duration = Duration::from_millis(5);

/// A mock transport with scripted results and shared call counters.
pub struct ScriptedTransport {
    connect_results: Mutex<VecDeque<Result<Duration>>>,
    ping_results: Mutex<VecDeque<Result<Duration>>>,
    connect_delay: Duration,
    healthy: Arc<AtomicBool>,
    connect_count: Arc<AtomicU32>,
    ping_count: Arc<AtomicU32>,
    disconnect_count: Arc<AtomicU32>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            connect_results: Mutex::new(VecDeque::new()),
            ping_results: Mutex::new(VecDeque::new()),
            connect_delay: Duration::ZERO,
            healthy: Arc::new(AtomicBool::new(true)),
            connect_count: Arc::new(AtomicU32::new(0)),
            ping_count: Arc::new(AtomicU32::new(0)),
            disconnect_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A transport whose every call fails.
    pub fn unreachable() -> Self {
        let transport = Self::new();
        transport.set_healthy(false);
        transport
    }

    pub fn with_connect_results(self, results: Vec<Result<Duration>>) -> Self {
        if let Ok(mut queue) = self.connect_results.lock() {
            *queue = results.into();
        }
        self
    }

    pub fn with_ping_results(self, results: Vec<Result<Duration>>) -> Self {
        if let Ok(mut queue) = self.ping_results.lock() {
            *queue = results.into();
        }
        self
    }

    /// Sleep before answering each connect.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Result of unscripted calls: success when healthy.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Shared health switch, for flipping from another task.
    pub fn health_switch(&self) -> Arc<AtomicBool> {
        self.healthy.clone()
    }

    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }

    pub fn ping_count(&self) -> u32 {
        self.ping_count.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> u32 {
        self.disconnect_count.load(Ordering::SeqCst)
    }

    fn fallback(&self) -> Result<Duration> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(LATENCY)
        } else {
            Err(Error::Connection("host unreachable".into()))
        }
    }

    fn next(&self, queue: &Mutex<VecDeque<Result<Duration>>>) -> Result<Duration> {
        let scripted = queue.lock().ok().and_then(|mut q| q.pop_front());
        scripted.unwrap_or_else(|| self.fallback())
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostTransport for ScriptedTransport {
    async fn connect(&self, _host: &HostSpec) -> Result<Duration> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        self.next(&self.connect_results)
    }

    async fn ping(&self, _host: &HostSpec) -> Result<Duration> {
        self.ping_count.fetch_add(1, Ordering::SeqCst);
        self.next(&self.ping_results)
    }

    async fn disconnect(&self, _host: &HostSpec) -> Result<()> {
        self.disconnect_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Shorthand for a failed scripted call.
pub fn failure(reason: &str) -> Result<Duration> {
    Err(Error::Connection(reason.to_string()))
}
