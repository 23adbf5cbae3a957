//! Deployment channel.
//!
//! Single owner of host connection state and capacity counters. Each host
//! follows the [`ConnectionState`] machine:
//!
//! 1. `connect` moves it to `Connecting` and tries the transport with
//!    exponential backoff, settling in `Connected` or `Error`
//! 2. while `Connected`, a monitor task pings it periodically; a failed ping
//!    is retried on the backoff schedule and, if every retry fails, the host
//!    moves to `Error`
//! 3. `disconnect` moves it to `Disconnected` from any other state
//!
//! Whenever a host leaves `Connected`, every agent deployed to it returns to
//! `Idle` under the same lock that changes the host state.

pub mod config;
mod monitor;


use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::registry::AgentRegistry;
use crate::domain::error::DomainError;
use crate::domain::host::{ConnectionState, DeploymentHost, HostSpec};
use crate::domain::id::{AgentId, HostId};
use crate::error::{Error, Result};
use crate::port::outbound::host::HostTransport;

pub use config::{BackoffConfig, DeploymentConfig};

struct HostEntry {
    host: DeploymentHost,
    /// Bumped on every connect and disconnect so stale tasks can tell they
    /// have been superseded.
    generation: u64,
    monitor: Option<JoinHandle<()>>,
}

impl HostEntry {
    fn stop_monitor(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.abort();
        }
    }
}

struct Inner {
    registry: Arc<AgentRegistry>,
    transport: Arc<dyn HostTransport>,
    config: DeploymentConfig,
    hosts: Mutex<HashMap<HostId, HostEntry>>,
}

impl Inner {
    /// Move a connected host to `Error` and release its agents, unless the
    /// host has moved on since `generation`.
    fn fail_host(&self, id: &HostId, generation: u64, reason: &str) {
        let mut hosts = self.hosts.lock();
        let Some(entry) = hosts.get_mut(id) else {
            return;
        };
        if entry.generation != generation || !entry.host.is_connected() {
            return;
        }
        entry.host.connection_state = ConnectionState::Error;
        entry.host.connected_since = None;
        entry.host.current_load = 0;
        entry.monitor = None;
        let released = self.registry.release_host(id);
        warn!(
            host_id = %id,
            released = released.len(),
            reason,
            "Host failed health checks, agents returned to idle"
        );
    }

    /// Run `f` on the entry for `id` if it is still at `generation`.
    fn with_current<T>(
        &self,
        id: &HostId,
        generation: u64,
        f: impl FnOnce(&mut HostEntry) -> T,
    ) -> Option<T> {
        let mut hosts = self.hosts.lock();
        hosts
            .get_mut(id)
            .filter(|e| e.generation == generation)
            .map(f)
    }

    async fn ping(&self, spec: &HostSpec) -> Result<Duration> {
        let timeout = self.config.request_timeout();
        tokio::time::timeout(timeout, self.transport.ping(spec))
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }
}

/// Connection lifecycle and agent placement for deployment hosts.
pub struct DeploymentChannel {
    inner: Arc<Inner>,
}

impl DeploymentChannel {
    #[must_use]
    pub fn new(
        registry: Arc<AgentRegistry>,
        transport: Arc<dyn HostTransport>,
        config: DeploymentConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                transport,
                config,
                hosts: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Connect to a host, registering it if it is new.
    ///
    /// Attempts are spaced by the backoff schedule. Transport failures are
    /// not errors: after the last failed attempt the host settles in
    /// `Error` and that state is returned. Dropping the future while it is
    /// still connecting moves the host to `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidHostTransition`] if the host is already
    /// connecting or connected.
    pub async fn connect(&self, spec: HostSpec) -> std::result::Result<ConnectionState, DomainError> {
        let id = spec.id.clone();
        let generation = {
            let mut hosts = self.inner.hosts.lock();
            let entry = hosts.entry(id.clone()).or_insert_with(|| HostEntry {
                host: DeploymentHost::new(&spec),
                generation: 0,
                monitor: None,
            });
            let next = entry.host.connection_state.transition(ConnectionState::Connecting)?;
            entry.host = DeploymentHost {
                connection_state: next,
                ..DeploymentHost::new(&spec)
            };
            entry.generation += 1;
            entry.generation
        };

        let mut guard = ConnectGuard {
            inner: Arc::clone(&self.inner),
            id: id.clone(),
            generation,
            armed: true,
        };
        let backoff = &self.inner.config.backoff;
        let timeout = self.inner.config.request_timeout();
        let attempts = backoff.max_attempts.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = backoff.delay(attempt - 1);
                debug!(host_id = %id, attempt, delay_ms = delay.as_millis() as u64, "Retrying connect");
                tokio::time::sleep(delay).await;
            }

            let outcome = tokio::time::timeout(timeout, self.inner.transport.connect(&spec))
                .await
                .map_err(|_| Error::Timeout(timeout))
                .and_then(|r| r);

            match outcome {
                Ok(latency) => {
                    guard.armed = false;
                    return Ok(self.on_connected(&spec, generation, latency));
                }
                Err(e) => {
                    warn!(host_id = %id, attempt = attempt + 1, error = %e, "Connect attempt failed");
                    let superseded = self
                        .inner
                        .with_current(&id, generation, |entry| {
                            entry.host.consecutive_failures += 1;
                        })
                        .is_none();
                    if superseded {
                        guard.armed = false;
                        return Ok(self.state_of(&id));
                    }
                }
            }
        }

        guard.armed = false;
        let state = self
            .inner
            .with_current(&id, generation, |entry| {
                if entry.host.connection_state == ConnectionState::Connecting {
                    entry.host.connection_state = ConnectionState::Error;
                }
                entry.host.connection_state
            })
            .unwrap_or_else(|| self.state_of(&id));
        warn!(host_id = %id, attempts, "Host unreachable, giving up");
        Ok(state)
    }

    fn on_connected(&self, spec: &HostSpec, generation: u64, latency: Duration) -> ConnectionState {
        let monitor = monitor::spawn(
            Arc::downgrade(&self.inner),
            spec.clone(),
            generation,
            self.inner.config.health_check_interval(),
        );
        let mut monitor = Some(monitor);
        let connected = self.inner.with_current(&spec.id, generation, |entry| {
            if entry.host.connection_state != ConnectionState::Connecting {
                return false;
            }
            entry.host.connection_state = ConnectionState::Connected;
            entry.host.last_latency_ms = Some(latency.as_millis() as u64);
            entry.host.consecutive_failures = 0;
            entry.host.connected_since = Some(Utc::now());
            entry.monitor = monitor.take();
            true
        });
        if let Some(orphan) = monitor {
            orphan.abort();
        }
        if connected == Some(true) {
            info!(host_id = %spec.id, latency_ms = latency.as_millis() as u64, "Host connected");
            ConnectionState::Connected
        } else {
            // Superseded by a disconnect while the transport answered.
            self.state_of(&spec.id)
        }
    }

    /// Disconnect a host, returning the agents that were released.
    ///
    /// Disconnecting an already disconnected host is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HostNotFound`] for unknown hosts.
    pub async fn disconnect(&self, id: &HostId) -> std::result::Result<Vec<AgentId>, DomainError> {
        let (released, spec, was_connected) = {
            let mut hosts = self.inner.hosts.lock();
            let entry = hosts
                .get_mut(id)
                .ok_or_else(|| DomainError::HostNotFound { id: id.clone() })?;
            let from = entry.host.connection_state;
            if from == ConnectionState::Disconnected {
                return Ok(Vec::new());
            }
            entry.host.connection_state = from.transition(ConnectionState::Disconnected)?;
            entry.generation += 1;
            entry.stop_monitor();
            entry.host.current_load = 0;
            entry.host.connected_since = None;
            let released = self.inner.registry.release_host(id);
            (released, entry.host.spec(), from == ConnectionState::Connected)
        };

        if was_connected {
            if let Err(e) = self.inner.transport.disconnect(&spec).await {
                debug!(host_id = %id, error = %e, "Transport disconnect failed");
            }
        }
        info!(host_id = %id, released = released.len(), "Host disconnected");
        Ok(released)
    }

    /// Deploy an idle agent to a connected host.
    ///
    /// # Errors
    ///
    /// - [`DomainError::HostNotFound`] / [`DomainError::HostNotConnected`]
    /// - [`DomainError::CapacityExceeded`] when the host is full
    /// - [`DomainError::AgentNotFound`] / [`DomainError::InvalidTransition`]
    ///   from the registry
    pub fn assign(&self, agent: AgentId, host: &HostId) -> std::result::Result<(), DomainError> {
        let mut hosts = self.inner.hosts.lock();
        let entry = hosts
            .get_mut(host)
            .ok_or_else(|| DomainError::HostNotFound { id: host.clone() })?;
        if !entry.host.is_connected() {
            return Err(DomainError::HostNotConnected {
                id: host.clone(),
                state: entry.host.connection_state,
            });
        }
        if entry.host.current_load >= entry.host.max_capacity {
            return Err(DomainError::CapacityExceeded {
                host: host.clone(),
                capacity: entry.host.max_capacity,
            });
        }
        self.inner.registry.deploy(agent, host.clone())?;
        entry.host.current_load += 1;
        debug!(agent_id = %agent, host_id = %host, load = entry.host.current_load, "Agent deployed");
        Ok(())
    }

    /// Return a deployed agent to `Idle`, freeing its slot.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AgentNotDeployed`] if the agent is not deployed.
    pub fn unassign(&self, agent: AgentId) -> std::result::Result<HostId, DomainError> {
        let mut hosts = self.inner.hosts.lock();
        let host = self.inner.registry.release(agent)?;
        if let Some(entry) = hosts.get_mut(&host) {
            entry.host.current_load = entry.host.current_load.saturating_sub(1);
        }
        debug!(agent_id = %agent, host_id = %host, "Agent undeployed");
        Ok(host)
    }

    /// Every known host, ordered by id.
    #[must_use]
    pub fn status(&self) -> Vec<DeploymentHost> {
        let hosts = self.inner.hosts.lock();
        let mut view: Vec<DeploymentHost> = hosts.values().map(|e| e.host.clone()).collect();
        view.sort_by(|a, b| a.id.cmp(&b.id));
        view
    }

    #[must_use]
    pub fn host(&self, id: &HostId) -> Option<DeploymentHost> {
        self.inner.hosts.lock().get(id).map(|e| e.host.clone())
    }

    fn state_of(&self, id: &HostId) -> ConnectionState {
        self.host(id)
            .map_or(ConnectionState::Disconnected, |h| h.connection_state)
    }

    /// Disconnect every host.
    pub async fn shutdown(&self) {
        let ids: Vec<HostId> = self.inner.hosts.lock().keys().cloned().collect();
        for id in ids {
            if let Err(e) = self.disconnect(&id).await {
                warn!(host_id = %id, error = %e, "Failed to disconnect host during shutdown");
            }
        }
    }
}

impl Drop for DeploymentChannel {
    fn drop(&mut self) {
        for entry in self.inner.hosts.lock().values_mut() {
            entry.stop_monitor();
        }
    }
}

/// Moves a host back to `Disconnected` if its connect future is dropped.
struct ConnectGuard {
    inner: Arc<Inner>,
    id: HostId,
    generation: u64,
    armed: bool,
}

impl Drop for ConnectGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let cancelled = self.inner.with_current(&self.id, self.generation, |entry| {
            if entry.host.connection_state == ConnectionState::Connecting {
                entry.host.connection_state = ConnectionState::Disconnected;
                true
            } else {
                false
            }
        });
        if cancelled == Some(true) {
            info!(host_id = %self.id, "Connect cancelled");
        }
    }
}
