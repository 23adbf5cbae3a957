//! Remote execution hosts agents can be deployed to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::HostId;

/// Connection lifecycle of a deployment host.
///
/// ```text
/// Disconnected ──> Connecting ──> Connected ──> Disconnected
///       ^               │             │
///       │               v             v
///       └──────────── Error <─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    /// Whether moving from `self` to `to` is a legal transition.
    #[must_use]
    pub const fn can_transition(self, to: ConnectionState) -> bool {
        matches!(
            (self, to),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting, Self::Error)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Connected, Self::Error)
                | (Self::Connected, Self::Disconnected)
                | (Self::Error, Self::Disconnected)
                | (Self::Error, Self::Connecting)
        )
    }

    /// Validate a transition, returning the target state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidHostTransition`] when the move is illegal.
    pub fn transition(self, to: ConnectionState) -> Result<ConnectionState, DomainError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(DomainError::InvalidHostTransition { from: self, to })
        }
    }
}

/// Static description of a host, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    /// Unique host id.
    pub id: HostId,
    /// Base URL of the host's control API.
    pub address: String,
    /// Maximum number of agents the host may run at once.
    pub max_capacity: usize,
}

impl HostSpec {
    pub fn new(id: impl Into<HostId>, address: impl Into<String>, max_capacity: usize) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            max_capacity,
        }
    }
}

/// Live view of a deployment host.
///
/// Mutated only by the deployment channel; everyone else sees clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentHost {
    pub id: HostId,
    pub address: String,
    pub max_capacity: usize,
    pub current_load: usize,
    pub connection_state: ConnectionState,
    pub last_latency_ms: Option<u64>,
    /// Consecutive failed connect or health-check attempts.
    pub consecutive_failures: u32,
    pub connected_since: Option<DateTime<Utc>>,
}

impl DeploymentHost {
    /// A freshly configured host: disconnected and empty.
    #[must_use]
    pub fn new(spec: &HostSpec) -> Self {
        Self {
            id: spec.id.clone(),
            address: spec.address.clone(),
            max_capacity: spec.max_capacity,
            current_load: 0,
            connection_state: ConnectionState::Disconnected,
            last_latency_ms: None,
            consecutive_failures: 0,
            connected_since: None,
        }
    }

    #[must_use]
    pub fn spec(&self) -> HostSpec {
        HostSpec {
            id: self.id.clone(),
            address: self.address.clone(),
            max_capacity: self.max_capacity,
        }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.connection_state, ConnectionState::Connected)
    }

    #[must_use]
    pub const fn available_capacity(&self) -> usize {
        self.max_capacity.saturating_sub(self.current_load)
    }
}
