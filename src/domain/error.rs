//! Domain validation errors for fleet and deployment state.
//!
//! These errors are returned synchronously when a command would break a
//! state-machine rule or a capacity limit. They are never fatal and the
//! state they guard is left unchanged.
//!
//! # Examples
//!
//! ```
//! use armada::domain::agent::AgentStatus;
//! use armada::domain::error::DomainError;
//!
//! let result = AgentStatus::Training.transition(AgentStatus::Deployed);
//! assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
//! ```

use thiserror::Error;

use super::agent::AgentStatus;
use super::host::ConnectionState;
use super::id::{AgentId, HostId};

/// Errors that occur when domain invariants would be violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No agent with this id exists in the fleet.
    #[error("agent {id} not found")]
    AgentNotFound {
        /// The id that was looked up.
        id: AgentId,
    },

    /// The requested agent status change is not allowed.
    #[error("invalid status transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current status.
        from: AgentStatus,
        /// Requested status.
        to: AgentStatus,
    },

    /// The requested host connection state change is not allowed.
    #[error("invalid host transition {from:?} -> {to:?}")]
    InvalidHostTransition {
        /// Current connection state.
        from: ConnectionState,
        /// Requested connection state.
        to: ConnectionState,
    },

    /// The host already runs as many agents as it can hold.
    #[error("host {host} is at capacity ({capacity})")]
    CapacityExceeded {
        /// The full host.
        host: HostId,
        /// Its maximum capacity.
        capacity: usize,
    },

    /// No host with this id is known to the deployment channel.
    #[error("host {id} not found")]
    HostNotFound {
        /// The id that was looked up.
        id: HostId,
    },

    /// The host exists but is not in the `Connected` state.
    #[error("host {id} is not connected ({state:?})")]
    HostNotConnected {
        /// The host.
        id: HostId,
        /// Its current connection state.
        state: ConnectionState,
    },

    /// The agent is not deployed anywhere.
    #[error("agent {id} is not deployed")]
    AgentNotDeployed {
        /// The agent.
        id: AgentId,
    },
}
