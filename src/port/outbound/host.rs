//! Host transport port for remote execution targets.
//!
//! The deployment channel owns connection state; a transport only performs
//! the network round-trips and reports how long they took.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::host::HostSpec;
use crate::error::Result;

/// Network access to deployment hosts.
#[async_trait]
pub trait HostTransport: Send + Sync {
    /// Open a session with the host, returning the handshake latency.
    async fn connect(&self, host: &HostSpec) -> Result<Duration>;

    /// Health-check the host, returning the round-trip latency.
    async fn ping(&self, host: &HostSpec) -> Result<Duration>;

    /// Close the session. Best effort.
    async fn disconnect(&self, host: &HostSpec) -> Result<()>;

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
