//! Deployment host entries.

use serde::Deserialize;

use crate::domain::host::HostSpec;
use crate::domain::id::HostId;

/// One configured deployment host.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub id: String,
    /// Base URL of the host's control API, e.g. `http://10.0.0.5:8080`.
    pub address: String,
    pub max_capacity: usize,
    /// Number of top performers to deploy right after connecting.
    #[serde(default)]
    pub deploy_top: usize,
}

impl HostConfig {
    #[must_use]
    pub fn spec(&self) -> HostSpec {
        HostSpec::new(HostId::new(self.id.clone()), self.address.clone(), self.max_capacity)
    }
}
