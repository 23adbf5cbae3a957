//! Agent registry: the single source of truth for agent state.
//!
//! Readers receive an `Arc<FleetSnapshot>` of the last committed state and
//! never block on writers. Writers are serialized behind one mutex, build a
//! new snapshot off to the side, and publish it with a single pointer swap,
//! so a batch becomes visible all at once or not at all.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::domain::agent::{Agent, AgentStatus, AgentUpdate};
use crate::domain::error::DomainError;
use crate::domain::id::{AgentId, HostId};

/// Immutable view of the fleet at one committed version.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSnapshot {
    version: u64,
    committed_at: DateTime<Utc>,
    agents: Vec<Arc<Agent>>,
    index: HashMap<AgentId, usize>,
}

impl FleetSnapshot {
    fn new(version: u64, agents: Vec<Arc<Agent>>, index: HashMap<AgentId, usize>) -> Self {
        Self {
            version,
            committed_at: Utc::now(),
            agents,
            index,
        }
    }

    /// Monotonic commit counter; `0` for the initial population.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    /// Agents in id order.
    #[must_use]
    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Arc<Agent>> {
        self.index.get(&id).map(|&i| &self.agents[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Whether both snapshots hold identical agent state, ignoring version
    /// and commit time.
    #[must_use]
    pub fn same_agents(&self, other: &Self) -> bool {
        self.agents == other.agents
    }
}

/// Result of [`AgentRegistry::apply_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Version published by the commit.
    pub version: u64,
    /// Updates applied.
    pub applied: usize,
    /// Ids in the batch that do not exist in the registry.
    pub unknown: Vec<AgentId>,
}

/// Owner of all agents.
pub struct AgentRegistry {
    current: RwLock<Arc<FleetSnapshot>>,
    writer: Mutex<()>,
}

impl AgentRegistry {
    /// Create a registry from an initial population. Duplicate ids keep
    /// their first occurrence.
    #[must_use]
    pub fn new(agents: Vec<Agent>) -> Self {
        let mut sorted = agents;
        sorted.sort_by_key(Agent::id);
        let before = sorted.len();
        sorted.dedup_by_key(|a| a.id());
        if sorted.len() != before {
            warn!(
                dropped = before - sorted.len(),
                "Duplicate agent ids in initial population"
            );
        }

        let index = sorted
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id(), i))
            .collect();
        let agents = sorted.into_iter().map(Arc::new).collect();
        Self {
            current: RwLock::new(Arc::new(FleetSnapshot::new(0, agents, index))),
            writer: Mutex::new(()),
        }
    }

    /// Last committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        Arc::clone(&self.current.read())
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up one agent in the last committed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AgentNotFound`] for unknown ids.
    pub fn get(&self, id: AgentId) -> Result<Arc<Agent>, DomainError> {
        self.current
            .read()
            .get(id)
            .cloned()
            .ok_or(DomainError::AgentNotFound { id })
    }

    /// Apply all updates as one commit.
    ///
    /// Unknown ids are reported in the outcome and do not prevent the rest
    /// of the batch from committing. Only confidence, XP and statistics are
    /// touched, so status changes made while the batch was being computed
    /// survive the commit.
    pub fn apply_batch(&self, updates: &[AgentUpdate]) -> CommitOutcome {
        let mut unknown = Vec::new();
        let mut applied = 0;
        let version = self
            .write(|agents, index| {
                for update in updates {
                    match index.get(&update.id()) {
                        Some(&i) => {
                            Arc::make_mut(&mut agents[i]).apply(update);
                            applied += 1;
                        }
                        None => unknown.push(update.id()),
                    }
                }
                Ok::<_, DomainError>(())
            })
            .map(|(version, ())| version)
            .unwrap_or_else(|_| self.version());

        debug!(version, applied, unknown = unknown.len(), "Batch committed");
        CommitOutcome {
            version,
            applied,
            unknown,
        }
    }

    /// Change an agent's status.
    ///
    /// `Deployed` is owned by the deployment channel and can neither be
    /// entered nor left here.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::AgentNotFound`] or
    /// [`DomainError::InvalidTransition`].
    pub fn set_status(&self, id: AgentId, status: AgentStatus) -> Result<(), DomainError> {
        self.write(|agents, index| {
            let agent = lookup(agents, index, id)?;
            let from = agent.status();
            if status == AgentStatus::Deployed || from == AgentStatus::Deployed {
                return Err(DomainError::InvalidTransition { from, to: status });
            }
            from.transition(status)?;
            Arc::make_mut(agent).set_status(status)
        })
        .map(|_| ())
    }

    /// Mark an agent deployed on `host`.
    pub(crate) fn deploy(&self, id: AgentId, host: HostId) -> Result<(), DomainError> {
        self.write(|agents, index| {
            let agent = lookup(agents, index, id)?;
            agent.status().transition(AgentStatus::Deployed)?;
            Arc::make_mut(agent).deploy_to(host)
        })
        .map(|_| ())
    }

    /// Return a deployed agent to `Idle`, yielding the host it was on.
    pub(crate) fn release(&self, id: AgentId) -> Result<HostId, DomainError> {
        self.write(|agents, index| {
            let agent = lookup(agents, index, id)?;
            if agent.deployed_host().is_none() {
                return Err(DomainError::AgentNotDeployed { id });
            }
            Arc::make_mut(agent).release()
        })
        .map(|(_, host)| host)
    }

    /// Release every agent deployed on `host` in one commit.
    pub(crate) fn release_host(&self, host: &HostId) -> Vec<AgentId> {
        let mut released = Vec::new();
        let result = self.write(|agents, _| {
            for agent in agents.iter_mut() {
                if agent.deployed_host() == Some(host) {
                    let agent = Arc::make_mut(agent);
                    released.push(agent.id());
                    agent.release()?;
                }
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!(host_id = %host, error = %e, "Failed to release host agents");
            released.clear();
        }
        released
    }

    /// Run `mutate` against a private copy of the current snapshot and
    /// publish it as the next version if it succeeds.
    fn write<T, F>(&self, mutate: F) -> Result<(u64, T), DomainError>
    where
        F: FnOnce(&mut Vec<Arc<Agent>>, &HashMap<AgentId, usize>) -> Result<T, DomainError>,
    {
        let _guard = self.writer.lock();
        let base = self.snapshot();
        let mut agents = base.agents.clone();
        let value = mutate(&mut agents, &base.index)?;

        let version = base.version + 1;
        let next = FleetSnapshot::new(version, agents, base.index.clone());
        *self.current.write() = Arc::new(next);
        Ok((version, value))
    }
}

fn lookup<'a>(
    agents: &'a mut [Arc<Agent>],
    index: &HashMap<AgentId, usize>,
    id: AgentId,
) -> Result<&'a mut Arc<Agent>, DomainError> {
    match index.get(&id) {
        Some(&i) => Ok(&mut agents[i]),
        None => Err(DomainError::AgentNotFound { id }),
    }
}
