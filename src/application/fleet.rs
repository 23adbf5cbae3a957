//! Fleet engine: the single entry point callers use.
//!
//! Owns the registry and wires the ranking service, training scheduler and
//! deployment channel around it. Queries read the last committed snapshot;
//! commands delegate to the component that owns the state they change.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::deployment::{DeploymentChannel, DeploymentConfig};
use super::ranking::{Leaderboard, RankingService};
use super::registry::AgentRegistry;
use super::scoring::config::ScoringConfig;
use super::scoring::ScoringEngine;
use super::training::{TrainingConfig, TrainingScheduler};
use crate::domain::agent::{Agent, AgentStatus, Specialization, StrategyKind};
use crate::domain::dataset::Dataset;
use crate::domain::error::DomainError;
use crate::domain::host::{ConnectionState, DeploymentHost, HostSpec};
use crate::domain::id::{AgentId, HostId};
use crate::domain::stats::FleetStats;
use crate::domain::training::{SchedulerStatus, TrainingResult};
use crate::error::TrainingError;
use crate::port::outbound::dataset::DatasetSource;
use crate::port::outbound::host::HostTransport;
use crate::port::outbound::screenshot::ScreenshotCapture;

/// Per-component settings for [`FleetEngine::new`].
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub scoring: ScoringConfig,
    pub training: TrainingConfig,
    pub deployment: DeploymentConfig,
}

/// Training, ranking and deployment over one agent fleet.
pub struct FleetEngine {
    registry: Arc<AgentRegistry>,
    ranking: RankingService,
    scheduler: TrainingScheduler,
    deployment: DeploymentChannel,
}

impl FleetEngine {
    #[must_use]
    pub fn new(
        agents: Vec<Agent>,
        settings: EngineSettings,
        transport: Arc<dyn HostTransport>,
        screenshots: Option<Arc<dyn ScreenshotCapture>>,
    ) -> Self {
        let registry = Arc::new(AgentRegistry::new(agents));
        let scheduler = TrainingScheduler::new(
            Arc::clone(&registry),
            ScoringEngine::new(settings.scoring),
            settings.training,
            screenshots,
        );
        let deployment =
            DeploymentChannel::new(Arc::clone(&registry), transport, settings.deployment);
        info!(agents = registry.len(), "Fleet engine ready");
        Self {
            ranking: RankingService::new(Arc::clone(&registry)),
            registry,
            scheduler,
            deployment,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn scheduler(&self) -> &TrainingScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn deployment(&self) -> &DeploymentChannel {
        &self.deployment
    }

    // Queries

    /// Aggregate statistics over the last committed snapshot.
    #[must_use]
    pub fn fleet_stats(&self) -> FleetStats {
        let leaderboard = self.ranking.leaderboard();
        let mut stats = FleetStats::compute(
            leaderboard.iter().map(|a| &**a),
            leaderboard.leader().map(|a| &**a),
            leaderboard.version(),
        );
        stats.screenshots_captured = self.scheduler.screenshots_captured();
        stats
    }

    #[must_use]
    pub fn top_performers(&self, n: usize) -> Vec<Arc<Agent>> {
        self.ranking.top_performers(n)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<Leaderboard> {
        self.ranking.leaderboard()
    }

    /// # Errors
    ///
    /// Returns [`DomainError::AgentNotFound`] for unknown ids.
    pub fn agent(&self, id: AgentId) -> Result<Arc<Agent>, DomainError> {
        self.registry.get(id)
    }

    /// Agents running `strategy`, in leaderboard order.
    #[must_use]
    pub fn agents_by_strategy(&self, strategy: StrategyKind) -> Vec<Arc<Agent>> {
        self.filtered(|a| a.strategy() == strategy)
    }

    /// Agents with `specialization`, in leaderboard order.
    #[must_use]
    pub fn agents_by_specialization(&self, specialization: Specialization) -> Vec<Arc<Agent>> {
        self.filtered(|a| a.specialization() == specialization)
    }

    fn filtered(&self, keep: impl Fn(&Agent) -> bool) -> Vec<Arc<Agent>> {
        self.ranking
            .leaderboard()
            .iter()
            .filter(|a| keep(a))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn deployment_status(&self) -> Vec<DeploymentHost> {
        self.deployment.status()
    }

    #[must_use]
    pub fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    #[must_use]
    pub fn recent_results(&self) -> Vec<TrainingResult> {
        self.scheduler.recent_results()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrainingResult> {
        self.scheduler.subscribe()
    }

    // Training commands

    /// Run one training cycle on `dataset`.
    ///
    /// # Errors
    ///
    /// See [`TrainingScheduler::start_training`].
    pub async fn start_training(
        &self,
        dataset: Arc<Dataset>,
    ) -> Result<TrainingResult, TrainingError> {
        self.scheduler.start_training(dataset).await
    }

    /// Load from `source`, then run one training cycle.
    ///
    /// # Errors
    ///
    /// See [`TrainingScheduler::start_training_from`].
    pub async fn start_training_from(
        &self,
        source: &dyn DatasetSource,
    ) -> Result<TrainingResult, TrainingError> {
        self.scheduler.start_training_from(source).await
    }

    /// Start a cycle every `interval`, skipping ticks while one is running.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::ContinuousAlreadyRunning`] if already started.
    pub fn start_continuous_training(
        &self,
        source: Arc<dyn DatasetSource>,
        interval: Duration,
    ) -> Result<(), TrainingError> {
        self.scheduler.start_continuous_training(source, interval)
    }

    /// Stop the periodic ticker. An in-flight cycle runs to completion.
    pub fn stop_continuous_training(&self) -> bool {
        self.scheduler.stop_continuous_training()
    }

    pub fn cancel_training(&self) -> bool {
        self.scheduler.cancel_training()
    }

    // Deployment commands

    /// # Errors
    ///
    /// See [`DeploymentChannel::connect`].
    pub async fn connect_deployment_host(
        &self,
        host: HostSpec,
    ) -> Result<ConnectionState, DomainError> {
        self.deployment.connect(host).await
    }

    /// # Errors
    ///
    /// See [`DeploymentChannel::disconnect`].
    pub async fn disconnect_deployment_host(
        &self,
        host: &HostId,
    ) -> Result<Vec<AgentId>, DomainError> {
        self.deployment.disconnect(host).await
    }

    /// # Errors
    ///
    /// See [`DeploymentChannel::assign`].
    pub fn deploy_agent(&self, agent: AgentId, host: &HostId) -> Result<(), DomainError> {
        self.deployment.assign(agent, host)
    }

    /// # Errors
    ///
    /// See [`DeploymentChannel::unassign`].
    pub fn undeploy_agent(&self, agent: AgentId) -> Result<HostId, DomainError> {
        self.deployment.unassign(agent)
    }

    /// Deploy up to `n` of the best idle agents to `host`, stopping early
    /// when the host fills up.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::HostNotFound`] or
    /// [`DomainError::HostNotConnected`] if nothing can be deployed there.
    pub fn deploy_top_performers(
        &self,
        host: &HostId,
        n: usize,
    ) -> Result<Vec<AgentId>, DomainError> {
        let view = self
            .deployment
            .host(host)
            .ok_or_else(|| DomainError::HostNotFound { id: host.clone() })?;
        if !view.is_connected() {
            return Err(DomainError::HostNotConnected {
                id: host.clone(),
                state: view.connection_state,
            });
        }

        let mut deployed = Vec::new();
        let leaderboard = self.ranking.leaderboard();
        for agent in leaderboard.iter().filter(|a| a.status() == AgentStatus::Idle) {
            if deployed.len() == n {
                break;
            }
            match self.deployment.assign(agent.id(), host) {
                Ok(()) => deployed.push(agent.id()),
                Err(DomainError::CapacityExceeded { .. }) => break,
                Err(e @ DomainError::HostNotConnected { .. }) if deployed.is_empty() => {
                    return Err(e)
                }
                Err(DomainError::HostNotConnected { .. }) => break,
                // Status moved since the leaderboard was built.
                Err(e) => debug!(agent_id = %agent.id(), error = %e, "Skipping agent"),
            }
        }
        info!(host_id = %host, deployed = deployed.len(), requested = n, "Top performers deployed");
        Ok(deployed)
    }

    /// Stop training and disconnect every host.
    pub async fn shutdown(&self) {
        self.scheduler.stop_continuous_training();
        self.scheduler.cancel_training();
        self.deployment.shutdown().await;
        info!("Fleet engine stopped");
    }
}
