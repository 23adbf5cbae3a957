//! Exchange-agnostic fleet domain: agents, tiers, hosts, datasets.

pub mod agent;
pub mod dataset;
pub mod error;
pub mod host;
pub mod id;
pub mod stats;
pub mod tier;
pub mod training;

pub use agent::{
    Agent, AgentStats, AgentStatus, AgentUpdate, EngineKind, PerformanceGrade, Specialization,
    StrategyKind,
};
pub use dataset::{Candle, Dataset, TrainingSample};
pub use error::DomainError;
pub use host::{ConnectionState, DeploymentHost, HostSpec};
pub use id::{AgentId, CycleId, HostId};
pub use stats::FleetStats;
pub use tier::{classify, Tier};
pub use training::{SchedulerState, SchedulerStatus, TrainingResult};
