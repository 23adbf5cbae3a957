//! Armada - training, ranking and deployment for agent fleets.
//!
//! Keeps a registry of thousands of simulated trading agents, replays
//! historical market data through them in parallel training cycles, ranks
//! them by confidence and XP, and places the best on remote execution hosts
//! over a monitored deployment channel.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Agents, tiers, hosts, datasets and training outcomes
//! - [`port`] - Traits for datasets, host transports and screenshot sinks
//! - [`application`] - Registry, scoring, training scheduler, ranking and
//!   deployment channel, composed by [`application::fleet::FleetEngine`]
//! - [`adapter`] - CSV datasets, HTTP hosts, screenshot logging and the CLI
//! - [`infrastructure`] - Configuration, wiring, health report and runtime
//!
//! # Example
//!
//! ```no_run
//! use armada::infrastructure::bootstrap;
//! use armada::infrastructure::config::settings::Config;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("config.toml")?;
//! let engine = bootstrap::build_engine(&config);
//! let source = bootstrap::dataset_source(&config, None)?;
//! let result = engine.start_training_from(source.as_ref()).await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
