//! Application services (use cases).
//!
//! These services own the fleet state and orchestrate domain logic behind
//! the outbound ports. [`fleet::FleetEngine`] is the facade callers use.

pub mod deployment;
pub mod fleet;
pub mod population;
pub mod ranking;
pub mod registry;
pub mod scoring;
pub mod simulation;
pub mod training;
