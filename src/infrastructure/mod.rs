//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration, wiring, health reporting and the process
//! lifecycle.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`health`] - Configuration health report
//! - [`runtime`] - Long-running loop with shutdown

pub mod bootstrap;
pub mod config;
pub mod health;
pub mod runtime;
