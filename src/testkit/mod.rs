//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`] - Mock [`HostTransport`](crate::port::outbound::host::HostTransport)
//!   implementation: `ScriptedTransport`.
//! - [`dataset`] - Mock dataset sources: pending, slow, failing.
//! - [`screenshot`] - Recording and failing screenshot sinks.
//! - [`domain`] - Builders for agents, candles, datasets and hosts.
//! - [`config`] - Canonical test configurations (fast backoff, small fleets).

pub mod config;
pub mod dataset;
pub mod domain;
pub mod screenshot;
pub mod transport;
