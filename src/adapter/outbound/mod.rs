//! Outbound adapters (driven side).

pub mod dataset;
pub mod http;
pub mod screenshot;
