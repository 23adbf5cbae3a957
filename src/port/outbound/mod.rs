//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as dataset
//! storage, deployment hosts, and screenshot capture.

pub mod dataset;
pub mod host;
pub mod screenshot;
