//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (dataset files, remote execution hosts, screenshot storage).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌────────────┐
//! │ Dataset │            │    Host     │              │ Screenshot │
//! │ Adapter │            │  Transport  │              │  Adapter   │
//! └─────────┘            └─────────────┘              └────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`outbound::dataset::DatasetSource`] - Training data import
//! - [`outbound::host::HostTransport`] - Remote host connect and health checks
//! - [`outbound::screenshot::ScreenshotCapture`] - Best-effort chart captures

pub mod outbound;
