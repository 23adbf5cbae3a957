//! Screenshot port for capturing agent charts.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::agent::Agent;
use crate::error::Result;

/// Opaque reference to a stored screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotRef(pub String);

/// Best-effort screenshot capture. Failures never affect training.
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    async fn capture(&self, agent: &Agent, context: &str) -> Result<ScreenshotRef>;
}
