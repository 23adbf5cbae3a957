//! Screenshot sink that records captures in the log.
//!
//! Chart rendering lives outside the engine; this sink hands out stable
//! references and logs the agent's state at the moment of capture.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::domain::agent::Agent;
use crate::error::Result;
use crate::port::outbound::screenshot::{ScreenshotCapture, ScreenshotRef};

#[derive(Debug, Default)]
pub struct LoggingScreenshotCapture;

#[async_trait]
impl ScreenshotCapture for LoggingScreenshotCapture {
    async fn capture(&self, agent: &Agent, context: &str) -> Result<ScreenshotRef> {
        let taken_at = Utc::now();
        let reference = ScreenshotRef(format!(
            "agent-{}-{}",
            agent.id().get(),
            taken_at.format("%Y%m%dT%H%M%S")
        ));
        let record = json!({
            "agent": agent.name(),
            "tier": agent.tier().label(),
            "confidence": agent.confidence(),
            "xp": agent.xp(),
            "profit_loss": agent.profit_loss(),
        });
        info!(
            agent_id = %agent.id(),
            screenshot = %reference.0,
            context,
            record = %record,
            "Screenshot captured"
        );
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::agent;

    #[tokio::test]
    async fn test_reference_names_agent() {
        let shot = LoggingScreenshotCapture
            .capture(&agent(42, 0.97), "godmode")
            .await
            .unwrap();
        assert!(shot.0.starts_with("agent-42-"));
    }
}
