//! Mock [`ScreenshotCapture`] implementations for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::agent::Agent;
use crate::domain::id::AgentId;
use crate::error::{Error, Result};
use crate::port::outbound::screenshot::{ScreenshotCapture, ScreenshotRef};

/// Records every capture request.
#[derive(Default)]
pub struct RecordingScreenshots {
    captured: Mutex<Vec<(AgentId, String)>>,
}

impl RecordingScreenshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<(AgentId, String)> {
        self.captured.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ScreenshotCapture for RecordingScreenshots {
    async fn capture(&self, agent: &Agent, context: &str) -> Result<ScreenshotRef> {
        if let Ok(mut captured) = self.captured.lock() {
            captured.push((agent.id(), context.to_string()));
        }
        Ok(ScreenshotRef(format!("mem://{}", agent.id().get())))
    }
}

/// Fails every capture.
pub struct FailingScreenshots;

#[async_trait]
impl ScreenshotCapture for FailingScreenshots {
    async fn capture(&self, _agent: &Agent, _context: &str) -> Result<ScreenshotRef> {
        Err(Error::Connection("screenshot service down".into()))
    }
}
