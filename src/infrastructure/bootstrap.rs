//! Composition root: builds the engine and its adapters from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::dataset::CsvDatasetSource;
use crate::adapter::outbound::http::HttpHostTransport;
use crate::adapter::outbound::screenshot::LoggingScreenshotCapture;
use crate::application::fleet::{EngineSettings, FleetEngine};
use crate::application::population::Fleet;
use crate::error::TrainingError;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::dataset::DatasetSource;
use crate::port::outbound::host::HostTransport;
use crate::port::outbound::screenshot::ScreenshotCapture;

/// Engine settings carried by `config`.
#[must_use]
pub fn engine_settings(config: &Config) -> EngineSettings {
    EngineSettings {
        scoring: config.scoring.clone(),
        training: config.training.clone(),
        deployment: config.deployment.clone(),
    }
}

/// Build the engine with the HTTP host transport.
#[must_use]
pub fn build_engine(config: &Config) -> FleetEngine {
    let transport = Arc::new(HttpHostTransport::new(config.deployment.request_timeout()));
    build_engine_with(config, transport)
}

/// Build the engine around a caller-supplied transport.
#[must_use]
pub fn build_engine_with(config: &Config, transport: Arc<dyn HostTransport>) -> FleetEngine {
    let agents = Fleet::generate(&config.fleet);
    info!(
        agents = agents.len(),
        seed = config.fleet.seed,
        transport = transport.name(),
        workers = config.training.effective_workers(),
        "Fleet generated"
    );
    FleetEngine::new(
        agents,
        engine_settings(config),
        transport,
        build_screenshots(config),
    )
}

fn build_screenshots(config: &Config) -> Option<Arc<dyn ScreenshotCapture>> {
    config
        .training
        .capture_godmode_screenshots
        .then(|| Arc::new(LoggingScreenshotCapture) as Arc<dyn ScreenshotCapture>)
}

/// Dataset source for `path`, or the configured dataset when `None`.
///
/// # Errors
///
/// Returns [`TrainingError::NoDatasetSource`] if neither is set.
pub fn dataset_source(
    config: &Config,
    path: Option<PathBuf>,
) -> Result<Arc<dyn DatasetSource>, TrainingError> {
    path.or_else(|| config.training.dataset.clone())
        .map(|p| Arc::new(CsvDatasetSource::new(p)) as Arc<dyn DatasetSource>)
        .ok_or(TrainingError::NoDatasetSource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::transport::ScriptedTransport;

    fn config(size: usize) -> Config {
        let mut config = Config::default();
        config.fleet.size = size;
        config
    }

    #[test]
    fn test_engine_gets_generated_fleet() {
        let engine = build_engine_with(&config(25), Arc::new(ScriptedTransport::new()));
        assert_eq!(engine.registry().len(), 25);
        assert_eq!(engine.fleet_stats().total_agents, 25);
    }

    #[test]
    fn test_dataset_source_prefers_explicit_path() {
        let mut config = config(1);
        config.training.dataset = Some("configured.csv".into());

        let explicit = dataset_source(&config, Some("explicit.csv".into())).unwrap();
        assert_eq!(explicit.describe(), "explicit.csv");
        let configured = dataset_source(&config, None).unwrap();
        assert_eq!(configured.describe(), "configured.csv");
    }

    #[test]
    fn test_dataset_source_missing() {
        let mut config = config(1);
        config.training.dataset = None;
        assert_eq!(
            dataset_source(&config, None).err(),
            Some(TrainingError::NoDatasetSource)
        );
    }
}
