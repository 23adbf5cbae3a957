//! Long-running engine lifecycle for `armada run`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use crate::application::fleet::FleetEngine;
use crate::domain::host::ConnectionState;
use crate::error::Result;
use crate::infrastructure::config::host::HostConfig;
use crate::port::outbound::dataset::DatasetSource;

/// How often fleet statistics are logged while running.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Connect every configured host and deploy top performers where asked.
///
/// Hosts are connected concurrently; a host that cannot be reached is
/// logged and left in `Error`.
pub async fn connect_hosts(engine: &FleetEngine, hosts: &[HostConfig]) {
    let attempts = hosts.iter().map(|host| async move {
        let state = engine.connect_deployment_host(host.spec()).await;
        (host, state)
    });

    for (host, state) in join_all(attempts).await {
        match state {
            Ok(ConnectionState::Connected) if host.deploy_top > 0 => {
                let id = host.spec().id;
                match engine.deploy_top_performers(&id, host.deploy_top) {
                    Ok(deployed) => {
                        info!(host_id = %id, deployed = deployed.len(), "Host ready");
                    }
                    Err(e) => warn!(host_id = %id, error = %e, "Deploying top performers failed"),
                }
            }
            Ok(ConnectionState::Connected) => info!(host_id = %host.id, "Host ready"),
            Ok(state) => warn!(host_id = %host.id, ?state, "Host unavailable"),
            Err(e) => error!(host_id = %host.id, error = %e, "Host connect rejected"),
        }
    }
}

/// Run until `shutdown` flips to `true`, then tear everything down.
///
/// # Errors
///
/// Returns an error if continuous training cannot be started.
pub async fn run_with_shutdown(
    engine: Arc<FleetEngine>,
    hosts: &[HostConfig],
    source: Arc<dyn DatasetSource>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    connect_hosts(&engine, hosts).await;

    let mut results = engine.subscribe();
    engine.start_continuous_training(Arc::clone(&source), interval)?;
    info!(
        dataset = %source.describe(),
        interval_secs = interval.as_secs(),
        "Continuous training started"
    );

    let mut stats_interval = tokio::time::interval(STATS_INTERVAL);
    stats_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown signal received");
                    break;
                }
            }
            received = results.recv() => match received {
                Ok(result) => info!(cycle_id = %result.cycle_id, "{}", result.summary()),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Training results dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = stats_interval.tick() => {
                let stats = engine.fleet_stats();
                let status = engine.scheduler_status();
                info!(
                    version = stats.version,
                    godmode = stats.godmode,
                    elite = stats.elite,
                    deployed = stats.deployed,
                    average_confidence = stats.average_confidence,
                    state = ?status.state,
                    completed_cycles = status.completed_cycles,
                    missed_ticks = status.missed_ticks,
                    "Fleet status"
                );
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

/// Run until Ctrl-C.
///
/// # Errors
///
/// See [`run_with_shutdown`].
pub async fn run(
    engine: Arc<FleetEngine>,
    hosts: &[HostConfig],
    source: Arc<dyn DatasetSource>,
    interval: Duration,
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });
    run_with_shutdown(engine, hosts, source, interval, shutdown_rx).await
}
