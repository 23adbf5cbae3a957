//! Deployment through the engine: capacity, cascades and health checks.

use std::sync::Arc;
use std::time::Duration;

use armada::application::fleet::{EngineSettings, FleetEngine};
use armada::domain::agent::AgentStatus;
use armada::domain::error::DomainError;
use armada::domain::host::ConnectionState;
use armada::domain::id::{AgentId, HostId};
use armada::testkit::config;
use armada::testkit::domain::{agents, dataset, host};
use armada::testkit::transport::ScriptedTransport;

fn engine_with(transport: Arc<ScriptedTransport>, max_attempts: u32) -> FleetEngine {
    let backoff = if max_attempts == 5 {
        config::backoff()
    } else {
        config::fast_backoff(max_attempts)
    };
    FleetEngine::new(
        agents(&[0.50, 0.96, 0.82, 0.70, 0.99]),
        EngineSettings {
            scoring: config::scoring(),
            training: config::training(),
            deployment: config::deployment(backoff),
        },
        transport,
        None,
    )
}

fn id(n: u32) -> AgentId {
    AgentId::new(n)
}

#[tokio::test]
async fn third_assign_exceeds_capacity_of_two() {
    let engine = engine_with(Arc::new(ScriptedTransport::new()), 1);
    let vps = HostId::new("vps-1");
    engine
        .connect_deployment_host(host("vps-1", 2))
        .await
        .unwrap();

    engine.deploy_agent(id(1), &vps).unwrap();
    engine.deploy_agent(id(2), &vps).unwrap();
    let third = engine.deploy_agent(id(3), &vps);

    assert!(matches!(third, Err(DomainError::CapacityExceeded { .. })));
    assert_eq!(engine.agent(id(3)).unwrap().status(), AgentStatus::Idle);
    let status = engine.deployment_status();
    assert_eq!(status[0].current_load, 2);
}

#[tokio::test]
async fn deploy_top_performers_picks_leaders() {
    let engine = engine_with(Arc::new(ScriptedTransport::new()), 1);
    let vps = HostId::new("vps-1");
    engine
        .connect_deployment_host(host("vps-1", 3))
        .await
        .unwrap();

    let deployed = engine.deploy_top_performers(&vps, 10).unwrap();

    assert_eq!(deployed, vec![id(5), id(2), id(3)]);
    assert_eq!(engine.fleet_stats().deployed, 3);
    assert_eq!(
        engine.agent(id(5)).unwrap().deployed_host(),
        Some(&vps)
    );
}

#[tokio::test]
async fn disconnect_returns_agents_to_idle() {
    let engine = engine_with(Arc::new(ScriptedTransport::new()), 1);
    let vps = HostId::new("vps-1");
    engine
        .connect_deployment_host(host("vps-1", 5))
        .await
        .unwrap();
    engine.deploy_agent(id(1), &vps).unwrap();
    engine.deploy_agent(id(4), &vps).unwrap();

    let released = engine.disconnect_deployment_host(&vps).await.unwrap();

    assert_eq!(released, vec![id(1), id(4)]);
    for agent in [id(1), id(4)] {
        let agent = engine.agent(agent).unwrap();
        assert_eq!(agent.status(), AgentStatus::Idle);
        assert!(agent.deployed_host().is_none());
    }
    assert_eq!(engine.deployment_status()[0].current_load, 0);
}

#[tokio::test(start_paused = true)]
async fn failing_health_checks_end_in_error_and_release_agents() {
    let transport = Arc::new(ScriptedTransport::new());
    let engine = engine_with(Arc::clone(&transport), 5);
    let vps = HostId::new("vps-1");
    engine
        .connect_deployment_host(host("vps-1", 4))
        .await
        .unwrap();
    engine.deploy_agent(id(2), &vps).unwrap();
    engine.deploy_agent(id(5), &vps).unwrap();

    transport.set_healthy(false);
    // First failing ping at 30s, retries after 1, 2, 4, 8 and 16 seconds.
    tokio::time::sleep(Duration::from_secs(62)).await;

    let status = engine.deployment_status();
    assert_eq!(status[0].connection_state, ConnectionState::Error);
    assert_eq!(status[0].current_load, 0);
    for agent in [id(2), id(5)] {
        assert_eq!(engine.agent(agent).unwrap().status(), AgentStatus::Idle);
    }
    assert!(matches!(
        engine.deploy_agent(id(1), &vps),
        Err(DomainError::HostNotConnected { .. })
    ));
}

#[tokio::test]
async fn training_counts_live_eligible_agents() {
    let engine = engine_with(Arc::new(ScriptedTransport::new()), 1);
    let vps = HostId::new("vps-1");
    engine
        .connect_deployment_host(host("vps-1", 2))
        .await
        .unwrap();
    engine.deploy_agent(id(2), &vps).unwrap();

    let result = engine
        .start_training(Arc::new(dataset(60)))
        .await
        .unwrap();

    assert_eq!(result.live_eligible, 1);
    assert_eq!(result.agents_processed, 5);
    assert_eq!(engine.agent(id(2)).unwrap().status(), AgentStatus::Deployed);
}

#[tokio::test]
async fn unreachable_host_reports_error_state() {
    let transport = Arc::new(ScriptedTransport::unreachable());
    let engine = engine_with(Arc::clone(&transport), 3);

    let state = engine
        .connect_deployment_host(host("vps-1", 2))
        .await
        .unwrap();

    assert_eq!(state, ConnectionState::Error);
    assert_eq!(transport.connect_count(), 3);
    assert_eq!(engine.deployment_status()[0].consecutive_failures, 3);
}

#[tokio::test]
async fn shutdown_disconnects_every_host() {
    let transport = Arc::new(ScriptedTransport::new());
    let engine = engine_with(Arc::clone(&transport), 1);
    for name in ["a", "b"] {
        engine.connect_deployment_host(host(name, 1)).await.unwrap();
    }
    engine.deploy_agent(id(3), &HostId::new("b")).unwrap();

    engine.shutdown().await;

    assert!(engine
        .deployment_status()
        .iter()
        .all(|h| h.connection_state == ConnectionState::Disconnected));
    assert_eq!(engine.agent(id(3)).unwrap().status(), AgentStatus::Idle);
    assert_eq!(transport.disconnect_count(), 2);
}
