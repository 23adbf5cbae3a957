//! End-to-end engine behaviour: training, ranking and fleet queries.

use std::sync::Arc;
use std::time::Duration;

use armada::application::fleet::{EngineSettings, FleetEngine};
use armada::application::population::Fleet;
use armada::domain::agent::{AgentStatus, StrategyKind};
use armada::domain::dataset::TrainingSample;
use armada::domain::id::AgentId;
use armada::domain::tier::{classify, Tier};
use armada::domain::training::SchedulerState;
use armada::error::TrainingError;
use armada::testkit::config;
use armada::testkit::dataset::SlowSource;
use armada::testkit::domain::{agents, dataset};
use armada::testkit::transport::ScriptedTransport;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn settings() -> EngineSettings {
    EngineSettings {
        scoring: config::scoring(),
        training: config::training(),
        deployment: config::deployment(config::fast_backoff(1)),
    }
}

fn engine(agents: Vec<armada::domain::agent::Agent>) -> FleetEngine {
    FleetEngine::new(
        agents,
        settings(),
        Arc::new(ScriptedTransport::new()),
        None,
    )
}

#[test]
fn top_performers_orders_by_confidence() {
    let engine = engine(agents(&[0.50, 0.96, 0.82]));

    let top = engine.top_performers(2);

    let view: Vec<_> = top.iter().map(|a| (a.id().get(), a.tier())).collect();
    assert_eq!(view, vec![(2, Tier::Godmode), (3, Tier::Elite)]);
}

#[test]
fn top_performers_is_prefix_stable() {
    let engine = engine(Fleet::generate(&config::fleet(300)));

    for n in [1, 10, 150] {
        let shorter = engine.top_performers(n);
        let longer = engine.top_performers(n + 1);
        assert_eq!(shorter.len(), n);
        assert!(shorter
            .iter()
            .zip(longer.iter())
            .all(|(a, b)| a.id() == b.id()));
    }
}

#[tokio::test]
async fn training_keeps_bounds_tiers_and_xp() {
    let engine = engine(Fleet::generate(&config::fleet(500)));
    let before = engine.registry().snapshot();

    let result = engine
        .start_training(Arc::new(dataset(120)))
        .await
        .unwrap();

    assert_eq!(result.agents_processed, 500);
    assert_eq!(result.failures, 0);
    let after = engine.registry().snapshot();
    assert_eq!(after.len(), 500);
    for agent in after.agents() {
        assert!((0.0..=1.0).contains(&agent.confidence()));
        assert_eq!(agent.tier(), classify(agent.confidence()));
        let old = before.get(agent.id()).unwrap();
        assert!(agent.xp() >= old.xp());
        assert_eq!(agent.status(), AgentStatus::Idle);
    }
    assert_eq!(engine.recent_results(), vec![result]);
}

#[tokio::test]
async fn malformed_sample_fails_one_agent_of_five_thousand() {
    let engine = engine(Fleet::generate(&config::fleet(5000)));
    let before = engine.agent(AgentId::new(42)).unwrap();
    let dataset = dataset(60).with_sample(AgentId::new(42), TrainingSample::new(3, 9, dec!(10)));

    let result = engine.start_training(Arc::new(dataset)).await.unwrap();

    assert_eq!(result.failures, 1);
    assert_eq!(result.failed_agents, vec![AgentId::new(42)]);
    assert_eq!(result.agents_processed, 4999);
    assert_eq!(engine.agent(AgentId::new(42)).unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_while_running() {
    let engine = Arc::new(engine(agents(&[0.4, 0.6])));
    let source = Arc::new(SlowSource::new(dataset(40), Duration::from_secs(5)));

    let running = {
        let engine = Arc::clone(&engine);
        let source = Arc::clone(&source);
        tokio::spawn(async move { engine.start_training_from(source.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(engine.scheduler_status().state, SchedulerState::Running);
    let version = engine.registry().version();

    let rejected = engine.start_training(Arc::new(dataset(40))).await;

    assert_eq!(rejected, Err(TrainingError::AlreadyRunning));
    assert_eq!(engine.registry().version(), version);
    assert!(running.await.unwrap().is_ok());
    assert_eq!(engine.scheduler_status().state, SchedulerState::Idle);
}

#[tokio::test]
async fn fleet_stats_follow_commits() {
    let engine = engine(Fleet::generate(&config::fleet(200)));
    let initial = engine.fleet_stats();
    assert_eq!(initial.total_agents, 200);
    assert_eq!(initial.godmode + initial.elite + initial.learning, 200);

    let result = engine
        .start_training(Arc::new(dataset(100)))
        .await
        .unwrap();

    let stats = engine.fleet_stats();
    assert_eq!(stats.version, result.committed_version);
    assert_eq!(stats.total_xp, initial.total_xp + result.total_xp_gained);
    assert!(stats.best_performer.is_some());
    let leader = engine.top_performers(1);
    assert_eq!(stats.best_performer.as_deref(), Some(leader[0].name()));
}

#[tokio::test]
async fn runaway_profit_fails_one_agent_and_stats_stay_available() {
    let engine = engine(Fleet::generate(&config::fleet(100)));
    let dataset = Arc::new(
        dataset(60).with_sample(AgentId::new(42), TrainingSample::new(3, 2, Decimal::MAX)),
    );
    engine.start_training(Arc::clone(&dataset)).await.unwrap();

    let second = engine.start_training(dataset).await.unwrap();

    assert_eq!(second.failures, 1);
    assert_eq!(second.agents_processed, 99);
    let stats = engine.fleet_stats();
    assert_eq!(stats.total_agents, 100);
    assert_eq!(stats.version, second.committed_version);
}

#[test]
fn strategy_filter_matches_round_robin_assignment() {
    let engine = engine(Fleet::generate(&config::fleet(100)));

    let scalpers = engine.agents_by_strategy(StrategyKind::ALL[0]);

    assert_eq!(scalpers.len(), 100 / StrategyKind::ALL.len());
    assert!(scalpers
        .iter()
        .all(|agent| agent.strategy() == StrategyKind::ALL[0]));
}
