//! Handler for `armada train`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tabled::{Table, Tabled};

use super::command::TrainArgs;
use super::diagnostic::{load_config, TrainingFailed};
use super::output;
use crate::adapter::outbound::dataset::CsvDatasetSource;
use crate::domain::agent::Agent;
use crate::domain::training::TrainingResult;
use crate::infrastructure::bootstrap;
use crate::port::outbound::dataset::DatasetSource;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Tabled)]
struct LeaderboardRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Agent")]
    name: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Focus")]
    focus: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "XP")]
    xp: u64,
    #[tabled(rename = "Win rate")]
    win_rate: String,
    #[tabled(rename = "P&L")]
    profit_loss: String,
    #[tabled(rename = "Grade")]
    grade: String,
}

impl LeaderboardRow {
    fn new(rank: usize, agent: &Agent) -> Self {
        Self {
            rank,
            name: agent.name().to_string(),
            strategy: agent.strategy().to_string(),
            focus: agent.specialization().to_string(),
            tier: agent.tier().to_string(),
            confidence: format!("{:.3}", agent.confidence()),
            xp: agent.xp(),
            win_rate: format!("{:.1}%", agent.win_rate() * 100.0),
            profit_loss: agent.profit_loss().round_dp(2).to_string(),
            grade: agent.performance_grade().to_string(),
        }
    }
}

/// Run one training cycle and print the result with the leaderboard.
///
/// # Errors
///
/// Fails when the configuration is invalid or the cycle cannot run.
pub async fn execute(args: &TrainArgs) -> miette::Result<()> {
    let config = load_config(&args.config)?;
    config.init_logging();

    let engine = bootstrap::build_engine(&config);
    let source = CsvDatasetSource::new(args.dataset.clone());

    if !output::is_json() {
        output::header(env!("CARGO_PKG_VERSION"));
        output::field("Dataset", source.describe());
        output::field("Agents", engine.registry().len());
        output::field("Workers", config.training.effective_workers());
    }

    let bar = output::progress(engine.registry().len() as u64, "Training");
    let training = engine.start_training_from(&source);
    tokio::pin!(training);
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let outcome = loop {
        tokio::select! {
            outcome = &mut training => break outcome,
            _ = poll.tick() => {
                let status = engine.scheduler_status();
                if status.total > 0 {
                    bar.set_length(status.total as u64);
                }
                bar.set_position(status.scored as u64);
            }
        }
    };

    let result = match outcome {
        Ok(result) => {
            output::progress_success(&bar, &format!("Cycle {} committed", result.cycle_id));
            result
        }
        Err(e) => {
            output::progress_fail(&bar, "Training failed");
            return Err(TrainingFailed::from(e).into());
        }
    };

    let top = engine.top_performers(args.top);
    if output::is_json() {
        let leaderboard: Vec<_> = top
            .iter()
            .enumerate()
            .map(|(i, agent)| leaderboard_json(i + 1, agent))
            .collect();
        output::json_output(json!({
            "result": result,
            "stats": engine.fleet_stats(),
            "leaderboard": leaderboard,
        }));
    } else {
        print_result(&result);
        print_leaderboard(&top);
    }

    engine.shutdown().await;
    Ok(())
}

fn print_result(result: &TrainingResult) {
    output::section("Result");
    output::field("Processed", result.agents_processed);
    if result.failures > 0 {
        output::field("Failures", output::negative(result.failures));
    } else {
        output::field("Failures", 0);
    }
    output::field("Skipped", result.skipped);
    output::field("Data points", result.data_points);
    output::field("Quality", format!("{:.1}", result.data_quality));
    output::field("XP gained", output::positive(result.total_xp_gained));
    output::field("Confidence", format!("{:+.3}", result.total_confidence_gained));
    output::field("New elite", result.new_elite_count);
    output::field("New godmode", output::highlight(result.new_godmode_count));
    output::field(
        "Duration",
        format!("{:.2}s", result.cycle_duration.as_secs_f64()),
    );
}

fn print_leaderboard(top: &[Arc<Agent>]) {
    output::section("Leaderboard");
    if top.is_empty() {
        output::hint("no agents ranked yet");
        return;
    }
    let rows: Vec<_> = top
        .iter()
        .enumerate()
        .map(|(i, agent)| LeaderboardRow::new(i + 1, agent))
        .collect();
    output::lines(&Table::new(rows).to_string());
}

fn leaderboard_json(rank: usize, agent: &Agent) -> serde_json::Value {
    json!({
        "rank": rank,
        "id": agent.id(),
        "name": agent.name(),
        "strategy": agent.strategy(),
        "specialization": agent.specialization(),
        "tier": agent.tier(),
        "confidence": agent.confidence(),
        "xp": agent.xp(),
        "win_rate": agent.win_rate(),
        "profit_loss": agent.profit_loss().round_dp(2),
        "grade": agent.performance_grade().to_string(),
    })
}
