use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crosswalk_sim::autopilot::Autopilot;
use crosswalk_sim::leaderboard;
use crosswalk_sim::simulation::{
    DifficultyOracle, FixedOracle, GameEvent, GameSession, OracleDispatch, SimConfig,
    UnavailableOracle, MAX_PLAYER_AGE, MIN_PLAYER_AGE,
};

#[derive(Parser)]
#[command(name = "crosswalk_sim")]
#[command(about = "Headless street-crossing simulation")]
struct Cli {
    /// Number of frames to simulate
    #[arg(long, default_value = "3000")]
    ticks: u32,

    /// Simulated milliseconds per frame
    #[arg(long, default_value = "16")]
    delta: u64,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Player age, feeds the difficulty oracle
    #[arg(long, default_value = "8",
          value_parser = clap::value_parser!(u32).range(MIN_PLAYER_AGE as i64..=MAX_PLAYER_AGE as i64))]
    age: u32,

    /// Name stored with the score
    #[arg(long, default_value = "Player")]
    name: String,

    /// Let the built-in autopilot play
    #[arg(long)]
    autopilot: bool,

    /// Use an oracle that always predicts this difficulty
    #[arg(long, conflicts_with = "oracle_offline")]
    oracle_level: Option<f64>,

    /// Use an oracle that is never reachable
    #[arg(long)]
    oracle_offline: bool,

    /// Ask the oracle from a worker thread
    #[arg(long)]
    oracle_threaded: bool,

    /// Leaderboard file to record the final score in
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Print changed snapshots as JSON lines
    #[arg(long)]
    json: bool,

    /// Draw the street map with each summary
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,crosswalk_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    run_headless(cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: Cli) -> Result<()> {
    let config = SimConfig {
        seed: cli.seed,
        player_age: cli.age,
        player_name: cli.name.clone(),
        ..SimConfig::default()
    };

    let mut session = GameSession::new(config)?;

    let oracle: Option<Arc<dyn DifficultyOracle>> = if let Some(level) = cli.oracle_level {
        Some(Arc::new(FixedOracle(level)))
    } else if cli.oracle_offline {
        Some(Arc::new(UnavailableOracle))
    } else {
        None
    };
    if let Some(oracle) = oracle {
        let dispatch = if cli.oracle_threaded {
            OracleDispatch::Threaded
        } else {
            OracleDispatch::Inline
        };
        session = session.with_oracle(oracle, dispatch);
    }

    if let Some(path) = cli.scores.clone() {
        let name = cli.name.clone();
        session.subscribe(move |event| {
            if let GameEvent::GameOver { score } = event {
                leaderboard::record_best_effort(&path, &name, *score);
            }
        });
    }

    println!("Running crosswalk simulation in headless mode...");
    println!("Frames: {}, Delta: {}ms", cli.ticks, cli.delta);
    println!();

    session.start();
    let autopilot = Autopilot;

    // Print a summary once per simulated second
    let frames_per_second = (1000 / cli.delta.max(1)).max(1) as u32;

    for frame in 1..=cli.ticks {
        if cli.autopilot {
            if let Some(command) = autopilot.next_command(&session.snapshot()) {
                session.submit(command);
            }
        }
        session.advance(cli.delta);

        if cli.json {
            if let Some(snapshot) = session.take_snapshot_if_changed() {
                println!("{}", serde_json::to_string(&snapshot)?);
            }
        } else if frame % frames_per_second == 0 {
            let snapshot = session.snapshot();
            println!("--- After frame {} ---", frame);
            snapshot.print_summary();
            if cli.map {
                snapshot.draw_map();
            }
            println!();
        }

        if session.is_game_over() {
            break;
        }
    }

    if !cli.json {
        println!("=== Final State ===");
        let snapshot = session.snapshot();
        snapshot.print_summary();
        if cli.map {
            snapshot.draw_map();
        }
    }

    let stats = session.teardown();
    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", stats.elapsed_ms as f64 / 1000.0);
    info!("Final score: {}", stats.score);
    info!("Lives left: {:.1}", stats.lives);
    info!("Difficulty level: {}", stats.difficulty_level);
    info!("Crossings completed: {}", stats.crossings);
    info!("Collisions: {}", stats.collisions);
    info!("Rule violations: {}", stats.violations);
    info!("Vehicles spawned: {}", stats.vehicles_spawned);
    info!("Light transitions: {}", stats.light_transitions);
    Ok(())
}
