//! Headless Scenario Runner
//!
//! Runs a scenario for a fixed number of ticks (or in real time until
//! Ctrl-C) and prints the event stream as JSON lines or text.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tile_sim::core::error::Result;
use tile_sim::core::types::Tick;
use tile_sim::core::SimulationConfig;
use tile_sim::simulation::{Scheduler, SimEvent};
use tile_sim::world::{snapshot, state_counts, status, EntityStatus, ScenarioSpec};
use tile_sim::TileCoord;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Headless Scenario Runner - step a tile simulation and stream its events
#[derive(Parser, Debug)]
#[command(name = "scenario_runner")]
#[command(about = "Run a tile simulation scenario and print its events")]
struct Args {
    /// Scenario TOML file (defaults to the built-in ambush)
    scenario: Option<PathBuf>,

    /// Simulation config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run headless
    #[arg(long, default_value_t = 20)]
    ticks: u64,

    /// Run in real time at the configured tick rate until Ctrl-C
    #[arg(long)]
    realtime: bool,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print the final map (text format only)
    #[arg(long)]
    map: bool,
}

#[derive(Serialize)]
struct TickedEvent<'a> {
    tick: Tick,
    #[serde(flatten)]
    event: &'a SimEvent,
}

#[derive(Serialize)]
struct RunSummary {
    scenario: String,
    ticks: Tick,
    seed: u64,
    events: usize,
    entities: Vec<EntityStatus>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tile_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_toml(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let scenario = match &args.scenario {
        Some(path) => ScenarioSpec::load_from_file(path)?,
        None => ScenarioSpec::ambush(),
    };

    let mut world = scenario.build(&config)?;
    let mut scheduler = Scheduler::new(config.clone())?;
    let json = match args.format.as_str() {
        "json" => true,
        "text" => false,
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            true
        }
    };

    let mut event_count = 0usize;
    let mut emit = |tick: Tick, events: &[SimEvent]| {
        event_count += events.len();
        for event in events {
            if json {
                match serde_json::to_string(&TickedEvent { tick, event }) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to encode event: {}", e),
                }
            } else {
                println!("[{:>5}] {}", tick, event.describe());
            }
        }
    };

    if args.realtime {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(true);
            }
        });
        scheduler.run(&mut world, rx, &mut emit).await;
    } else {
        for _ in 0..args.ticks {
            let tick = scheduler.current_tick();
            let events = scheduler.tick(&mut world);
            emit(tick, &events);
        }
    }

    let summary = RunSummary {
        scenario: scenario.name.clone(),
        ticks: scheduler.current_tick(),
        seed: config.seed,
        events: event_count,
        entities: status(&world),
    };

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!();
        println!("Scenario Result");
        println!("===============");
        println!("Scenario: {}", summary.scenario);
        println!("Ticks: {}", summary.ticks);
        println!("Events: {}", summary.events);
        println!("Seed: {}", summary.seed);
        for (state, count) in state_counts(&world) {
            println!("  {:<9} {}", state.to_string(), count);
        }
        for entity in &summary.entities {
            println!("{}", entity);
        }
        if args.map {
            let view = snapshot(
                &world,
                TileCoord::new(0, 0),
                world.grid().width,
                world.grid().height,
            );
            println!();
            print!("{}", view);
        }
    }

    Ok(())
}
