//! Tile Sim - interactive entry point
//!
//! Loads a scenario (the built-in ambush unless a TOML path is given) and
//! lets you step the simulation by hand, inspect the map and entity states,
//! and spawn or remove entities between ticks.

use std::io::{self, Write};
use std::path::Path;

use tile_sim::core::error::Result;
use tile_sim::core::types::{EntityId, TileCoord};
use tile_sim::core::SimulationConfig;
use tile_sim::ecs::SimWorld;
use tile_sim::entity::EntityAttributes;
use tile_sim::simulation::{Scheduler, SimEvent};
use tile_sim::world::{snapshot, status, ScenarioSpec};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tile_sim=info")),
        )
        .init();

    let scenario = match std::env::args().nth(1) {
        Some(path) => ScenarioSpec::load_from_file(Path::new(&path))?,
        None => ScenarioSpec::ambush(),
    };

    let config = SimulationConfig::default();
    let mut world = scenario.build(&config)?;
    let mut scheduler = Scheduler::new(config.clone())?;

    tracing::info!("Tile Sim starting with scenario '{}'", scenario.name);

    println!("\n=== TILE SIM ===");
    println!("Scenario: {} ({}x{})", scenario.name, scenario.width, scenario.height);
    println!();
    println!("Commands:");
    println!("  tick / t            - Advance simulation by one tick");
    println!("  run <n>             - Run n ticks");
    println!("  map / m             - Show the map around the entities");
    println!("  status / s          - Show entity status");
    println!("  json                - Dump entity status as JSON");
    println!("  spawn <id> <x> <y>  - Spawn a passive entity");
    println!("  remove <id>         - Remove an entity");
    println!("  quit / q            - Exit");
    println!();

    loop {
        print!("[tick {}] > ", scheduler.current_tick());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();

        match words.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            ["tick"] | ["t"] => {
                let events = scheduler.tick(&mut world);
                print_events(&events);
            }
            ["run", n] => match n.parse::<u64>() {
                Ok(n) => {
                    let events = scheduler.run_ticks(&mut world, n);
                    print_events(&events);
                    println!("Now at tick {}.", scheduler.current_tick());
                }
                Err(_) => println!("Usage: run <number>"),
            },
            ["map"] | ["m"] => display_map(&world),
            ["status"] | ["s"] => {
                for line in status(&world) {
                    println!("{}", line);
                }
            }
            ["json"] => println!("{}", serde_json::to_string_pretty(&status(&world))?),
            ["spawn", id, x, y] => match (id.parse::<u32>(), x.parse::<i32>(), y.parse::<i32>()) {
                (Ok(id), Ok(x), Ok(y)) => {
                    match world.add_entity(EntityId(id), &EntityAttributes::at(x, y), &config) {
                        Ok(entity) => println!("Spawned {} at {}", entity.id, entity.position),
                        Err(e) => println!("Rejected: {}", e),
                    }
                }
                _ => println!("Usage: spawn <id> <x> <y>"),
            },
            ["remove", id] => match id.parse::<u32>() {
                Ok(id) => match world.remove_entity(EntityId(id)) {
                    Ok(entity) => println!("Removed {}", entity.display_name()),
                    Err(e) => println!("{}", e),
                },
                Err(_) => println!("Usage: remove <id>"),
            },
            _ => println!("Unknown command: {}", input.trim()),
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_events(events: &[SimEvent]) {
    for event in events {
        println!("  {}", event.describe());
    }
}

/// Window around the bounding box of all entities, padded by a few tiles
fn display_map(world: &SimWorld) {
    const PAD: i32 = 4;
    let mut min = TileCoord::new(i32::MAX, i32::MAX);
    let mut max = TileCoord::new(i32::MIN, i32::MIN);
    for entity in world.entities() {
        let far = entity.footprint().max_corner();
        min = TileCoord::new(min.x.min(entity.position.x), min.y.min(entity.position.y));
        max = TileCoord::new(max.x.max(far.x), max.y.max(far.y));
    }
    if world.entity_count() == 0 {
        min = TileCoord::new(0, 0);
        max = TileCoord::new(world.grid().width as i32 - 1, world.grid().height as i32 - 1);
    }

    let origin = min.offset(-PAD, -PAD);
    let width = (max.x - min.x + 1 + 2 * PAD).max(1) as u32;
    let height = (max.y - min.y + 1 + 2 * PAD).max(1) as u32;
    let view = snapshot(world, origin, width, height);
    println!("Map from {} ({}x{}):", view.origin, view.width, view.height);
    print!("{}", view);
}
