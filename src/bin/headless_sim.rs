//! Headless Simulation Runner
//!
//! Generates a world, populates it and runs a fixed number of ticks without
//! rendering. Used for soak and performance runs.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use wildgrove::core::config::SimulationConfig;
use wildgrove::core::error::Result;
use wildgrove::entity::species::{AgentKind, AnimalKind, Race};
use wildgrove::persistence::WorldSnapshot;
use wildgrove::simulation::events::SimulationEvent;
use wildgrove::simulation::manager::EntityManager;
use wildgrove::world::map::WorldMap;
use wildgrove::world::terrain::generate;

/// Headless Simulation Runner - run a populated world without a renderer
#[derive(Parser, Debug)]
#[command(name = "headless_sim")]
#[command(about = "Run the agent simulation headless and report population statistics")]
struct Args {
    /// World width in tiles
    #[arg(long, default_value_t = 128)]
    width: usize,

    /// World height in tiles
    #[arg(long, default_value_t = 128)]
    height: usize,

    /// Random seed for terrain and agents
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Surround the world with ocean
    #[arg(long)]
    island: bool,

    /// Chance for a tile to carry a resource
    #[arg(long, default_value_t = 0.15)]
    resource_density: f32,

    /// Creatures to spawn, spread across all races
    #[arg(long, default_value_t = 200)]
    creatures: usize,

    /// Animals to spawn, spread across all kinds
    #[arg(long, default_value_t = 300)]
    animals: usize,

    /// Ticks to run
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Log population every N ticks
    #[arg(long, default_value_t = 100)]
    report_every: u64,

    /// Optional TOML config overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON snapshot here when the run finishes
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Default)]
struct Tally {
    born: usize,
    died: usize,
    attacks: usize,
    harvested: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wildgrove=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let mut map = generate(
        args.width,
        args.height,
        args.seed as u32,
        args.island,
        args.resource_density,
    )?;
    let mut manager = EntityManager::new(config, args.seed)?;
    populate(&mut manager, &map, &args);
    tracing::info!(
        "Populated {}x{} world with {} agents",
        args.width,
        args.height,
        manager.len()
    );

    let start = Instant::now();
    let mut tally = Tally::default();
    for tick in 1..=args.ticks {
        for event in manager.update(args.dt, &mut map) {
            match event {
                SimulationEvent::Born { .. } => tally.born += 1,
                SimulationEvent::Died { .. } => tally.died += 1,
                SimulationEvent::Attacked { .. } => tally.attacks += 1,
                SimulationEvent::Harvested { amount, .. } => tally.harvested += amount,
                _ => {}
            }
        }
        if args.report_every > 0 && tick % args.report_every == 0 {
            report(&manager, tick);
        }
        if manager.is_empty() {
            tracing::warn!("Population died out at tick {}", tick);
            break;
        }
    }

    let elapsed = start.elapsed();
    tracing::info!(
        "Ran {} ticks in {:.2?} ({:.3} ms/tick): {} born, {} died, {} attacks, {:.0} harvested",
        manager.tick(),
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / manager.tick().max(1) as f64,
        tally.born,
        tally.died,
        tally.attacks,
        tally.harvested
    );
    report(&manager, manager.tick());

    if let Some(path) = &args.snapshot {
        WorldSnapshot::capture(&map, &manager).save(path)?;
    }
    Ok(())
}

fn populate(manager: &mut EntityManager, map: &WorldMap, args: &Args) {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(1));
    let kinds = Race::ALL
        .iter()
        .map(|r| (AgentKind::Creature(*r), args.creatures))
        .chain(
            AnimalKind::ALL
                .iter()
                .map(|a| (AgentKind::Animal(*a), args.animals)),
        );

    for (kind, total) in kinds {
        let share = match kind {
            AgentKind::Creature(_) => total / Race::ALL.len(),
            AgentKind::Animal(_) => total / AnimalKind::ALL.len(),
        };
        for _ in 0..share {
            let Some(pos) = map.random_walkable_position(&mut rng, 64) else {
                continue;
            };
            let jitter_x = rng.gen_range(-0.4..0.4);
            let jitter_y = rng.gen_range(-0.4..0.4);
            manager.spawn(kind, pos.x + jitter_x, pos.y + jitter_y, map);
        }
    }
}

fn report(manager: &EntityManager, tick: u64) {
    let creatures: usize = Race::ALL
        .iter()
        .map(|r| manager.count(Some(AgentKind::Creature(*r))))
        .sum();
    tracing::info!(
        "Tick {}: {} agents ({} creatures, {} animals)",
        tick,
        manager.len(),
        creatures,
        manager.len() - creatures
    );
}
