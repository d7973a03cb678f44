//! Fleet AI sandbox
//! Two settled factions share an island while the pirates roam the sea

use armada_ai::core::config::AiConfig;
use armada_ai::core::types::{FactionId, Point};
use armada_ai::sandbox::{run_tick, SandboxWorld};
use armada_ai::world::{FactionStats, IslandId, UnitKind, WorldView};
use armada_ai::{FactionAi, FinishedMission, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fleet sim - run the faction AI against a small deterministic world
#[derive(Parser, Debug)]
#[command(name = "fleet_sim")]
#[command(about = "Run two AI factions and the pirates in a sandbox sea")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 2000)]
    ticks: u64,

    /// TOML file overriding the default AI tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Log every decision
    #[arg(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

/// End-of-run summary of one faction
#[derive(Debug, Serialize)]
struct FactionSummary {
    faction: FactionId,
    profile: &'static str,
    ships: usize,
    active_missions: usize,
    finished: Vec<FinishedMission>,
}

const EAST: FactionId = FactionId(1);
const WEST: FactionId = FactionId(2);
const PIRATES: FactionId = FactionId(9);

fn build_world() -> SandboxWorld {
    let mut world = SandboxWorld::new(200.0, 200.0);
    world.add_faction(EAST, false, Point::new(150.0, 40.0));
    world.add_faction(WEST, false, Point::new(40.0, 50.0));
    world.add_faction(PIRATES, true, Point::new(100.0, 180.0));

    // Both settled the central island
    world.set_islands(EAST, vec![IslandId(1), IslandId(2)]);
    world.set_islands(WEST, vec![IslandId(2), IslandId(3)]);
    world.add_settlement(EAST, Point::new(110.0, 90.0));
    world.add_settlement(WEST, Point::new(90.0, 100.0));

    world.set_stats(
        EAST,
        FactionStats { gold: 1200.0, inventory_value: 400.0, territory: 30.0, settlements: 2 },
    );
    world.set_stats(
        WEST,
        FactionStats { gold: 800.0, inventory_value: 600.0, territory: 25.0, settlements: 2 },
    );

    for i in 0..4 {
        let offset = i as f64 * 3.0;
        world.spawn_unit(EAST, UnitKind::Frigate, Point::new(145.0 + offset, 45.0), 100.0);
        world.spawn_unit(WEST, UnitKind::Frigate, Point::new(45.0 + offset, 55.0), 100.0);
    }
    world.spawn_unit(EAST, UnitKind::Trader, Point::new(130.0, 60.0), 40.0);
    world.spawn_unit(WEST, UnitKind::Fisher, Point::new(60.0, 70.0), 30.0);
    world.spawn_unit(WEST, UnitKind::Trader, Point::new(70.0, 80.0), 40.0);
    for i in 0..3 {
        world.spawn_unit(PIRATES, UnitKind::PirateShip, Point::new(95.0 + i as f64 * 4.0, 175.0), 80.0);
    }
    world
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "armada_ai=debug" } else { "armada_ai=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = match &args.config {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    };

    if args.format != "json" {
        println!("=== FLEET SIM ===");
        println!("Seed: {}  Ticks: {}\n", args.seed, args.ticks);
    }

    let mut world = build_world();
    let mut factions = vec![
        FactionAi::new(EAST, false, args.seed, config.clone())?,
        FactionAi::new(WEST, false, args.seed.wrapping_add(1), config.clone())?,
        FactionAi::new(PIRATES, true, args.seed.wrapping_add(2), config)?,
    ];
    if args.format != "json" {
        for ai in &factions {
            println!("{} plays the {} profile", ai.faction(), ai.profile_name());
        }
    }

    for _ in 0..args.ticks {
        run_tick(&mut world, &mut factions);
    }

    let summaries: Vec<FactionSummary> = factions
        .iter()
        .map(|ai| FactionSummary {
            faction: ai.faction(),
            profile: ai.profile_name(),
            ships: world.units_of(ai.faction()).len(),
            active_missions: ai.missions().count(),
            finished: ai.finished_missions().to_vec(),
        })
        .collect();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("\n--- After {} ticks ---", world.tick);
    for summary in &summaries {
        let successes = summary.finished.iter().filter(|m| m.success).count();
        println!(
            "{} ({}): {} ships, {} active missions, {} finished ({} succeeded)",
            summary.faction,
            summary.profile,
            summary.ships,
            summary.active_missions,
            summary.finished.len(),
            successes
        );
        for mission in summary.finished.iter().rev().take(5) {
            let outcome = if mission.success { "ok" } else { "failed" };
            println!("    {} {} [{}] {}", mission.id, mission.kind, outcome, mission.message);
        }
    }
    println!(
        "\nRelations: east-west {:?}, east-pirates {:?}",
        world.relation(EAST, WEST),
        world.relation(EAST, PIRATES)
    );

    Ok(())
}
