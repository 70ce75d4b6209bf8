//! Colony Simulation
//!
//! Runs a colony headless for a fixed number of ticks, writing a JSONL event
//! log and periodic JSON snapshots.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use colony_core::events::EventLogger;
use colony_core::output::{write_current_state, write_snapshot_to_dir, SnapshotGenerator};
use colony_core::{ColonyConfig, SimError, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "colony_sim")]
#[command(about = "A headless ant-colony simulation")]
struct Args {
    /// TOML configuration file (defaults to ./colony.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Number of workers spawned at start
    #[arg(long)]
    workers: Option<usize>,

    /// Interval between colony snapshots (in ticks, 0 disables them)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for events.jsonl and snapshots
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Do not write the event log
    #[arg(long)]
    no_events: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), SimError> {
    let mut config = match &args.config {
        Some(path) => ColonyConfig::from_file(path)?,
        None => ColonyConfig::load_or_default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(workers) = args.workers {
        config.simulation.initial_workers = workers;
    }
    if let Some(interval) = args.snapshot_interval {
        config.simulation.snapshot_interval = interval;
    }
    config.validate()?;
    let ticks = args.ticks.unwrap_or(config.simulation.default_ticks);

    println!("Colony Simulation");
    println!("=================");
    println!("Seed: {}", config.simulation.seed);
    println!("Ticks: {} ({:.1}s per tick)", ticks, config.simulation.tick_seconds);
    println!("Workers: {}", config.simulation.initial_workers);
    println!("Snapshot interval: {}", config.simulation.snapshot_interval);
    println!();

    fs::create_dir_all(args.output_dir.join("snapshots"))?;

    let mut sim = Simulation::new(config);
    if !args.no_events {
        let path = args.output_dir.join("events.jsonl");
        sim.set_logger(EventLogger::new(&path)?);
        info!("Writing events to {}", path.display());
    }
    println!("Populated colony: {}", sim.summary());

    let initial = sim.snapshot("simulation_start");
    write_snapshot_to_dir(&initial, &args.output_dir)?;
    write_current_state(&initial, &args.output_dir)?;

    let mut deaths = 0usize;
    let mut event_total = 0usize;
    for _ in 0..ticks {
        let events = sim.step();
        event_total += events.len();
        deaths += events.iter().filter(|e| e.is_death()).count();

        let tick = sim.tick();
        let due = sim.world.resource::<SnapshotGenerator>().should_snapshot(tick);
        if due {
            let snapshot = sim.snapshot("periodic");
            if let Err(e) = write_snapshot_to_dir(&snapshot, &args.output_dir) {
                warn!("Could not write snapshot at tick {}: {}", tick, e);
            }
            if let Err(e) = write_current_state(&snapshot, &args.output_dir) {
                warn!("Could not write current state at tick {}: {}", tick, e);
            }
            info!(
                "Tick {} / {}: {} workers, {} items, queen {}",
                tick,
                ticks,
                snapshot.summary.living_workers,
                snapshot.summary.total_items,
                if snapshot.summary.queen_alive { "alive" } else { "dead" }
            );
        }
    }

    let last = sim.snapshot("simulation_end");
    write_snapshot_to_dir(&last, &args.output_dir)?;
    write_current_state(&last, &args.output_dir)?;
    sim.flush_log()?;

    println!();
    println!(
        "Simulation complete. Ran {} ticks ({:.1}s simulated).",
        sim.tick(),
        sim.elapsed()
    );
    println!(
        "{} events, {} deaths, {} workers alive, queen {}.",
        event_total,
        deaths,
        last.summary.living_workers,
        if last.summary.queen_alive { "alive" } else { "dead" }
    );
    let generator = sim.world.resource::<SnapshotGenerator>();
    println!("Generated {} snapshots.", generator.snapshot_count());
    Ok(())
}
