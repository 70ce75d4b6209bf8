//! Colony Setup
//!
//! Resource initialization and the initial population: terrain, deposits,
//! the queen, the first workers and a scattering of items.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::info;

use colony_events::ResourceKind;

use crate::components::{Colony, IdAllocator, Item, SimClock};
use crate::config::ColonyConfig;
use crate::environment::EnvironmentField;
use crate::events::{EventLogger, TickEvents};
use crate::output::SnapshotGenerator;
use crate::systems::spawning::reject;
use crate::systems::{
    living_workers, spawn_item, spawn_queen, spawn_worker, ItemSpawner, OrganizationState,
    SpaceTracker,
};
use crate::terrain::Terrain;
use crate::SimRng;

/// Insert every resource the schedule reads, keeping any already present
pub fn insert_resources(world: &mut World, config: &ColonyConfig) {
    if !world.contains_resource::<SimRng>() {
        world.insert_resource(SimRng(SmallRng::seed_from_u64(config.simulation.seed)));
    }
    if !world.contains_resource::<SimClock>() {
        world.insert_resource(SimClock::new(config.simulation.tick_seconds));
    }
    if !world.contains_resource::<Terrain>() {
        world.insert_resource(Terrain::generate(&config.terrain));
    }
    if !world.contains_resource::<Colony>() {
        world.insert_resource(Colony::from_config(&config.deposits));
    }
    if !world.contains_resource::<EnvironmentField>() {
        world.insert_resource(EnvironmentField::from_config(&config.environment));
    }
    if !world.contains_resource::<IdAllocator>() {
        world.insert_resource(IdAllocator::new());
    }
    if !world.contains_resource::<TickEvents>() {
        world.insert_resource(TickEvents::new());
    }
    if !world.contains_resource::<EventLogger>() {
        world.insert_resource(EventLogger::null());
    }
    if !world.contains_resource::<SpaceTracker>() {
        world.insert_resource(SpaceTracker::new(config.space.interval));
    }
    if !world.contains_resource::<OrganizationState>() {
        world.insert_resource(OrganizationState::new(config.organization.request_interval));
    }
    if !world.contains_resource::<ItemSpawner>() {
        world.insert_resource(ItemSpawner::new(config.spawning.item_interval));
    }
    if !world.contains_resource::<SnapshotGenerator>() {
        world.insert_resource(SnapshotGenerator::new(config.simulation.snapshot_interval));
    }
    world.insert_resource(config.clone());
}

/// Spawn the queen, `config.simulation.initial_workers` workers and the
/// initial items. Refused spawns are reported and skipped.
pub fn populate_colony(world: &mut World, config: &ColonyConfig) -> SpawnSummary {
    let queen_at = Vec3::from_array(config.simulation.queen_position);

    world.resource_scope(|world, mut rng: Mut<SimRng>| {
        let rng = &mut rng.0;
        if let Err(e) = spawn_queen(world, config, queen_at, rng) {
            reject(world, e);
        }

        for _ in 0..config.simulation.initial_workers {
            let at = world
                .get_resource::<Terrain>()
                .map(|t| t.random_point(rng))
                .unwrap_or(queen_at);
            if let Err(e) = spawn_worker(world, config, at, rng) {
                reject(world, e);
                break;
            }
        }

        // alternate kinds so both deposits have work from the start
        for i in 0..config.spawning.initial_items {
            let kind = if i % 2 == 0 {
                ResourceKind::Food
            } else {
                ResourceKind::Water
            };
            let at = world
                .get_resource::<Terrain>()
                .map(|t| t.random_point(rng))
                .unwrap_or(queen_at);
            if let Err(e) = spawn_item(world, config, kind, at) {
                reject(world, e);
                break;
            }
        }
    });

    let summary = spawn_summary(world);
    info!(
        "Colony populated: {} workers, {} items",
        summary.workers, summary.items
    );
    summary
}

/// Get summary counts for the current population
pub fn spawn_summary(world: &mut World) -> SpawnSummary {
    let queen = world
        .get_resource::<Colony>()
        .and_then(|c| c.queen)
        .is_some();
    let workers = living_workers(world);
    let items = world.query::<&Item>().iter(world).count();
    SpawnSummary {
        queen,
        workers,
        items,
    }
}

/// Summary of spawned agents and items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSummary {
    pub queen: bool,
    pub workers: usize,
    pub items: usize,
}

impl std::fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "queen: {}, workers: {}, items: {}",
            if self.queen { "yes" } else { "no" },
            self.workers,
            self.items
        )
    }
}
