//! Spawning
//!
//! Creation of agents and items, the periodic item spawner and the queen's
//! brood. Caps are enforced here; a refused spawn is reported and logged but
//! never stops the run.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;
use tracing::{info, warn};

use colony_events::{AgentRole, EventKind, ResourceKind, StatType};

use crate::behavior::{is_living_agent, BehaviorArbiter, BehaviorSet};
use crate::components::{
    AgentId, Alive, AmbientOffset, Brood, Colony, IdAllocator, IntervalTimer, Item, ItemId,
    Mover, Picker, Position, Role, SimClock, StatTable, Supply,
};
use crate::config::ColonyConfig;
use crate::error::SpawnError;
use crate::events::emit;
use crate::terrain::Terrain;
use crate::SimRng;

/// Put `position` on the terrain surface, refusing points off the footprint
fn place(world: &World, position: Vec3) -> Result<Vec3, SpawnError> {
    match world.get_resource::<Terrain>() {
        Some(terrain) if !terrain.contains_point(position) => Err(SpawnError::OutOfBounds {
            x: position.x,
            z: position.z,
        }),
        Some(terrain) => Ok(terrain.ground(position)),
        None => Ok(position),
    }
}

pub fn living_workers(world: &mut World) -> usize {
    let mut query = world.query_filtered::<&Role, With<Alive>>();
    query.iter(world).filter(|r| r.is_worker()).count()
}

fn next_worker_number(world: &mut World) -> u64 {
    if !world.contains_resource::<IdAllocator>() {
        world.insert_resource(IdAllocator::new());
    }
    world.resource_mut::<IdAllocator>().next_worker()
}

fn next_item_number(world: &mut World) -> u64 {
    if !world.contains_resource::<IdAllocator>() {
        world.insert_resource(IdAllocator::new());
    }
    world.resource_mut::<IdAllocator>().next_item()
}

/// Spawn a worker with the full behavior repertoire
pub fn spawn_worker(
    world: &mut World,
    config: &ColonyConfig,
    position: Vec3,
    rng: &mut impl Rng,
) -> Result<Entity, SpawnError> {
    let position = place(world, position)?;
    let cap = config.spawning.max_workers;
    if living_workers(world) >= cap {
        return Err(SpawnError::PopulationCap(cap));
    }

    let agent_id = AgentId::worker(next_worker_number(world));
    let mut stats = StatTable::new(&config.stats);
    stats.initialize(rng);
    let behaviors = BehaviorSet::worker(config);
    let arbiter = BehaviorArbiter::new(behaviors.kinds(), config.arbiter.evaluation_interval);
    let picker = Picker::new(
        config.picker.max_carry_weight,
        config.picker.max_pickup_size,
        config.picker.attach_height,
    );

    let entity = world
        .spawn((
            agent_id.clone(),
            Role(AgentRole::Worker),
            Alive,
            Position(position),
            Mover::from_config(&config.movement),
            stats,
            AmbientOffset::default(),
            picker,
            behaviors,
            arbiter,
        ))
        .id();

    info!("Spawned {} at ({:.1}, {:.1})", agent_id, position.x, position.z);
    emit(
        world,
        EventKind::AgentSpawned {
            agent_id: agent_id.0,
            role: AgentRole::Worker,
            position: position.to_array(),
        },
    );
    Ok(entity)
}

/// Spawn the queen and register her with the colony
pub fn spawn_queen(
    world: &mut World,
    config: &ColonyConfig,
    position: Vec3,
    rng: &mut impl Rng,
) -> Result<Entity, SpawnError> {
    let position = place(world, position)?;
    let mut stats = StatTable::new(&config.stats);
    stats.initialize(rng);
    let behaviors = BehaviorSet::queen();
    let arbiter = BehaviorArbiter::new(behaviors.kinds(), config.arbiter.evaluation_interval);

    let entity = world
        .spawn((
            AgentId::queen(),
            Role(AgentRole::Queen),
            Alive,
            Position(position),
            Mover::stationary(),
            stats,
            AmbientOffset::default(),
            Brood::new(config.spawning.brood_interval),
            behaviors,
            arbiter,
        ))
        .id();
    if let Some(mut colony) = world.get_resource_mut::<Colony>() {
        colony.queen = Some(entity);
    }

    info!("Queen takes her place at ({:.1}, {:.1})", position.x, position.z);
    emit(
        world,
        EventKind::AgentSpawned {
            agent_id: AgentId::queen().0,
            role: AgentRole::Queen,
            position: position.to_array(),
        },
    );
    Ok(entity)
}

/// Spawn a fresh item of `kind`
pub fn spawn_item(
    world: &mut World,
    config: &ColonyConfig,
    kind: ResourceKind,
    position: Vec3,
) -> Result<Entity, SpawnError> {
    let position = place(world, position)?;
    let cap = config.spawning.max_items;
    let existing = world.query::<&Item>().iter(world).count();
    if existing >= cap {
        return Err(SpawnError::ItemCap(cap));
    }

    let item_id = ItemId(next_item_number(world));
    let profile = config.items.profile(kind);
    let entity = world
        .spawn((
            item_id,
            Item::from_profile(profile),
            Supply::from_profile(kind, profile),
            Position(position),
        ))
        .id();
    emit(
        world,
        EventKind::ItemSpawned {
            item_id: item_id.0,
            resource: kind,
            position: position.to_array(),
        },
    );
    Ok(entity)
}

pub(crate) fn reject(world: &mut World, error: SpawnError) {
    warn!("Spawn refused: {}", error);
    emit(
        world,
        EventKind::SpawnRejected {
            reason: error.to_string(),
        },
    );
}

/// Resource: periodic item drop timer
#[derive(Resource, Debug, Clone)]
pub struct ItemSpawner {
    pub timer: IntervalTimer,
    pub spawned: u64,
}

impl ItemSpawner {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: IntervalTimer::new(interval),
            spawned: 0,
        }
    }
}

/// Drop a random food or water item somewhere on the terrain every interval
pub fn run_item_spawner(world: &mut World) {
    let dt = world.resource::<SimClock>().dt;
    if !world.resource_mut::<ItemSpawner>().timer.tick(dt) {
        return;
    }

    let result = world.resource_scope(|world, config: Mut<ColonyConfig>| {
        world.resource_scope(|world, mut rng: Mut<SimRng>| {
            let kind = if rng.0.gen_bool(0.5) {
                ResourceKind::Food
            } else {
                ResourceKind::Water
            };
            let position = match world.get_resource::<Terrain>() {
                Some(terrain) => terrain.random_point(&mut rng.0),
                None => Vec3::ZERO,
            };
            spawn_item(world, &config, kind, position)
        })
    });
    match result {
        Ok(_) => world.resource_mut::<ItemSpawner>().spawned += 1,
        Err(e) => reject(world, e),
    }
}

/// The queen produces a worker every brood interval while well fed
pub fn run_brood(world: &mut World) {
    let Some(queen) = world.get_resource::<Colony>().and_then(|c| c.queen) else {
        return;
    };
    if !is_living_agent(world, queen) {
        return;
    }
    let dt = world.resource::<SimClock>().dt;
    let due = world
        .get_mut::<Brood>(queen)
        .map(|mut b| b.timer.tick(dt))
        .unwrap_or(false);
    if !due {
        return;
    }

    let (threshold, cost) = {
        let config = world.resource::<ColonyConfig>();
        (config.spawning.brood_food_threshold, config.spawning.brood_food_cost)
    };
    let fed = world
        .get::<StatTable>(queen)
        .map(|s| s.percentage(StatType::Food) >= threshold)
        .unwrap_or(false);
    if !fed {
        return;
    }
    let Some(origin) = world.get::<Position>(queen).map(|p| p.0) else {
        return;
    };

    let result = world.resource_scope(|world, config: Mut<ColonyConfig>| {
        world.resource_scope(|world, mut rng: Mut<SimRng>| {
            let angle = rng.0.gen_range(0.0..std::f32::consts::TAU);
            let at = origin + Vec3::new(angle.cos(), 0.0, angle.sin()) * 1.5;
            spawn_worker(world, &config, at, &mut rng.0)
        })
    });
    match result {
        Ok(_) => {
            if let Some(mut stats) = world.get_mut::<StatTable>(queen) {
                stats.modify(StatType::Food, -cost);
            }
            if let Some(mut brood) = world.get_mut::<Brood>(queen) {
                brood.produced += 1;
            }
        }
        Err(e) => reject(world, e),
    }
}
