//! Needs Update System
//!
//! Per-tick stat drift and the periodic space (crowding) recomputation.

use bevy_ecs::prelude::*;
use rand::Rng;

use colony_events::StatType;

use crate::components::{
    ground_distance, AgentId, Alive, AmbientOffset, DriftInputs, IntervalTimer, Position,
    SimClock, StatTable,
};
use crate::config::ColonyConfig;
use crate::environment::EnvironmentField;
use crate::SimRng;

/// Apply automatic stat drift to every living agent, in agent id order
pub fn apply_stat_drift(
    clock: Res<SimClock>,
    config: Res<ColonyConfig>,
    field: Res<EnvironmentField>,
    mut rng: ResMut<SimRng>,
    mut agents: Query<(Entity, &AgentId, &Position, &mut StatTable, &mut AmbientOffset), With<Alive>>,
) {
    let dt = clock.dt as f64;
    let resample_every = config.stats.environment.variation_interval.max(dt);

    let mut order: Vec<(AgentId, Entity)> = agents
        .iter()
        .map(|(entity, id, ..)| (id.clone(), entity))
        .collect();
    order.sort();

    for (_, entity) in order {
        let Ok((_, _, position, mut stats, mut offset)) = agents.get_mut(entity) else {
            continue;
        };

        offset.resample_in -= dt;
        if offset.resample_in <= 0.0 {
            let variance = field.variance.abs();
            if variance > 0.0 {
                offset.environment = rng.0.gen_range(-variance..=variance);
                offset.temperature = rng.0.gen_range(-variance..=variance);
            }
            offset.resample_in += resample_every;
        }

        let local = field.conditions_at(position.0);
        let inputs = DriftInputs {
            environment_target: local.environment_target + offset.environment,
            temperature_target: local.temperature_target + offset.temperature,
            poi_stress_per_second: local.stress_per_second,
        };
        stats.tick(dt, &inputs, &config.stress);
    }
}

/// Resource: cadence of the space recomputation
#[derive(Resource, Debug, Clone)]
pub struct SpaceTracker {
    pub timer: IntervalTimer,
    pub updates: u64,
}

impl SpaceTracker {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: IntervalTimer::new(interval),
            updates: 0,
        }
    }
}

/// Space delta for an agent with `neighbours` others nearby
pub fn space_delta(neighbours: usize, config: &ColonyConfig) -> f64 {
    if neighbours > config.space.crowded_above {
        config.space.crowded_delta
    } else if neighbours < config.space.lonely_below {
        config.space.lonely_delta
    } else {
        0.0
    }
}

/// Every space interval, nudge Space by local density
pub fn update_space_density(
    clock: Res<SimClock>,
    config: Res<ColonyConfig>,
    mut tracker: ResMut<SpaceTracker>,
    mut agents: Query<(Entity, &Position, &mut StatTable), With<Alive>>,
) {
    if !tracker.timer.tick(clock.dt) {
        return;
    }
    tracker.updates += 1;

    let positions: Vec<(Entity, glam::Vec3)> = agents.iter().map(|(e, p, _)| (e, p.0)).collect();
    let radius = config.space.radius;
    for (entity, position, mut stats) in agents.iter_mut() {
        let neighbours = positions
            .iter()
            .filter(|(other, pos)| *other != entity && ground_distance(position.0, *pos) <= radius)
            .count();
        let delta = space_delta(neighbours, &config);
        if delta != 0.0 {
            stats.modify(StatType::Space, delta);
        }
    }
}
