//! Simulation Driver
//!
//! Owns the ECS world and the per-tick schedule.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

use colony_events::{ColonyEvent, ColonySnapshot};

use crate::components::{AgentId, SimClock};
use crate::config::ColonyConfig;
use crate::events::{flush_tick_events, EventLogger, TickEvents};
use crate::output::generate_snapshot;
use crate::setup::{insert_resources, populate_colony, SpawnSummary};
use crate::systems::{
    advance_clock, age_items, apply_stat_drift, clear_deposits, despawn_dead,
    despawn_spent_items, resolve_combat_deaths, resolve_drift_deaths, run_agent_behaviors,
    run_brood, run_item_spawner, sync_carried_items, update_organization, update_space_density,
};

/// Build the tick schedule. Systems run one after another on a single
/// thread so results depend only on the seed and the configuration.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            despawn_dead,
            advance_clock,
            update_space_density,
            apply_stat_drift,
            resolve_drift_deaths,
            age_items,
            update_organization,
            run_agent_behaviors,
            sync_carried_items,
            resolve_combat_deaths,
            clear_deposits,
            run_item_spawner,
            run_brood,
            despawn_spent_items,
            flush_tick_events,
        )
            .chain(),
    );
    schedule
}

/// A colony run: world, schedule and the configuration it was built from
pub struct Simulation {
    pub world: World,
    schedule: Schedule,
    config: ColonyConfig,
}

impl Simulation {
    /// Fully populated colony
    pub fn new(config: ColonyConfig) -> Self {
        let mut sim = Self::empty(config);
        let config = sim.config.clone();
        populate_colony(&mut sim.world, &config);
        sim
    }

    /// Resources only, no agents or items
    pub fn empty(config: ColonyConfig) -> Self {
        let mut world = World::new();
        insert_resources(&mut world, &config);
        Self {
            world,
            schedule: build_schedule(),
            config,
        }
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    /// Write events to `logger` from now on
    pub fn set_logger(&mut self, logger: EventLogger) {
        self.world.insert_resource(logger);
    }

    pub fn tick(&self) -> u64 {
        self.world.resource::<SimClock>().tick
    }

    pub fn elapsed(&self) -> f64 {
        self.world.resource::<SimClock>().elapsed
    }

    /// Run one tick and return the events it produced
    pub fn step(&mut self) -> Vec<ColonyEvent> {
        self.schedule.run(&mut self.world);
        self.world.resource_mut::<TickEvents>().take_flushed()
    }

    /// Run `ticks` ticks, returning every event in order
    pub fn run(&mut self, ticks: u64) -> Vec<ColonyEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.step());
        }
        events
    }

    pub fn snapshot(&mut self, trigger: &str) -> ColonySnapshot {
        generate_snapshot(&mut self.world, trigger)
    }

    pub fn summary(&mut self) -> SpawnSummary {
        crate::setup::spawn_summary(&mut self.world)
    }

    /// Entity of the agent with the given id, living or not
    pub fn agent(&mut self, agent_id: &str) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &AgentId)>();
        query
            .iter(&self.world)
            .find(|(_, id)| id.as_str() == agent_id)
            .map(|(entity, _)| entity)
    }

    pub fn flush_log(&mut self) -> std::io::Result<()> {
        self.world.resource_mut::<EventLogger>().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_events::EventKind;

    #[test]
    fn test_first_step_flushes_setup_events() {
        let mut config = ColonyConfig::default();
        config.simulation.initial_workers = 3;
        config.spawning.initial_items = 2;
        let mut sim = Simulation::new(config);
        assert_eq!(sim.tick(), 0);

        let events = sim.step();
        assert_eq!(sim.tick(), 1);
        let spawned = events
            .iter()
            .filter(|e| matches!(e.payload, EventKind::AgentSpawned { .. }))
            .count();
        assert_eq!(spawned, 4);
        assert!(sim.agent(AgentId::queen().as_str()).is_some());
        assert!(sim.agent("worker_0003").is_some());
        assert!(sim.agent("worker_0004").is_none());
    }

    #[test]
    fn test_clock_advances_by_tick_seconds() {
        let mut sim = Simulation::empty(ColonyConfig::default());
        sim.run(10);
        assert_eq!(sim.tick(), 10);
        assert!((sim.elapsed() - 1.0).abs() < 1e-6);
    }
}
