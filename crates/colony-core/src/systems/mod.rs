//! ECS Systems
//!
//! All simulation systems: needs drift, death resolution, item lifecycle,
//! queen organization, agent behaviors, deposit clearing and spawning.

pub mod behaviors;
pub mod death;
pub mod deposits;
pub mod items;
pub mod needs;
pub mod organization;
pub mod spawning;

use bevy_ecs::prelude::*;

use crate::components::SimClock;

// Re-export commonly used systems
pub use behaviors::run_agent_behaviors;
pub use death::{despawn_dead, resolve_combat_deaths, resolve_deaths, resolve_drift_deaths};
pub use deposits::clear_deposits;
pub use items::{age_items, despawn_spent_items, sync_carried_items};
pub use needs::{apply_stat_drift, update_space_density, SpaceTracker};
pub use organization::{update_organization, OrganizationState};
pub use spawning::{
    living_workers, run_brood, run_item_spawner, spawn_item, spawn_queen, spawn_worker,
    ItemSpawner,
};

/// Advance the simulation clock by one tick
pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}
