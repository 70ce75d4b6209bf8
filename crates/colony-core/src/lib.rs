//! Colony Simulation Engine Library
//!
//! Worker agents with priority-arbitrated behaviors keep a queen fed by
//! hauling food and water into deposits, while stats drift, items rot and
//! stressed workers fight.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod behavior;
pub mod components;
pub mod config;
pub mod environment;
pub mod error;
pub mod events;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;
pub mod terrain;

pub use components::*;
pub use config::{ColonyConfig, ConfigError};
pub use error::{SimError, SpawnError};
pub use simulation::Simulation;

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
