//! Agent Components
//!
//! Components for individual agents: identity, role, movement and lifecycle
//! markers. Stats live in `stats`, carrying in `item::Picker`, and the
//! behavior slots in `behavior`.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use colony_events::{AgentRole, DeathCause};

use crate::components::world::IntervalTimer;
use crate::config::MovementConfig;

/// Unique identifier for an agent, also its processing order
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn queen() -> Self {
        Self("queen_0000".into())
    }

    pub fn worker(sequence: u64) -> Self {
        Self(format!("worker_{:04}", sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Component: the agent's role in the colony
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role(pub AgentRole);

impl Role {
    pub fn is_queen(&self) -> bool {
        self.0 == AgentRole::Queen
    }

    pub fn is_worker(&self) -> bool {
        self.0 == AgentRole::Worker
    }
}

/// Marker: the agent is alive and takes part in the tick
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Alive;

/// Component: the agent died this tick and is removed at the start of the next
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead {
    pub cause: DeathCause,
}

/// Component: straight-line movement parameters
#[derive(Component, Debug, Clone, Copy)]
pub struct Mover {
    pub speed: f32,
    pub stopping_distance: f32,
    /// Speed factor while carrying
    pub carry_multiplier: f32,
}

impl Mover {
    pub fn from_config(config: &MovementConfig) -> Self {
        Self {
            speed: config.worker_speed,
            stopping_distance: config.stopping_distance,
            carry_multiplier: config.carry_speed_multiplier,
        }
    }

    /// A mover that never leaves its spot
    pub fn stationary() -> Self {
        Self {
            speed: 0.0,
            stopping_distance: 0.0,
            carry_multiplier: 1.0,
        }
    }

    pub fn effective_speed(&self, carrying: bool) -> f32 {
        if carrying {
            self.speed * self.carry_multiplier
        } else {
            self.speed
        }
    }
}

/// Component: the most recent attacker of this agent
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastAttacker(pub Entity);

/// Component: the queen's worker production timer
#[derive(Component, Debug, Clone)]
pub struct Brood {
    pub timer: IntervalTimer,
    pub produced: u32,
}

impl Brood {
    pub fn new(interval: f32) -> Self {
        Self {
            timer: IntervalTimer::new(interval),
            produced: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_order() {
        let mut ids = vec![AgentId::worker(3), AgentId::queen(), AgentId::worker(1)];
        ids.sort();
        assert_eq!(ids[0], AgentId::queen());
        assert_eq!(ids[1].as_str(), "worker_0001");
        assert_eq!(ids[2].to_string(), "worker_0003");
        assert_eq!(AgentId::queen().as_str(), "queen_0000");
    }

    #[test]
    fn test_carry_speed() {
        let mover = Mover::from_config(&MovementConfig::default());
        assert!(mover.effective_speed(true) < mover.effective_speed(false));
        assert_eq!(Mover::stationary().effective_speed(false), 0.0);
    }
}
