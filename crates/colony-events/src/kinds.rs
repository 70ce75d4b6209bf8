//! Shared Enumerations
//!
//! Small closed sets used by both the event stream and the simulation:
//! stat types, resource kinds, agent roles and behavior kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven survival gauges every agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Health,
    Food,
    Water,
    Stress,
    Environment,
    Temperature,
    Space,
}

impl StatType {
    /// Number of stat types.
    pub const COUNT: usize = 7;

    /// All stat types, in storage order.
    pub const ALL: [StatType; StatType::COUNT] = [
        StatType::Health,
        StatType::Food,
        StatType::Water,
        StatType::Stress,
        StatType::Environment,
        StatType::Temperature,
        StatType::Space,
    ];

    /// Position of this stat in a fixed-size table.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StatType::Health => "health",
            StatType::Food => "food",
            StatType::Water => "water",
            StatType::Stress => "stress",
            StatType::Environment => "environment",
            StatType::Temperature => "temperature",
            StatType::Space => "space",
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinds of consumable resources in the colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Water,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Food, ResourceKind::Water];

    /// The stat this resource replenishes.
    pub fn stat(self) -> StatType {
        match self {
            ResourceKind::Food => StatType::Food,
            ResourceKind::Water => StatType::Water,
        }
    }

    /// The resource that replenishes a stat, if any.
    pub fn for_stat(stat: StatType) -> Option<Self> {
        match stat {
            StatType::Food => Some(ResourceKind::Food),
            StatType::Water => Some(ResourceKind::Water),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Food => write!(f, "food"),
            ResourceKind::Water => write!(f, "water"),
        }
    }
}

/// Colony role of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Queen,
    Worker,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::Queen => write!(f, "queen"),
            AgentRole::Worker => write!(f, "worker"),
        }
    }
}

/// Behavior kinds an agent can run, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Combat,
    Transport,
    Consumption,
    PickupSeek,
    Fallback,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 5] = [
        BehaviorKind::Combat,
        BehaviorKind::Transport,
        BehaviorKind::Consumption,
        BehaviorKind::PickupSeek,
        BehaviorKind::Fallback,
    ];

    /// Fixed arbitration priority; higher wins.
    pub fn priority(self) -> i32 {
        match self {
            BehaviorKind::Combat => 100,
            BehaviorKind::Transport => 80,
            BehaviorKind::Consumption => 60,
            BehaviorKind::PickupSeek => 40,
            BehaviorKind::Fallback => 20,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorKind::Combat => write!(f, "combat"),
            BehaviorKind::Transport => write!(f, "transport"),
            BehaviorKind::Consumption => write!(f, "consumption"),
            BehaviorKind::PickupSeek => write!(f, "pickup_seek"),
            BehaviorKind::Fallback => write!(f, "fallback"),
        }
    }
}
