//! Snapshot Types
//!
//! Serialization structs for colony snapshots.
//!
//! Snapshots capture the complete state of the colony at a point in time,
//! used for analysis and debugging of a run.

use serde::{Deserialize, Serialize};

use crate::kinds::{AgentRole, BehaviorKind, ResourceKind, StatType};
use crate::SimTimestamp;

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// One gauge of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub stat: StatType,
    pub current: f64,
    pub percentage: f64,
    /// Inside the baseline range
    pub good: bool,
}

/// Agent state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub role: AgentRole,
    pub position: [f32; 3],
    pub alive: bool,
    pub stats: Vec<StatSnapshot>,
    #[serde(default)]
    pub active_behavior: Option<BehaviorKind>,
    #[serde(default)]
    pub carrying: Option<u64>,
}

impl AgentSnapshot {
    pub fn stat(&self, stat: StatType) -> Option<&StatSnapshot> {
        self.stats.iter().find(|s| s.stat == stat)
    }

    pub fn bad_stat_count(&self) -> usize {
        self.stats.iter().filter(|s| !s.good).count()
    }
}

/// Item state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: u64,
    pub resource: ResourceKind,
    pub position: [f32; 3],
    pub amount: f64,
    pub rot_level: f64,
    #[serde(default)]
    pub held_by: Option<String>,
}

/// Deposit state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositSnapshot {
    pub name: String,
    pub resource: ResourceKind,
    pub position: [f32; 3],
    pub radius: f32,
    pub active: bool,
    /// Unheld items of the matching resource lying inside the area
    pub items_inside: usize,
}

/// Colony-wide counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColonySummary {
    pub living_workers: usize,
    pub queen_alive: bool,
    pub total_items: usize,
    pub food_items: usize,
    pub water_items: usize,
    pub terrain_blocks: usize,
    pub food_requested: bool,
    pub water_requested: bool,
}

/// Complete colony snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonySnapshot {
    pub snapshot_id: String,
    pub timestamp: SimTimestamp,
    /// What caused the snapshot ("periodic", "simulation_start", ...)
    pub trigger: String,
    pub summary: ColonySummary,
    pub agents: Vec<AgentSnapshot>,
    #[serde(default)]
    pub items: Vec<ItemSnapshot>,
    #[serde(default)]
    pub deposits: Vec<DepositSnapshot>,
}

impl ColonySnapshot {
    pub fn agent(&self, agent_id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    pub fn queen(&self) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.role == AgentRole::Queen)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
