//! Event Types
//!
//! Everything the colony simulation reports about itself. Events are produced
//! during a tick, queued, and drained once per tick into the JSONL log.

use serde::{Deserialize, Serialize};

use crate::kinds::{AgentRole, BehaviorKind, ResourceKind, StatType};
use crate::timestamp::SimTimestamp;

/// Broad event categories, used for filtering and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Lifecycle,
    Behavior,
    Item,
    Combat,
    Terrain,
    Organization,
    Spawn,
}

impl EventType {
    /// Returns all event type variants.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::Lifecycle,
            EventType::Behavior,
            EventType::Item,
            EventType::Combat,
            EventType::Terrain,
            EventType::Organization,
            EventType::Spawn,
        ]
    }
}

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Health reached zero from an attack
    Killed,
    /// Health reached zero without an attacker
    HealthDepleted,
    /// Too many stats left their comfortable range
    Neglect,
}

/// Payload of a colony event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    AgentSpawned {
        agent_id: String,
        role: AgentRole,
        position: [f32; 3],
    },
    AgentDied {
        agent_id: String,
        role: AgentRole,
        cause: DeathCause,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        killer: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bad_stats: Vec<StatType>,
    },
    BehaviorChanged {
        agent_id: String,
        #[serde(default)]
        from: Option<BehaviorKind>,
        #[serde(default)]
        to: Option<BehaviorKind>,
    },
    ItemPickedUp {
        agent_id: String,
        item_id: u64,
        resource: ResourceKind,
    },
    ItemDropped {
        agent_id: String,
        item_id: u64,
        position: [f32; 3],
    },
    ItemDeposited {
        agent_id: String,
        item_id: u64,
        deposit: String,
    },
    DeliveredToQueen {
        agent_id: String,
        item_id: u64,
        resource: ResourceKind,
    },
    ItemConsumed {
        agent_id: String,
        item_id: u64,
        resource: ResourceKind,
        amount: f64,
        stat_after: f64,
    },
    Attack {
        attacker_id: String,
        target_id: String,
        damage: f64,
        target_health: f64,
    },
    BlockDestroyed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_id: Option<String>,
        cell: [i32; 3],
    },
    DepositCleared {
        deposit: String,
        blocks_removed: usize,
    },
    ResourceRequest {
        resource: ResourceKind,
        active: bool,
    },
    ItemSpawned {
        item_id: u64,
        resource: ResourceKind,
        position: [f32; 3],
    },
    SpawnRejected {
        reason: String,
    },
}

impl EventKind {
    /// Category of this payload.
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::AgentSpawned { .. } | EventKind::AgentDied { .. } => EventType::Lifecycle,
            EventKind::BehaviorChanged { .. } => EventType::Behavior,
            EventKind::ItemPickedUp { .. }
            | EventKind::ItemDropped { .. }
            | EventKind::ItemDeposited { .. }
            | EventKind::DeliveredToQueen { .. }
            | EventKind::ItemConsumed { .. } => EventType::Item,
            EventKind::Attack { .. } => EventType::Combat,
            EventKind::BlockDestroyed { .. } | EventKind::DepositCleared { .. } => {
                EventType::Terrain
            }
            EventKind::ResourceRequest { .. } => EventType::Organization,
            EventKind::ItemSpawned { .. } | EventKind::SpawnRejected { .. } => EventType::Spawn,
        }
    }
}

/// A single timestamped colony event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyEvent {
    pub event_id: String,
    pub timestamp: SimTimestamp,
    pub event_type: EventType,
    pub payload: EventKind,
}

impl ColonyEvent {
    pub fn new(event_id: impl Into<String>, timestamp: SimTimestamp, payload: EventKind) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            event_type: payload.event_type(),
            payload,
        }
    }

    /// Agent ids mentioned by this event, primary actor first.
    pub fn agent_ids(&self) -> Vec<&str> {
        match &self.payload {
            EventKind::AgentSpawned { agent_id, .. }
            | EventKind::BehaviorChanged { agent_id, .. }
            | EventKind::ItemPickedUp { agent_id, .. }
            | EventKind::ItemDropped { agent_id, .. }
            | EventKind::ItemDeposited { agent_id, .. }
            | EventKind::DeliveredToQueen { agent_id, .. }
            | EventKind::ItemConsumed { agent_id, .. } => vec![agent_id.as_str()],
            EventKind::AgentDied {
                agent_id, killer, ..
            } => {
                let mut ids = vec![agent_id.as_str()];
                if let Some(killer) = killer {
                    ids.push(killer.as_str());
                }
                ids
            }
            EventKind::Attack {
                attacker_id,
                target_id,
                ..
            } => vec![attacker_id.as_str(), target_id.as_str()],
            EventKind::BlockDestroyed { agent_id, .. } => {
                agent_id.as_deref().into_iter().collect()
            }
            EventKind::DepositCleared { .. }
            | EventKind::ResourceRequest { .. }
            | EventKind::ItemSpawned { .. }
            | EventKind::SpawnRejected { .. } => Vec::new(),
        }
    }

    pub fn is_death(&self) -> bool {
        matches!(self.payload, EventKind::AgentDied { .. })
    }

    /// Serializes the event as a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attack() -> ColonyEvent {
        ColonyEvent::new(
            generate_event_id(3),
            SimTimestamp::new(30, 3.0),
            EventKind::Attack {
                attacker_id: "worker_0001".into(),
                target_id: "worker_0002".into(),
                damage: 10.0,
                target_health: 90.0,
            },
        )
    }

    #[test]
    fn test_event_id_format() {
        assert_eq!(generate_event_id(1), "evt_00000001");
        assert_eq!(generate_event_id(12345678), "evt_12345678");
    }

    #[test]
    fn test_event_type_derived_from_payload() {
        assert_eq!(attack().event_type, EventType::Combat);
        let spawn = ColonyEvent::new(
            "evt_1",
            SimTimestamp::zero(),
            EventKind::SpawnRejected {
                reason: "population cap".into(),
            },
        );
        assert_eq!(spawn.event_type, EventType::Spawn);
    }

    #[test]
    fn test_jsonl_shape() {
        let line = attack().to_jsonl().unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains(r#""kind":"attack""#));
        let parsed = ColonyEvent::from_jsonl(&line).unwrap();
        assert_eq!(parsed, attack());
    }

    #[test]
    fn test_agent_ids() {
        assert_eq!(attack().agent_ids(), vec!["worker_0001", "worker_0002"]);

        let death = ColonyEvent::new(
            "evt_2",
            SimTimestamp::zero(),
            EventKind::AgentDied {
                agent_id: "worker_0002".into(),
                role: AgentRole::Worker,
                cause: DeathCause::Killed,
                killer: Some("worker_0001".into()),
                bad_stats: Vec::new(),
            },
        );
        assert!(death.is_death());
        assert_eq!(death.agent_ids(), vec!["worker_0002", "worker_0001"]);

        let cleared = ColonyEvent::new(
            "evt_3",
            SimTimestamp::zero(),
            EventKind::DepositCleared {
                deposit: "food".into(),
                blocks_removed: 4,
            },
        );
        assert!(cleared.agent_ids().is_empty());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let event = ColonyEvent::new(
            "evt_4",
            SimTimestamp::zero(),
            EventKind::BlockDestroyed {
                agent_id: None,
                cell: [1, 0, 2],
            },
        );
        let line = event.to_jsonl().unwrap();
        assert!(!line.contains("agent_id"));
    }
}
