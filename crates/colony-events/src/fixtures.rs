//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // colony-events = { path = "../colony-events", features = ["test-fixtures"] }
//!
//! use colony_events::fixtures;
//!
//! let events = fixtures::sample_events();
//! let snapshot = fixtures::sample_snapshot();
//! ```

use crate::{ColonyEvent, ColonySnapshot};

/// Returns sample events from the fixtures file.
///
/// Contains 10 events covering a short run: two spawns, a behavior switch,
/// a pickup and deposit, a queen request, an attack and the resulting death,
/// a dug block, and a rejected spawn.
pub fn sample_events() -> Vec<ColonyEvent> {
    let jsonl = include_str!("../tests/fixtures/sample_events.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            ColonyEvent::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse event line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns a sample colony snapshot from the fixtures file.
///
/// Contains a queen requesting water, a worker carrying water to her,
/// a hungry worker eating from the food deposit, and both deposits.
pub fn sample_snapshot() -> ColonySnapshot {
    let json = include_str!("../tests/fixtures/sample_state.json");
    serde_json::from_str(json).expect("Failed to parse sample_state.json")
}

/// Returns a specific event by ID from the sample events.
pub fn get_event(event_id: &str) -> Option<ColonyEvent> {
    sample_events().into_iter().find(|e| e.event_id == event_id)
}

/// Returns the death event from samples.
pub fn death_event() -> ColonyEvent {
    sample_events()
        .into_iter()
        .find(|e| e.is_death())
        .expect("sample events contain a death")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentRole, EventKind, EventType, StatType};

    #[test]
    fn test_sample_events_parse() {
        let events = sample_events();
        assert_eq!(events.len(), 10);
        for event in &events {
            assert_eq!(event.event_type, event.payload.event_type());
        }
    }

    #[test]
    fn test_sample_event_ids_are_sequential() {
        let events = sample_events();
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.event_id, crate::generate_event_id(i as u64 + 1));
        }
    }

    #[test]
    fn test_death_event() {
        let death = death_event();
        assert_eq!(death.event_type, EventType::Lifecycle);
        match death.payload {
            EventKind::AgentDied { killer, .. } => assert_eq!(killer.as_deref(), Some("worker_0001")),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_get_event() {
        assert!(get_event("evt_00000004").is_some());
        assert!(get_event("evt_99999999").is_none());
    }

    #[test]
    fn test_sample_snapshot() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.agents.len(), 3);
        assert_eq!(snapshot.queen().map(|q| q.role), Some(AgentRole::Queen));
        assert!(snapshot.summary.water_requested);

        let hungry = snapshot.agent("worker_0003").unwrap();
        assert!(!hungry.stat(StatType::Food).unwrap().good);
        assert_eq!(hungry.bad_stat_count(), 1);
    }
}
