//! Shared event types and serialization for the colony simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod kinds;
pub mod snapshot;
pub mod timestamp;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use timestamp::SimTimestamp;

pub use kinds::{AgentRole, BehaviorKind, ResourceKind, StatType};

pub use event::*;

pub use snapshot::{
    generate_snapshot_id, AgentSnapshot, ColonySnapshot, ColonySummary, DepositSnapshot,
    ItemSnapshot, StatSnapshot,
};
