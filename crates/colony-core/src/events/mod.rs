//! Event Logging
//!
//! Per-tick event queue and the JSONL writer it drains into.

pub mod logger;

pub use logger::{emit, flush_tick_events, EventLogger, TickEvents};
