//! Event Logger
//!
//! Append-only JSONL event logging, and the per-tick queue systems push
//! events into before they are written.

use bevy_ecs::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use colony_events::{generate_event_id, ColonyEvent, EventKind};

use crate::components::world::SimClock;

/// Resource for logging events to a JSONL file
#[derive(Resource)]
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    event_count: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
        })
    }

    /// Create a logger that discards events
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Log an event to the file
    pub fn log(&mut self, event: &ColonyEvent) -> std::io::Result<()> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = event.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, events: &[ColonyEvent]) -> std::io::Result<()> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush event logger: {}", e);
        }
    }
}

/// Resource: events produced during the current tick
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pending: Vec<ColonyEvent>,
    /// Events flushed at the end of the previous tick
    flushed: Vec<ColonyEvent>,
    next_event_id: u64,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and queue a payload
    pub fn emit(&mut self, clock: &SimClock, payload: EventKind) {
        self.next_event_id += 1;
        let event = ColonyEvent::new(
            generate_event_id(self.next_event_id),
            clock.timestamp(),
            payload,
        );
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[ColonyEvent] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the last flushed batch
    pub fn take_flushed(&mut self) -> Vec<ColonyEvent> {
        std::mem::take(&mut self.flushed)
    }

    fn flush(&mut self) -> &[ColonyEvent] {
        self.flushed = std::mem::take(&mut self.pending);
        &self.flushed
    }
}

/// Queue an event from an exclusive system
pub fn emit(world: &mut World, payload: EventKind) {
    world.resource_scope(|world, mut events: Mut<TickEvents>| {
        let clock = world.resource::<SimClock>();
        events.emit(clock, payload);
    });
}

/// System: write this tick's events to the log
pub fn flush_tick_events(mut events: ResMut<TickEvents>, mut logger: ResMut<EventLogger>) {
    let batch = events.flush();
    if batch.is_empty() {
        return;
    }
    if let Err(e) = logger.log_batch(batch) {
        tracing::warn!("Failed to write events: {}", e);
    }
}
