//! Snapshot Generation
//!
//! Periodic full-state dumps of the colony for analysis and debugging.

use bevy_ecs::prelude::*;
use glam::Vec3;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use colony_events::{
    generate_snapshot_id, AgentRole, AgentSnapshot, ColonySnapshot, ColonySummary,
    DepositSnapshot, ItemSnapshot, ResourceKind,
};

use crate::behavior::BehaviorArbiter;
use crate::components::{
    AgentId, Alive, Colony, Consumable, Item, ItemId, Picker, Position, Role, SimClock, StatTable,
    Supply,
};
use crate::terrain::Terrain;

/// Resource for generating snapshots
#[derive(Resource, Debug, Clone)]
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
    snapshot_interval: u64,
    last_snapshot_tick: u64,
}

impl SnapshotGenerator {
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_snapshot_id: 1,
            snapshot_interval,
            last_snapshot_tick: 0,
        }
    }

    /// Periodic snapshots are due on multiples of the interval; 0 disables them
    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        self.snapshot_interval > 0
            && current_tick > 0
            && current_tick % self.snapshot_interval == 0
            && current_tick != self.last_snapshot_tick
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn mark_snapshot(&mut self, tick: u64) {
        self.last_snapshot_tick = tick;
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id - 1
    }
}

/// Generate a complete colony snapshot
pub fn generate_snapshot(world: &mut World, trigger: &str) -> ColonySnapshot {
    if !world.contains_resource::<SnapshotGenerator>() {
        world.insert_resource(SnapshotGenerator::new(0));
    }
    let (snapshot_id, timestamp) = {
        let timestamp = world.resource::<SimClock>().timestamp();
        let mut generator = world.resource_mut::<SnapshotGenerator>();
        generator.mark_snapshot(timestamp.tick);
        (generator.next_id(), timestamp)
    };

    // Carried item ids, keyed by carrier
    let mut item_ids = world.query::<(Entity, &ItemId)>();
    let item_ids: HashMap<Entity, u64> =
        item_ids.iter(world).map(|(e, id)| (e, id.0)).collect();

    let mut agent_query = world.query::<(
        &AgentId,
        &Role,
        &Position,
        &StatTable,
        Has<Alive>,
        Option<&BehaviorArbiter>,
        Option<&Picker>,
    )>();
    let mut agents: Vec<AgentSnapshot> = agent_query
        .iter(world)
        .map(|(id, role, pos, stats, alive, arbiter, picker)| AgentSnapshot {
            agent_id: id.0.clone(),
            role: role.0,
            position: pos.to_array(),
            alive,
            stats: stats.snapshot(),
            active_behavior: arbiter.and_then(|a| a.active()),
            carrying: picker
                .and_then(|p| p.carrying)
                .and_then(|item| item_ids.get(&item).copied()),
        })
        .collect();
    agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

    let mut holder_ids = world.query::<(Entity, &AgentId)>();
    let holder_ids: HashMap<Entity, String> = holder_ids
        .iter(world)
        .map(|(e, id)| (e, id.0.clone()))
        .collect();

    let mut item_query = world.query::<(&ItemId, &Item, &Supply, &Position)>();
    let mut items: Vec<ItemSnapshot> = item_query
        .iter(world)
        .map(|(id, item, supply, pos)| ItemSnapshot {
            item_id: id.0,
            resource: supply.resource(),
            position: pos.to_array(),
            amount: item.amount,
            rot_level: item.rot_level,
            held_by: item.holder.and_then(|h| holder_ids.get(&h).cloned()),
        })
        .collect();
    items.sort_by_key(|i| i.item_id);

    let (deposits, requests) = match world.get_resource::<Colony>() {
        Some(colony) => {
            let deposits: Vec<DepositSnapshot> = colony
                .deposits()
                .into_iter()
                .map(|deposit| {
                    let inside = items
                        .iter()
                        .filter(|i| {
                            i.held_by.is_none()
                                && i.resource == deposit.kind
                                && deposit.is_within_area(Vec3::from_array(i.position))
                        })
                        .count();
                    deposit.snapshot(inside)
                })
                .collect();
            (deposits, colony.requests)
        }
        None => (Vec::new(), Default::default()),
    };

    let summary = ColonySummary {
        living_workers: agents
            .iter()
            .filter(|a| a.alive && a.role == AgentRole::Worker)
            .count(),
        queen_alive: agents
            .iter()
            .any(|a| a.alive && a.role == AgentRole::Queen),
        total_items: items.len(),
        food_items: items.iter().filter(|i| i.resource == ResourceKind::Food).count(),
        water_items: items.iter().filter(|i| i.resource == ResourceKind::Water).count(),
        terrain_blocks: world
            .get_resource::<Terrain>()
            .map(|t| t.block_count())
            .unwrap_or(0),
        food_requested: requests.food,
        water_requested: requests.water,
    };

    ColonySnapshot {
        snapshot_id,
        timestamp,
        trigger: trigger.to_string(),
        summary,
        agents,
        items,
        deposits,
    }
}

/// Write snapshot to a JSON file
pub fn write_snapshot(snapshot: &ColonySnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = snapshot.to_json_pretty()?;
    fs::write(path, json)?;
    Ok(())
}

/// Write snapshot into `<out_dir>/snapshots/`
pub fn write_snapshot_to_dir(
    snapshot: &ColonySnapshot,
    out_dir: impl AsRef<Path>,
) -> std::io::Result<PathBuf> {
    let dir = out_dir.as_ref().join("snapshots");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.json", snapshot.snapshot_id));
    write_snapshot(snapshot, &path)?;
    Ok(path)
}

/// Write current state (overwrites each time)
pub fn write_current_state(
    snapshot: &ColonySnapshot,
    out_dir: impl AsRef<Path>,
) -> std::io::Result<()> {
    write_snapshot(snapshot, out_dir.as_ref().join("current_state.json"))
}
