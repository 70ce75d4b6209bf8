//! Organization System
//!
//! The queen's side of the economy. Once per request interval her Food and
//! Water are compared against the request thresholds and the colony's open
//! requests updated; every tick she eats from unheld items lying next to her.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use colony_events::{EventKind, ResourceKind};

use crate::behavior::is_living_agent;
use crate::components::{
    ground_distance, AgentId, Colony, Consumable, IntervalTimer, Item, ItemId, Position,
    SimClock, StatTable, Supply,
};
use crate::config::ColonyConfig;
use crate::events::TickEvents;

/// Resource: request cadence and the queen's meals in progress
#[derive(Resource, Debug, Clone)]
pub struct OrganizationState {
    pub timer: IntervalTimer,
    /// Amount taken so far from items the queen is eating, by item id
    meals: BTreeMap<u64, f64>,
}

impl OrganizationState {
    pub fn new(request_interval: f32) -> Self {
        Self {
            timer: IntervalTimer::primed(request_interval),
            meals: BTreeMap::new(),
        }
    }
}

/// Whether the request for a resource should be open given the queen's stat
/// percentage and the current request. `None` keeps the current value.
pub fn request_decision(pct: f64, config: &ColonyConfig) -> Option<bool> {
    if pct < config.organization.request_below {
        Some(true)
    } else if pct >= config.organization.clear_at {
        Some(false)
    } else {
        None
    }
}

/// Queen requests and direct feeding
pub fn update_organization(world: &mut World) {
    let Some(queen) = world.get_resource::<Colony>().and_then(|c| c.queen) else {
        return;
    };
    let dt = world.resource::<SimClock>().dt;
    let config = world.resource::<ColonyConfig>().clone();
    let queen_alive = is_living_agent(world, queen);

    let due = world.resource_mut::<OrganizationState>().timer.tick(dt);
    if due {
        let mut changes: Vec<(ResourceKind, bool)> = Vec::new();
        {
            let pcts: Vec<(ResourceKind, Option<f64>)> = ResourceKind::ALL
                .iter()
                .map(|kind| {
                    let pct = world
                        .get::<StatTable>(queen)
                        .filter(|_| queen_alive)
                        .map(|s| s.percentage(kind.stat()));
                    (*kind, pct)
                })
                .collect();
            let mut colony = world.resource_mut::<Colony>();
            for (kind, pct) in pcts {
                // a dead queen wants nothing
                let wanted = match pct {
                    Some(pct) => request_decision(pct, &config),
                    None => Some(false),
                };
                if let Some(active) = wanted {
                    if colony.requests.set(kind, active) {
                        changes.push((kind, active));
                    }
                }
            }
        }
        for (resource, active) in changes {
            info!(
                "Queen {} {}",
                if active { "requests" } else { "no longer needs" },
                resource
            );
            emit_event(world, EventKind::ResourceRequest { resource, active });
        }
    }

    if queen_alive {
        feed_queen(world, queen, dt as f64, &config);
    }
}

/// One tick of the queen eating from items within reach
fn feed_queen(world: &mut World, queen: Entity, dt: f64, config: &ColonyConfig) {
    let Some(here) = world.get::<Position>(queen).map(|p| p.0) else {
        return;
    };
    let spoiled_at = config.consumption.spoiled_rot_fraction;
    let radius = config.organization.consume_radius;

    let mut query = world.query::<(Entity, &ItemId, &Position, &Item, &Supply)>();
    let mut in_reach: Vec<(ItemId, Entity, ResourceKind)> = query
        .iter(world)
        .filter(|(_, _, pos, item, _)| {
            !item.is_held()
                && !item.is_empty()
                && !item.is_spoiled(spoiled_at)
                && ground_distance(here, pos.0) <= radius
        })
        .map(|(entity, id, _, _, supply)| (*id, entity, supply.resource()))
        .collect();
    in_reach.sort_by_key(|(id, ..)| *id);

    {
        let reachable: Vec<u64> = in_reach.iter().map(|(id, ..)| id.0).collect();
        let mut state = world.resource_mut::<OrganizationState>();
        state.meals.retain(|id, _| reachable.contains(id));
    }

    let queen_id = world
        .get::<AgentId>(queen)
        .map(|id| id.0.clone())
        .unwrap_or_default();

    for kind in ResourceKind::ALL {
        let hungry = world
            .get::<StatTable>(queen)
            .map(|s| s.percentage(kind.stat()) < 1.0)
            .unwrap_or(false);
        if !hungry {
            continue;
        }
        let Some((item_id, item, _)) = in_reach.iter().find(|(_, _, k)| *k == kind).copied() else {
            continue;
        };
        let Some(supply) = world.get::<Supply>(item).copied() else {
            continue;
        };

        let (taken, emptied) = match world.get_mut::<Item>(item) {
            Some(mut it) => {
                let taken = it.drain(supply.consumption_rate() * dt);
                (taken, it.is_empty())
            }
            None => continue,
        };
        let stat_after = match world.get_mut::<StatTable>(queen) {
            Some(mut stats) => {
                stats.modify(supply.stat(), taken * supply.nutrition_per_unit());
                stats.current(supply.stat())
            }
            None => continue,
        };

        let total = {
            let mut state = world.resource_mut::<OrganizationState>();
            let eaten = state.meals.entry(item_id.0).or_insert(0.0);
            *eaten += taken;
            *eaten
        };
        if emptied {
            world.resource_mut::<OrganizationState>().meals.remove(&item_id.0);
            debug!("Queen finished item {} ({:.1} {})", item_id.0, total, kind);
            emit_event(
                world,
                EventKind::ItemConsumed {
                    agent_id: queen_id.clone(),
                    item_id: item_id.0,
                    resource: kind,
                    amount: total,
                    stat_after,
                },
            );
        }
    }
}

fn emit_event(world: &mut World, payload: EventKind) {
    world.resource_scope(|world, mut events: Mut<TickEvents>| {
        events.emit(world.resource::<SimClock>(), payload);
    });
}
