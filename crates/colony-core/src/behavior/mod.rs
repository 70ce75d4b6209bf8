//! Agent Behaviors
//!
//! Each agent owns a `BehaviorSet` with one optional slot per behavior kind
//! and a `BehaviorArbiter` that keeps at most one of them active.
//!
//! Behaviors are driven from an exclusive system. While an agent is updated
//! its set and arbiter are taken out of the world, so a behavior receives
//! `&mut World` through [`BehaviorCtx`] and may touch any other entity. The
//! configuration and the simulation RNG are scoped out of the world for the
//! duration and handed over in the context instead.

pub mod arbiter;
pub mod combat;
pub mod consumption;
pub mod fallback;
pub mod pickup_seek;
pub mod transport;

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::rngs::SmallRng;

use colony_events::{BehaviorKind, EventKind, ResourceKind, StatType};

use crate::components::{
    step_toward, AgentId, Alive, Colony, Item, ItemId, Mover, Picker, Position, StatTable,
    Supply,
};
use crate::components::item::Consumable;
use crate::config::ColonyConfig;
use crate::events::emit;
use crate::terrain::Terrain;

pub use arbiter::BehaviorArbiter;
pub use combat::CombatBehavior;
pub use consumption::{ConsumptionBehavior, ConsumptionState};
pub use fallback::{FallbackBehavior, FallbackState};
pub use pickup_seek::{PickupSeekBehavior, PickupSeekState};
pub use transport::{TransportBehavior, TransportState};

/// Flags every behavior carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorCore {
    pub enabled: bool,
    pub active: bool,
}

impl Default for BehaviorCore {
    fn default() -> Self {
        Self {
            enabled: true,
            active: false,
        }
    }
}

/// Everything a behavior may use while it runs for one agent
pub struct BehaviorCtx<'a> {
    pub world: &'a mut World,
    pub agent: Entity,
    pub dt: f32,
    pub config: &'a ColonyConfig,
    pub rng: &'a mut SmallRng,
}

impl BehaviorCtx<'_> {
    pub fn position(&self) -> Option<Vec3> {
        self.world.get::<Position>(self.agent).map(|p| p.0)
    }

    pub fn agent_id(&self) -> String {
        agent_label(self.world, self.agent)
    }

    pub fn emit(&mut self, payload: EventKind) {
        emit(self.world, payload);
    }

    /// Walk toward `target` at the agent's speed; true once within `stopping_distance`
    pub fn move_toward(&mut self, target: Vec3, stopping_distance: f32) -> bool {
        let Some(from) = self.position() else {
            return false;
        };
        let carrying = self
            .world
            .get::<Picker>(self.agent)
            .map(|p| !p.is_free())
            .unwrap_or(false);
        let speed = self
            .world
            .get::<Mover>(self.agent)
            .map(|m| m.effective_speed(carrying))
            .unwrap_or(0.0);

        let (mut next, arrived) = step_toward(from, target, speed * self.dt, stopping_distance);
        if let Some(terrain) = self.world.get_resource::<Terrain>() {
            next = terrain.ground(terrain.clamp_to_footprint(next));
        }
        if let Some(mut pos) = self.world.get_mut::<Position>(self.agent) {
            pos.0 = next;
        }
        arrived
    }
}

/// A prioritized, mutually exclusive agent activity
pub trait Behavior: Send + Sync {
    fn kind(&self) -> BehaviorKind;

    fn priority(&self) -> i32 {
        self.kind().priority()
    }

    fn core(&self) -> &BehaviorCore;

    fn core_mut(&mut self) -> &mut BehaviorCore;

    fn is_enabled(&self) -> bool {
        self.core().enabled
    }

    fn is_active(&self) -> bool {
        self.core().active
    }

    /// Pure predicate: could this behavior run for `agent` right now
    fn can_activate(&self, world: &World, agent: Entity, config: &ColonyConfig) -> bool;

    fn on_activate(&mut self, _ctx: &mut BehaviorCtx) {}

    fn on_deactivate(&mut self, _ctx: &mut BehaviorCtx) {}

    fn update(&mut self, ctx: &mut BehaviorCtx);
}

/// Component: the behaviors an agent can run, one slot per kind
#[derive(Component, Default)]
pub struct BehaviorSet {
    pub combat: Option<CombatBehavior>,
    pub transport: Option<TransportBehavior>,
    pub consumption: Option<ConsumptionBehavior>,
    pub pickup_seek: Option<PickupSeekBehavior>,
    pub fallback: Option<FallbackBehavior>,
}

impl BehaviorSet {
    /// The full worker repertoire
    pub fn worker(config: &ColonyConfig) -> Self {
        Self {
            combat: Some(CombatBehavior::new()),
            transport: Some(TransportBehavior::new(config.transport.eligible.clone())),
            consumption: Some(ConsumptionBehavior::new()),
            pickup_seek: Some(PickupSeekBehavior::new()),
            fallback: Some(FallbackBehavior::new(config.fallback.check_interval)),
        }
    }

    /// The queen runs no scanning behaviors; her feeding and brood are
    /// driven by the colony systems
    pub fn queen() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: BehaviorKind) -> Option<&dyn Behavior> {
        match kind {
            BehaviorKind::Combat => self.combat.as_ref().map(|b| b as &dyn Behavior),
            BehaviorKind::Transport => self.transport.as_ref().map(|b| b as &dyn Behavior),
            BehaviorKind::Consumption => self.consumption.as_ref().map(|b| b as &dyn Behavior),
            BehaviorKind::PickupSeek => self.pickup_seek.as_ref().map(|b| b as &dyn Behavior),
            BehaviorKind::Fallback => self.fallback.as_ref().map(|b| b as &dyn Behavior),
        }
    }

    pub fn get_mut(&mut self, kind: BehaviorKind) -> Option<&mut dyn Behavior> {
        match kind {
            BehaviorKind::Combat => self.combat.as_mut().map(|b| b as &mut dyn Behavior),
            BehaviorKind::Transport => self.transport.as_mut().map(|b| b as &mut dyn Behavior),
            BehaviorKind::Consumption => {
                self.consumption.as_mut().map(|b| b as &mut dyn Behavior)
            }
            BehaviorKind::PickupSeek => {
                self.pickup_seek.as_mut().map(|b| b as &mut dyn Behavior)
            }
            BehaviorKind::Fallback => self.fallback.as_mut().map(|b| b as &mut dyn Behavior),
        }
    }

    /// Kinds with a filled slot
    pub fn kinds(&self) -> Vec<BehaviorKind> {
        BehaviorKind::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_some())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        BehaviorKind::ALL
            .into_iter()
            .filter_map(|k| self.get(k))
            .filter(|b| b.is_active())
            .count()
    }
}

/// Printable id of an agent entity
pub fn agent_label(world: &World, agent: Entity) -> String {
    world
        .get::<AgentId>(agent)
        .map(|id| id.0.clone())
        .unwrap_or_else(|| format!("{:?}", agent))
}

pub fn is_living_agent(world: &World, agent: Entity) -> bool {
    world.get::<Alive>(agent).is_some()
        && world
            .get::<StatTable>(agent)
            .map(|s| s.is_alive())
            .unwrap_or(false)
}

pub fn stat_percentage(world: &World, agent: Entity, stat: StatType) -> Option<f64> {
    world.get::<StatTable>(agent).map(|s| s.percentage(stat))
}

/// Whether either consumable need is below the consumption threshold
pub fn is_needy(world: &World, agent: Entity, config: &ColonyConfig) -> bool {
    ResourceKind::ALL.iter().any(|kind| {
        stat_percentage(world, agent, kind.stat())
            .map(|pct| pct < config.consumption.need_threshold)
            .unwrap_or(false)
    })
}

/// A loose item as seen by the scanning behaviors
#[derive(Debug, Clone, Copy)]
pub struct ItemView {
    pub entity: Entity,
    pub id: ItemId,
    pub resource: ResourceKind,
    pub position: Vec3,
    pub amount: f64,
    pub weight: f32,
    pub spoiled: bool,
    pub freshness: f64,
    pub nutrition: f64,
    pub size: crate::components::SizeClass,
}

/// Unheld, non-empty items, in id order
pub fn loose_items(world: &World, config: &ColonyConfig) -> Vec<ItemView> {
    let mut items: Vec<ItemView> = world
        .iter_entities()
        .filter_map(|e| {
            let item = e.get::<Item>()?;
            if item.is_held() || item.is_empty() {
                return None;
            }
            let supply = e.get::<Supply>()?;
            Some(ItemView {
                entity: e.id(),
                id: *e.get::<ItemId>()?,
                resource: supply.resource(),
                position: e.get::<Position>()?.0,
                amount: item.amount,
                weight: item.weight,
                spoiled: item.is_spoiled(config.consumption.spoiled_rot_fraction),
                freshness: item.freshness(),
                nutrition: supply.nutrition_per_unit(),
                size: item.size,
            })
        })
        .collect();
    items.sort_by_key(|i| i.id);
    items
}

/// Nearest of `candidates` to `from` on the ground plane, ties by item id
pub fn nearest_item(candidates: impl IntoIterator<Item = ItemView>, from: Vec3) -> Option<ItemView> {
    candidates.into_iter().min_by(|a, b| {
        let da = crate::components::ground_distance(a.position, from);
        let db = crate::components::ground_distance(b.position, from);
        da.total_cmp(&db).then(a.id.cmp(&b.id))
    })
}

/// The colony's queen while she is alive
pub fn living_queen(world: &World) -> Option<Entity> {
    let queen = world.get_resource::<Colony>()?.queen?;
    is_living_agent(world, queen).then_some(queen)
}
