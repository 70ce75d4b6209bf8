//! Consumption Behavior
//!
//! A hungry or thirsty agent walks to the most worthwhile item stored in its
//! matching deposit and drains it into the stat until the need is met.

use bevy_ecs::prelude::*;
use tracing::debug;

use colony_events::{BehaviorKind, EventKind, ResourceKind};

use super::{is_needy, loose_items, Behavior, BehaviorCore, BehaviorCtx, ItemView};
use crate::components::{ground_distance, Colony, Consumable, Item, Position, StatTable, Supply};
use crate::config::ColonyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionState {
    Idle,
    SeekingConsumable,
    MovingToConsumable,
    Consuming,
}

#[derive(Debug, Clone)]
pub struct ConsumptionBehavior {
    core: BehaviorCore,
    pub state: ConsumptionState,
    pub target: Option<Entity>,
    /// Id and resource of the target, kept so the meal can be reported
    /// after the item is gone
    target_info: Option<(u64, ResourceKind)>,
    /// Amount drained from the current target so far
    consumed: f64,
}

impl Default for ConsumptionBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumptionBehavior {
    pub fn new() -> Self {
        Self {
            core: BehaviorCore::default(),
            state: ConsumptionState::Idle,
            target: None,
            target_info: None,
            consumed: 0.0,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.state != ConsumptionState::Idle && self.target.is_some()
    }

    fn finish(&mut self, ctx: &mut BehaviorCtx) {
        self.target = None;
        if let Some((item_id, resource)) = self.target_info.take() {
            if self.consumed > 0.0 {
                let stat_after = ctx
                    .world
                    .get::<StatTable>(ctx.agent)
                    .map(|s| s.current(resource.stat()))
                    .unwrap_or_default();
                let agent_id = ctx.agent_id();
                ctx.emit(EventKind::ItemConsumed {
                    agent_id,
                    item_id,
                    resource,
                    amount: self.consumed,
                    stat_after,
                });
            }
        }
        self.consumed = 0.0;
        self.state = ConsumptionState::Idle;
    }

    /// Whether the target can still be eaten from
    fn target_usable(&self, ctx: &BehaviorCtx, item: Entity) -> bool {
        match (ctx.world.get::<Item>(item), ctx.world.get::<Supply>(item)) {
            (Some(i), Some(_)) => {
                !i.is_held()
                    && !i.is_empty()
                    && !i.is_spoiled(ctx.config.consumption.spoiled_rot_fraction)
            }
            _ => false,
        }
    }

    fn consume(&mut self, ctx: &mut BehaviorCtx) {
        let Some(item) = self.target else {
            self.state = ConsumptionState::SeekingConsumable;
            return;
        };
        let config = ctx.config;
        let (Some(here), Some(item_pos)) = (ctx.position(), ctx.world.get::<Position>(item).map(|p| p.0)) else {
            self.finish(ctx);
            return;
        };
        let Some(supply) = ctx.world.get::<Supply>(item).copied() else {
            self.finish(ctx);
            return;
        };
        let stat = supply.stat();
        let satisfied = ctx
            .world
            .get::<StatTable>(ctx.agent)
            .map(|s| s.percentage(stat) >= config.consumption.satisfied_threshold)
            .unwrap_or(true);
        let in_range = ground_distance(here, item_pos) <= config.consumption.consume_range;
        if satisfied || !in_range || !self.target_usable(ctx, item) {
            self.finish(ctx);
            return;
        }

        let requested = supply.consumption_rate() * ctx.dt as f64;
        let (taken, emptied) = ctx
            .world
            .get_mut::<Item>(item)
            .map(|mut i| (i.drain(requested), i.is_empty()))
            .unwrap_or((0.0, true));
        if let Some(mut stats) = ctx.world.get_mut::<StatTable>(ctx.agent) {
            stats.modify(stat, taken * supply.nutrition_per_unit());
        }
        self.consumed += taken;
        // Spent items are despawned later this tick
        if emptied {
            self.finish(ctx);
        }
    }
}

/// Score of eating `item` given the agent's need and distance
pub fn consumption_score(item: &ItemView, stat_pct: f64, distance: f32, config: &ColonyConfig) -> f64 {
    item.nutrition * (1.0 - stat_pct) * item.freshness
        - config.consumption.distance_weight * distance as f64
}

/// Best consumable for `agent`: stored in its matching deposit, highest score, ties by id
pub fn find_best_consumable(world: &World, agent: Entity, config: &ColonyConfig) -> Option<ItemView> {
    let here = world.get::<Position>(agent)?.0;
    let stats = world.get::<StatTable>(agent)?;
    let colony = world.get_resource::<Colony>()?;

    loose_items(world, config)
        .into_iter()
        .filter(|i| !i.spoiled && colony.is_in_matching_deposit(i.resource, i.position))
        .filter(|i| stats.percentage(i.resource.stat()) < config.consumption.satisfied_threshold)
        .map(|i| {
            let score = consumption_score(
                &i,
                stats.percentage(i.resource.stat()),
                ground_distance(here, i.position),
                config,
            );
            (i, score)
        })
        .max_by(|(a, sa), (b, sb)| sa.total_cmp(sb).then(b.id.cmp(&a.id)))
        .map(|(i, _)| i)
}

impl Behavior for ConsumptionBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Consumption
    }

    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BehaviorCore {
        &mut self.core
    }

    fn can_activate(&self, world: &World, agent: Entity, config: &ColonyConfig) -> bool {
        self.in_progress() || is_needy(world, agent, config)
    }

    fn on_activate(&mut self, _ctx: &mut BehaviorCtx) {
        if !self.in_progress() {
            self.state = ConsumptionState::Idle;
            self.consumed = 0.0;
        }
    }

    fn on_deactivate(&mut self, ctx: &mut BehaviorCtx) {
        self.finish(ctx);
    }

    fn update(&mut self, ctx: &mut BehaviorCtx) {
        match self.state {
            ConsumptionState::Idle => {
                self.state = ConsumptionState::SeekingConsumable;
                self.update(ctx);
            }
            ConsumptionState::SeekingConsumable => {
                if let Some(found) = find_best_consumable(ctx.world, ctx.agent, ctx.config) {
                    debug!("{}: heading to eat item {}", ctx.agent_id(), found.id.0);
                    self.target = Some(found.entity);
                    self.target_info = Some((found.id.0, found.resource));
                    self.consumed = 0.0;
                    self.state = ConsumptionState::MovingToConsumable;
                }
            }
            ConsumptionState::MovingToConsumable => {
                let Some(item) = self.target else {
                    self.state = ConsumptionState::SeekingConsumable;
                    return;
                };
                let target_pos = ctx.world.get::<Position>(item).map(|p| p.0);
                match target_pos {
                    Some(pos) if self.target_usable(ctx, item) => {
                        let reach = ctx.config.consumption.consume_range * 0.5;
                        if ctx.move_toward(pos, reach) {
                            self.state = ConsumptionState::Consuming;
                        }
                    }
                    _ => {
                        self.target = None;
                        self.target_info = None;
                        self.state = ConsumptionState::SeekingConsumable;
                    }
                }
            }
            ConsumptionState::Consuming => self.consume(ctx),
        }
    }
}
