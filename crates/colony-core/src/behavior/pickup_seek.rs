//! Pickup-seek Behavior
//!
//! Keeps deposits clean: spoiled items, and items lying in the deposit of
//! the other resource, are hauled out past the deposit edge and dropped.
//! Misplaced but fresh items then become ordinary transport work.

use bevy_ecs::prelude::*;
use glam::Vec3;
use tracing::debug;

use colony_events::{BehaviorKind, EventKind};

use super::{loose_items, nearest_item, Behavior, BehaviorCore, BehaviorCtx, ItemView};
use crate::components::{
    drop_item, ground_distance, try_pickup, Colony, Consumable, ItemId, Picker, Position, Supply,
};
use crate::config::ColonyConfig;
use crate::terrain::Terrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupSeekState {
    Idle,
    Seeking,
    MovingToItem,
    PickingUp,
    Hauling,
}

#[derive(Debug, Clone)]
pub struct PickupSeekBehavior {
    core: BehaviorCore,
    pub state: PickupSeekState,
    pub target_item: Option<Entity>,
    pub carried: Option<Entity>,
    pub destination: Option<Vec3>,
    rejected: Vec<Entity>,
}

impl Default for PickupSeekBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl PickupSeekBehavior {
    pub fn new() -> Self {
        Self {
            core: BehaviorCore::default(),
            state: PickupSeekState::Idle,
            target_item: None,
            carried: None,
            destination: None,
            rejected: Vec::new(),
        }
    }

    fn holds_carried(&self, world: &World, agent: Entity) -> bool {
        self.state == PickupSeekState::Hauling
            && self.carried.is_some()
            && world.get::<Picker>(agent).map(|p| p.carrying) == Some(self.carried)
    }

    fn reset(&mut self) {
        self.state = PickupSeekState::Idle;
        self.target_item = None;
        self.carried = None;
        self.destination = None;
    }

    fn seek(&mut self, ctx: &mut BehaviorCtx) {
        match find_misplaced_item(ctx.world, ctx.agent, ctx.config, &self.rejected) {
            Some(found) => {
                self.target_item = Some(found.entity);
                self.state = PickupSeekState::MovingToItem;
            }
            None => self.state = PickupSeekState::Idle,
        }
    }

    fn move_to_item(&mut self, ctx: &mut BehaviorCtx) {
        let Some(item) = self.target_item else {
            self.state = PickupSeekState::Seeking;
            return;
        };
        let still_misplaced = misplaced_items(ctx.world, ctx.config)
            .iter()
            .any(|i| i.entity == item);
        let target = ctx.world.get::<Position>(item).map(|p| p.0);
        let Some(target) = target.filter(|_| still_misplaced) else {
            self.target_item = None;
            self.state = PickupSeekState::Seeking;
            return;
        };
        let stopping = ctx.config.movement.stopping_distance;
        if ctx.move_toward(target, stopping) {
            self.state = PickupSeekState::PickingUp;
        }
    }

    fn pick_up(&mut self, ctx: &mut BehaviorCtx) {
        let Some(item) = self.target_item.take() else {
            self.state = PickupSeekState::Seeking;
            return;
        };
        let deposit = ctx
            .world
            .get::<Position>(item)
            .and_then(|p| {
                ctx.world
                    .get_resource::<Colony>()
                    .and_then(|c| c.deposit_at(p.0))
                    .cloned()
            });
        let Some(deposit) = deposit else {
            self.state = PickupSeekState::Seeking;
            return;
        };
        match try_pickup(ctx.world, item, ctx.agent) {
            Ok(()) => {
                let here = ctx.position().unwrap_or(deposit.position);
                let mut out = Vec3::new(here.x - deposit.position.x, 0.0, here.z - deposit.position.z);
                out = out.try_normalize().unwrap_or(Vec3::X);
                let mut destination = deposit.position
                    + out * (deposit.radius + ctx.config.pickup_seek.drop_clearance);
                if let Some(terrain) = ctx.world.get_resource::<Terrain>() {
                    destination = terrain.ground(terrain.clamp_to_footprint(destination));
                }
                self.carried = Some(item);
                self.destination = Some(destination);
                self.state = PickupSeekState::Hauling;

                let resource = ctx
                    .world
                    .get::<Supply>(item)
                    .map(|s| s.resource())
                    .unwrap_or(deposit.kind);
                let agent_id = ctx.agent_id();
                let item_id = item_id(ctx.world, item);
                ctx.emit(EventKind::ItemPickedUp {
                    agent_id,
                    item_id,
                    resource,
                });
                debug!("{}: hauling item {} out of {}", ctx.agent_id(), item_id, deposit.name);
            }
            Err(e) => {
                debug!("{}: pickup refused: {}", ctx.agent_id(), e);
                self.rejected.push(item);
                self.state = PickupSeekState::Seeking;
            }
        }
    }

    fn haul(&mut self, ctx: &mut BehaviorCtx) {
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
            return;
        }
        let (Some(item), Some(destination)) = (self.carried, self.destination) else {
            self.reset();
            return;
        };
        if !ctx.move_toward(destination, 0.1) {
            return;
        }
        if drop_item(ctx.world, item, ctx.agent) {
            let position = ctx
                .world
                .get::<Position>(item)
                .map(|p| p.to_array())
                .unwrap_or_default();
            let agent_id = ctx.agent_id();
            let item_id = item_id(ctx.world, item);
            ctx.emit(EventKind::ItemDropped {
                agent_id,
                item_id,
                position,
            });
        }
        self.reset();
    }
}

impl Behavior for PickupSeekBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::PickupSeek
    }

    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BehaviorCore {
        &mut self.core
    }

    fn can_activate(&self, world: &World, agent: Entity, config: &ColonyConfig) -> bool {
        if self.holds_carried(world, agent) {
            return true;
        }
        let free = world.get::<Picker>(agent).map(|p| p.is_free()).unwrap_or(false);
        free && find_misplaced_item(world, agent, config, &[]).is_some()
    }

    fn on_activate(&mut self, ctx: &mut BehaviorCtx) {
        self.rejected.clear();
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
        }
    }

    fn on_deactivate(&mut self, ctx: &mut BehaviorCtx) {
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
        }
        self.target_item = None;
    }

    fn update(&mut self, ctx: &mut BehaviorCtx) {
        match self.state {
            PickupSeekState::Idle | PickupSeekState::Seeking => self.seek(ctx),
            PickupSeekState::MovingToItem => self.move_to_item(ctx),
            PickupSeekState::PickingUp => self.pick_up(ctx),
            PickupSeekState::Hauling => self.haul(ctx),
        }
        debug_assert_eq!(
            self.carried.is_some(),
            self.state == PickupSeekState::Hauling,
            "pickup-seek carried item out of sync with state {:?}",
            self.state
        );
    }
}

fn item_id(world: &World, item: Entity) -> u64 {
    world.get::<ItemId>(item).map(|id| id.0).unwrap_or_default()
}

/// Loose items lying in an active deposit that should not hold them
pub fn misplaced_items(world: &World, config: &ColonyConfig) -> Vec<ItemView> {
    let Some(colony) = world.get_resource::<Colony>() else {
        return Vec::new();
    };
    loose_items(world, config)
        .into_iter()
        .filter(|item| match colony.deposit_at(item.position) {
            Some(deposit) => item.spoiled || deposit.kind != item.resource,
            None => false,
        })
        .collect()
}

/// Nearest misplaced item within reach that `agent` can lift
pub fn find_misplaced_item(
    world: &World,
    agent: Entity,
    config: &ColonyConfig,
    skip: &[Entity],
) -> Option<ItemView> {
    let from = world.get::<Position>(agent)?.0;
    let picker = world.get::<Picker>(agent)?;
    let candidates = misplaced_items(world, config).into_iter().filter(|item| {
        !skip.contains(&item.entity)
            && picker.can_carry(item.weight, item.size)
            && ground_distance(item.position, from) <= config.pickup_seek.search_radius
    });
    nearest_item(candidates, from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Alive, Item, Mover, SimClock, SizeClass, StatTable};
    use crate::events::TickEvents;
    use colony_events::ResourceKind;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup() -> (World, Entity, ColonyConfig) {
        let config = ColonyConfig::default();
        let mut world = World::new();
        world.insert_resource(SimClock::new(0.1));
        world.insert_resource(TickEvents::new());
        world.insert_resource(Colony::from_config(&config.deposits));
        let agent = world
            .spawn((
                Alive,
                StatTable::new(&config.stats),
                Position::new(0.0, 0.0, 0.0),
                Mover::from_config(&config.movement),
                Picker::new(5.0, SizeClass::Medium, 0.6),
            ))
            .id();
        (world, agent, config)
    }

    fn item(world: &mut World, config: &ColonyConfig, id: u64, kind: ResourceKind, pos: Vec3) -> Entity {
        let profile = config.items.profile(kind).clone();
        world
            .spawn((
                ItemId(id),
                Item::from_profile(&profile),
                Supply::from_profile(kind, &profile),
                Position(pos),
            ))
            .id()
    }

    #[test]
    fn test_only_misplaced_items_qualify() {
        let (mut world, agent, config) = setup();
        let food_centre = world.resource::<Colony>().food_deposit.position;
        let water_centre = world.resource::<Colony>().water_deposit.position;
        item(&mut world, &config, 1, ResourceKind::Food, food_centre);
        item(&mut world, &config, 2, ResourceKind::Food, Vec3::new(0.0, 0.0, 5.0));
        let behavior = PickupSeekBehavior::new();
        assert!(!behavior.can_activate(&world, agent, &config));

        let wrong = item(&mut world, &config, 3, ResourceKind::Food, water_centre);
        assert!(behavior.can_activate(&world, agent, &config));
        assert_eq!(
            find_misplaced_item(&world, agent, &config, &[]).map(|i| i.entity),
            Some(wrong)
        );
    }

    #[test]
    fn test_spoiled_item_in_own_deposit_qualifies() {
        let (mut world, agent, config) = setup();
        let food_centre = world.resource::<Colony>().food_deposit.position;
        let rotten = item(&mut world, &config, 1, ResourceKind::Food, food_centre);
        {
            let mut it = world.get_mut::<Item>(rotten).unwrap();
            it.rot_level = it.max_rot;
        }
        let found = find_misplaced_item(&world, agent, &config, &[]);
        assert_eq!(found.map(|i| i.entity), Some(rotten));
    }

    #[test]
    fn test_hauls_item_out_of_deposit() {
        let (mut world, agent, config) = setup();
        let water = world.resource::<Colony>().water_deposit.clone();
        let wrong = item(&mut world, &config, 1, ResourceKind::Food, water.position);
        let mut rng = SmallRng::seed_from_u64(2);
        let mut behavior = PickupSeekBehavior::new();

        for _ in 0..300 {
            let mut ctx = BehaviorCtx {
                world: &mut world,
                agent,
                dt: 0.1,
                config: &config,
                rng: &mut rng,
            };
            behavior.update(&mut ctx);
        }

        let pos = world.get::<Position>(wrong).unwrap().0;
        assert!(!water.is_within_area(pos));
        let expected = water.radius + config.pickup_seek.drop_clearance;
        assert!((ground_distance(pos, water.position) - expected).abs() < 0.2);
        assert!(world.get::<Picker>(agent).unwrap().is_free());
        assert_eq!(behavior.state, PickupSeekState::Idle);
        let dropped = world
            .resource::<TickEvents>()
            .pending()
            .iter()
            .any(|e| matches!(e.payload, EventKind::ItemDropped { item_id: 1, .. }));
        assert!(dropped);
    }
}
