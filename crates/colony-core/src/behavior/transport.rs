//! Transport Behavior
//!
//! Workers carry loose food and water into the matching deposit, or straight
//! to the queen while she has an open request for that resource.
//!
//! ```text
//! Idle -> SeekingPickup -> MovingToPickup -> PickingUp -> SeekingDeposit
//!      -> MovingToDeposit -> Depositing -> Idle
//!                         \-> DeliveringToQueen -> Idle
//! ```
//!
//! The carried item is `Some` exactly in the carrying states. A carrying run
//! survives deactivation (combat may interrupt it) and resumes on the next
//! activation.

use bevy_ecs::prelude::*;
use glam::Vec3;
use tracing::debug;

use colony_events::{BehaviorKind, EventKind, ResourceKind};

use super::{is_needy, living_queen, loose_items, nearest_item, Behavior, BehaviorCore, BehaviorCtx, ItemView};
use crate::components::{
    drop_item, ground_distance, try_pickup, Colony, Consumable, Deposit, ItemId, Picker,
    Position, Supply,
};
use crate::config::ColonyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    SeekingPickup,
    MovingToPickup,
    PickingUp,
    SeekingDeposit,
    MovingToDeposit,
    Depositing,
    DeliveringToQueen,
}

impl TransportState {
    pub fn is_carrying(self) -> bool {
        matches!(
            self,
            TransportState::SeekingDeposit
                | TransportState::MovingToDeposit
                | TransportState::Depositing
                | TransportState::DeliveringToQueen
        )
    }
}

#[derive(Debug, Clone)]
pub struct TransportBehavior {
    core: BehaviorCore,
    pub state: TransportState,
    pub target_item: Option<Entity>,
    pub carried: Option<Entity>,
    pub destination: Option<Vec3>,
    /// Resource kinds this agent hauls
    pub resources: Vec<ResourceKind>,
    /// Items that refused a pickup during the current run
    rejected: Vec<Entity>,
}

impl TransportBehavior {
    pub fn new(resources: Vec<ResourceKind>) -> Self {
        Self {
            core: BehaviorCore::default(),
            state: TransportState::Idle,
            target_item: None,
            carried: None,
            destination: None,
            resources,
            rejected: Vec::new(),
        }
    }

    /// A carrying stage whose item is still held by `agent`
    fn holds_carried(&self, world: &World, agent: Entity) -> bool {
        self.state.is_carrying()
            && self.carried.is_some()
            && world.get::<Picker>(agent).map(|p| p.carrying) == Some(self.carried)
    }

    fn reset(&mut self) {
        self.state = TransportState::Idle;
        self.target_item = None;
        self.carried = None;
        self.destination = None;
    }

    fn check_invariant(&self) {
        debug_assert_eq!(
            self.carried.is_some(),
            self.state.is_carrying(),
            "transport carried item out of sync with state {:?}",
            self.state
        );
    }

    fn carried_resource(&self, world: &World) -> Option<ResourceKind> {
        self.carried
            .and_then(|item| world.get::<Supply>(item))
            .map(|s| s.resource())
    }

    fn deposit_for(world: &World, kind: ResourceKind) -> Option<Deposit> {
        world
            .get_resource::<Colony>()
            .map(|c| c.deposit_for(kind).clone())
            .filter(|d| d.active)
    }

    fn queen_wants(world: &World, kind: ResourceKind) -> Option<Entity> {
        let requested = world
            .get_resource::<Colony>()
            .map(|c| c.requests.is_requested(kind))
            .unwrap_or(false);
        if requested {
            living_queen(world)
        } else {
            None
        }
    }

    /// Give up on the carried item where the agent stands
    fn abandon_carry(&mut self, ctx: &mut BehaviorCtx) {
        if let Some(item) = self.carried {
            if drop_item(ctx.world, item, ctx.agent) {
                let position = ctx.world.get::<Position>(item).map(|p| p.to_array()).unwrap_or_default();
                let agent_id = ctx.agent_id();
                let item_id = item_id(ctx.world, item);
                ctx.emit(EventKind::ItemDropped {
                    agent_id,
                    item_id,
                    position,
                });
            }
        }
        self.reset();
    }

    fn seek_pickup(&mut self, ctx: &mut BehaviorCtx) {
        match find_eligible_item(ctx.world, ctx.agent, ctx.config, &self.resources, &self.rejected) {
            Some(found) => {
                self.target_item = Some(found.entity);
                self.state = TransportState::MovingToPickup;
            }
            None => self.state = TransportState::Idle,
        }
    }

    fn move_to_pickup(&mut self, ctx: &mut BehaviorCtx) {
        let Some(item) = self.target_item else {
            self.state = TransportState::SeekingPickup;
            return;
        };
        let still_loose = loose_items(ctx.world, ctx.config)
            .iter()
            .any(|i| i.entity == item && !i.spoiled);
        let Some(target) = ctx.world.get::<Position>(item).map(|p| p.0).filter(|_| still_loose) else {
            self.target_item = None;
            self.state = TransportState::SeekingPickup;
            return;
        };
        let stopping = ctx.config.movement.stopping_distance;
        if ctx.move_toward(target, stopping) {
            self.state = TransportState::PickingUp;
        }
    }

    fn pick_up(&mut self, ctx: &mut BehaviorCtx) {
        let Some(item) = self.target_item.take() else {
            self.state = TransportState::SeekingPickup;
            return;
        };
        match try_pickup(ctx.world, item, ctx.agent) {
            Ok(()) => {
                self.carried = Some(item);
                self.state = TransportState::SeekingDeposit;
                let resource = self.carried_resource(ctx.world).unwrap_or(ResourceKind::Food);
                let agent_id = ctx.agent_id();
                let item_id = item_id(ctx.world, item);
                ctx.emit(EventKind::ItemPickedUp {
                    agent_id,
                    item_id,
                    resource,
                });
            }
            Err(e) => {
                debug!("{}: pickup refused: {}", ctx.agent_id(), e);
                self.rejected.push(item);
                self.state = TransportState::SeekingPickup;
            }
        }
    }

    fn seek_deposit(&mut self, ctx: &mut BehaviorCtx) {
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
            return;
        }
        let Some(kind) = self.carried_resource(ctx.world) else {
            self.abandon_carry(ctx);
            return;
        };
        if Self::queen_wants(ctx.world, kind).is_some() {
            self.destination = None;
            self.state = TransportState::DeliveringToQueen;
            return;
        }
        let (Some(deposit), Some(from)) = (Self::deposit_for(ctx.world, kind), ctx.position()) else {
            self.abandon_carry(ctx);
            return;
        };
        self.destination = Some(deposit.closest_point_in_area(from));
        self.state = TransportState::MovingToDeposit;
    }

    fn move_to_deposit(&mut self, ctx: &mut BehaviorCtx) {
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
            return;
        }
        let deposit = self
            .carried_resource(ctx.world)
            .and_then(|kind| Self::deposit_for(ctx.world, kind));
        let (Some(deposit), Some(from)) = (deposit, ctx.position()) else {
            self.state = TransportState::SeekingDeposit;
            return;
        };
        if deposit.is_within_area(from) {
            self.state = TransportState::Depositing;
            return;
        }
        let destination = *self
            .destination
            .get_or_insert_with(|| deposit.closest_point_in_area(from));
        ctx.move_toward(destination, 0.0);
        let now = ctx.position().unwrap_or(from);
        if deposit.is_within_area(now) {
            self.state = TransportState::Depositing;
        } else if ground_distance(now, destination) < 1e-3 {
            self.destination = Some(deposit.closest_point_in_area(now));
        }
    }

    fn deposit(&mut self, ctx: &mut BehaviorCtx) {
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
            return;
        }
        let deposit = self
            .carried_resource(ctx.world)
            .and_then(|kind| Self::deposit_for(ctx.world, kind));
        let (Some(deposit), Some(here), Some(item)) = (deposit, ctx.position(), self.carried) else {
            self.state = TransportState::SeekingDeposit;
            return;
        };
        if !deposit.is_within_area(here) {
            self.destination = Some(deposit.closest_point_in_area(here));
            self.state = TransportState::MovingToDeposit;
            return;
        }
        drop_item(ctx.world, item, ctx.agent);
        let agent_id = ctx.agent_id();
        let item_id = item_id(ctx.world, item);
        ctx.emit(EventKind::ItemDeposited {
            agent_id,
            item_id,
            deposit: deposit.name.clone(),
        });
        debug!("{}: deposited item in {}", ctx.agent_id(), deposit.name);
        self.reset();
    }

    fn deliver_to_queen(&mut self, ctx: &mut BehaviorCtx) {
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
            return;
        }
        let Some(kind) = self.carried_resource(ctx.world) else {
            self.abandon_carry(ctx);
            return;
        };
        let queen_pos = Self::queen_wants(ctx.world, kind)
            .and_then(|q| ctx.world.get::<Position>(q))
            .map(|p| p.0);
        let Some(queen_pos) = queen_pos else {
            // request cleared or queen gone
            self.state = TransportState::SeekingDeposit;
            return;
        };
        let reach = ctx.config.transport.delivery_distance;
        if !ctx.move_toward(queen_pos, reach) {
            return;
        }
        if let Some(item) = self.carried {
            drop_item(ctx.world, item, ctx.agent);
            let agent_id = ctx.agent_id();
            let item_id = item_id(ctx.world, item);
            ctx.emit(EventKind::DeliveredToQueen {
                agent_id,
                item_id,
                resource: kind,
            });
            debug!("{}: delivered {} to the queen", ctx.agent_id(), kind);
        }
        self.reset();
    }
}

impl Behavior for TransportBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Transport
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
        free && !is_needy(world, agent, config)
            && find_eligible_item(world, agent, config, &self.resources, &[]).is_some()
    }

    fn on_activate(&mut self, ctx: &mut BehaviorCtx) {
        self.rejected.clear();
        if self.holds_carried(ctx.world, ctx.agent) {
            self.destination = None;
            self.state = TransportState::SeekingDeposit;
        } else {
            self.reset();
        }
    }

    fn on_deactivate(&mut self, ctx: &mut BehaviorCtx) {
        // a carrying run is kept so it can resume
        if !self.holds_carried(ctx.world, ctx.agent) {
            self.reset();
        }
        self.target_item = None;
    }

    fn update(&mut self, ctx: &mut BehaviorCtx) {
        match self.state {
            TransportState::Idle => {
                if self.carried.is_some() {
                    self.state = TransportState::SeekingDeposit;
                    self.seek_deposit(ctx);
                } else {
                    self.seek_pickup(ctx);
                }
            }
            TransportState::SeekingPickup => self.seek_pickup(ctx),
            TransportState::MovingToPickup => self.move_to_pickup(ctx),
            TransportState::PickingUp => self.pick_up(ctx),
            TransportState::SeekingDeposit => self.seek_deposit(ctx),
            TransportState::MovingToDeposit => self.move_to_deposit(ctx),
            TransportState::Depositing => self.deposit(ctx),
            TransportState::DeliveringToQueen => self.deliver_to_queen(ctx),
        }
        self.check_invariant();
    }
}

fn item_id(world: &World, item: Entity) -> u64 {
    world.get::<ItemId>(item).map(|id| id.0).unwrap_or_default()
}

/// Nearest loose item `agent` could carry somewhere useful
pub fn find_eligible_item(
    world: &World,
    agent: Entity,
    config: &ColonyConfig,
    resources: &[ResourceKind],
    skip: &[Entity],
) -> Option<ItemView> {
    let from = world.get::<Position>(agent)?.0;
    let picker = world.get::<Picker>(agent)?;
    let colony = world.get_resource::<Colony>();
    let queen_pos = living_queen(world)
        .and_then(|q| world.get::<Position>(q))
        .map(|p| p.0);

    let waiting_for_queen = |item: &ItemView| match (colony, queen_pos) {
        (Some(colony), Some(queen)) => {
            colony.requests.is_requested(item.resource)
                && ground_distance(item.position, queen) <= config.organization.consume_radius
        }
        _ => false,
    };

    let candidates = loose_items(world, config).into_iter().filter(|item| {
        !item.spoiled
            && resources.contains(&item.resource)
            && !skip.contains(&item.entity)
            && picker.can_carry(item.weight, item.size)
            && ground_distance(item.position, from) <= config.transport.search_radius
            && !colony
                .map(|c| c.is_in_matching_deposit(item.resource, item.position))
                .unwrap_or(false)
            && !waiting_for_queen(item)
    });
    nearest_item(candidates, from)
}
