//! Fallback Behavior
//!
//! What an agent does when nothing else applies. Every check interval an idle
//! agent may dig out a sand block, preferring to widen an existing hole, or
//! wander to a nearby spot.

use bevy_ecs::prelude::*;
use glam::{IVec3, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use colony_events::{BehaviorKind, EventKind};

use super::{Behavior, BehaviorCore, BehaviorCtx};
use crate::components::IntervalTimer;
use crate::config::ColonyConfig;
use crate::terrain::Terrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Idle,
    MovingToBlock,
    Wandering,
}

#[derive(Debug, Clone)]
pub struct FallbackBehavior {
    core: BehaviorCore,
    pub state: FallbackState,
    timer: IntervalTimer,
    pub target_block: Option<IVec3>,
    pub destination: Option<Vec3>,
}

impl FallbackBehavior {
    pub fn new(check_interval: f32) -> Self {
        Self {
            core: BehaviorCore::default(),
            state: FallbackState::Idle,
            timer: IntervalTimer::new(check_interval),
            target_block: None,
            destination: None,
        }
    }

    fn reset(&mut self) {
        self.state = FallbackState::Idle;
        self.target_block = None;
        self.destination = None;
    }

    /// Roll for the next idle activity
    fn decide(&mut self, ctx: &mut BehaviorCtx) {
        let Some(here) = ctx.position() else {
            return;
        };
        let fallback = &ctx.config.fallback;

        if ctx.rng.gen_bool(fallback.random_sand_break_chance.clamp(0.0, 1.0)) {
            let block = ctx.world.get_resource::<Terrain>().and_then(|terrain| {
                pick_block(terrain, fallback.existing_hole_break_chance, &mut *ctx.rng)
            });
            if let Some(block) = block {
                self.target_block = Some(block);
                self.state = FallbackState::MovingToBlock;
                return;
            }
        }

        if ctx.rng.gen_bool(fallback.move_chance.clamp(0.0, 1.0)) {
            let angle = ctx.rng.gen_range(0.0..std::f32::consts::TAU);
            let dist = ctx.rng.gen_range(0.0..=fallback.wander_radius.max(0.0));
            let mut destination = here + Vec3::new(angle.cos(), 0.0, angle.sin()) * dist;
            if let Some(terrain) = ctx.world.get_resource::<Terrain>() {
                destination = terrain.ground(terrain.clamp_to_footprint(destination));
            }
            self.destination = Some(destination);
            self.state = FallbackState::Wandering;
        }
    }

    fn move_to_block(&mut self, ctx: &mut BehaviorCtx) {
        let Some(cell) = self.target_block else {
            self.reset();
            return;
        };
        let target = match ctx.world.get_resource::<Terrain>() {
            Some(terrain) if terrain.has_block(cell) => {
                (terrain.grid_to_world(cell), terrain.block_size())
            }
            // dug out by someone else
            _ => {
                self.reset();
                return;
            }
        };
        let (block_pos, reach) = target;
        if !ctx.move_toward(block_pos, reach) {
            return;
        }

        let destroyed = ctx
            .world
            .get_resource_mut::<Terrain>()
            .map(|mut t| t.destroy_block(cell))
            .unwrap_or(false);
        if destroyed {
            // stand on whatever is left of the column
            if let (Some(here), Some(terrain)) = (ctx.position(), ctx.world.get_resource::<Terrain>()) {
                let grounded = terrain.ground(here);
                if let Some(mut pos) = ctx.world.get_mut::<crate::components::Position>(ctx.agent) {
                    pos.0 = grounded;
                }
            }
            let agent_id = ctx.agent_id();
            trace!("{} dug out block {:?}", agent_id, cell);
            ctx.emit(EventKind::BlockDestroyed {
                agent_id: Some(agent_id),
                cell: cell.to_array(),
            });
        }
        self.reset();
    }

    fn wander(&mut self, ctx: &mut BehaviorCtx) {
        let Some(destination) = self.destination else {
            self.reset();
            return;
        };
        let stopping = ctx.config.movement.stopping_distance;
        if ctx.move_toward(destination, stopping) {
            self.reset();
        }
    }
}

/// Choose a block to dig: next to an existing hole with `hole_chance`, else a random surface block
fn pick_block(terrain: &Terrain, hole_chance: f64, rng: &mut impl Rng) -> Option<IVec3> {
    if !terrain.holes().is_empty() && rng.gen_bool(hole_chance.clamp(0.0, 1.0)) {
        let hole = terrain.holes().choose(rng).copied();
        let widened = hole.and_then(|h| terrain.solid_neighbours(h).choose(rng).copied());
        if widened.is_some() {
            return widened;
        }
    }
    terrain.random_surface_block(rng)
}

impl Behavior for FallbackBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Fallback
    }

    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BehaviorCore {
        &mut self.core
    }

    fn can_activate(&self, _world: &World, _agent: Entity, _config: &ColonyConfig) -> bool {
        true
    }

    fn on_activate(&mut self, _ctx: &mut BehaviorCtx) {
        self.reset();
        self.timer.reset();
    }

    fn on_deactivate(&mut self, _ctx: &mut BehaviorCtx) {
        self.reset();
    }

    fn update(&mut self, ctx: &mut BehaviorCtx) {
        match self.state {
            FallbackState::Idle => {
                if self.timer.tick(ctx.dt) {
                    self.decide(ctx);
                }
            }
            FallbackState::MovingToBlock => self.move_to_block(ctx),
            FallbackState::Wandering => self.wander(ctx),
        }
    }
}
