//! Combat Behavior
//!
//! An agent whose stress has sunk to the aggression threshold hunts the
//! nearest living worker, closes in and strikes on a fixed cooldown. The
//! queen is never a target.

use bevy_ecs::prelude::*;
use tracing::debug;

use colony_events::{BehaviorKind, EventKind, StatType};

use super::{is_living_agent, Behavior, BehaviorCore, BehaviorCtx};
use crate::components::{ground_distance, AgentId, LastAttacker, Position, Role, StatTable};
use crate::config::ColonyConfig;

#[derive(Debug, Clone, Default)]
pub struct CombatBehavior {
    core: BehaviorCore,
    pub target: Option<Entity>,
    /// Seconds until the next strike is allowed
    cooldown: f32,
}

impl CombatBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    fn target_valid(&self, ctx: &BehaviorCtx, target: Entity) -> bool {
        let (Some(here), Some(there)) = (
            ctx.position(),
            ctx.world.get::<Position>(target).map(|p| p.0),
        ) else {
            return false;
        };
        is_living_agent(ctx.world, target)
            && ground_distance(here, there) <= ctx.config.combat.combat_range
    }

    fn strike(&mut self, ctx: &mut BehaviorCtx, target: Entity) {
        let damage = ctx.config.combat.damage;
        let Some(mut stats) = ctx.world.get_mut::<StatTable>(target) else {
            return;
        };
        stats.take_damage(damage);
        let target_health = stats.current(StatType::Health);
        ctx.world.entity_mut(target).insert(LastAttacker(ctx.agent));

        let attacker_id = ctx.agent_id();
        let target_id = super::agent_label(ctx.world, target);
        debug!("{} strikes {} ({:.0} health left)", attacker_id, target_id, target_health);
        ctx.emit(EventKind::Attack {
            attacker_id,
            target_id,
            damage,
            target_health,
        });
        self.cooldown = ctx.config.combat.attack_cooldown;
    }
}

/// Nearest living worker other than `agent` within `range`, ties by agent id
pub fn find_target(world: &World, agent: Entity, range: f32) -> Option<Entity> {
    let here = world.get::<Position>(agent)?.0;
    world
        .iter_entities()
        .filter(|e| e.id() != agent)
        .filter(|e| e.get::<Role>().map(|r| r.is_worker()).unwrap_or(false))
        .filter(|e| is_living_agent(world, e.id()))
        .filter_map(|e| {
            let d = ground_distance(here, e.get::<Position>()?.0);
            let id = e.get::<AgentId>()?;
            (d <= range).then_some((e.id(), d, id))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(b.2)))
        .map(|(e, _, _)| e)
}

impl Behavior for CombatBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Combat
    }

    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BehaviorCore {
        &mut self.core
    }

    fn can_activate(&self, world: &World, agent: Entity, config: &ColonyConfig) -> bool {
        world
            .get::<StatTable>(agent)
            .map(|s| s.percentage(StatType::Stress) <= config.combat.stress_threshold)
            .unwrap_or(false)
    }

    fn on_activate(&mut self, _ctx: &mut BehaviorCtx) {
        self.target = None;
    }

    fn on_deactivate(&mut self, _ctx: &mut BehaviorCtx) {
        self.target = None;
    }

    fn update(&mut self, ctx: &mut BehaviorCtx) {
        self.cooldown = (self.cooldown - ctx.dt).max(0.0);

        let current = self.target.filter(|t| self.target_valid(ctx, *t));
        self.target = current.or_else(|| find_target(ctx.world, ctx.agent, ctx.config.combat.combat_range));
        let Some(target) = self.target else {
            // nobody in range; stay on guard
            return;
        };
        let Some(there) = ctx.world.get::<Position>(target).map(|p| p.0) else {
            return;
        };

        let attack_range = ctx.config.combat.attack_range;
        let in_reach = ctx.move_toward(there, attack_range * 0.8);
        if in_reach && self.cooldown <= 0.0 {
            self.strike(ctx, target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Alive, Mover, SimClock};
    use crate::events::TickEvents;
    use colony_events::AgentRole;
    use glam::Vec3;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn spawn(world: &mut World, config: &ColonyConfig, id: &str, role: AgentRole, at: Vec3) -> Entity {
        world
            .spawn((
                AgentId(id.into()),
                Role(role),
                Alive,
                StatTable::new(&config.stats),
                Position(at),
                Mover::from_config(&config.movement),
            ))
            .id()
    }

    fn world() -> (World, ColonyConfig) {
        let mut world = World::new();
        world.insert_resource(SimClock::new(0.1));
        world.insert_resource(TickEvents::new());
        (world, ColonyConfig::default())
    }

    #[test]
    fn test_stress_threshold() {
        let (mut world, config) = world();
        let a = spawn(&mut world, &config, "worker_0001", AgentRole::Worker, Vec3::ZERO);
        let combat = CombatBehavior::new();
        assert!(!combat.can_activate(&world, a, &config));
        world.get_mut::<StatTable>(a).unwrap().set(StatType::Stress, 20.0);
        assert!(combat.can_activate(&world, a, &config));
    }

    #[test]
    fn test_target_excludes_queen_and_far_agents() {
        let (mut world, config) = world();
        let a = spawn(&mut world, &config, "worker_0001", AgentRole::Worker, Vec3::ZERO);
        spawn(&mut world, &config, "queen_0000", AgentRole::Queen, Vec3::new(1.0, 0.0, 0.0));
        spawn(&mut world, &config, "worker_0009", AgentRole::Worker, Vec3::new(50.0, 0.0, 0.0));
        assert_eq!(find_target(&world, a, config.combat.combat_range), None);

        let near = spawn(&mut world, &config, "worker_0003", AgentRole::Worker, Vec3::new(0.0, 0.0, 3.0));
        let tie = spawn(&mut world, &config, "worker_0002", AgentRole::Worker, Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(find_target(&world, a, config.combat.combat_range), Some(tie));
        world.entity_mut(tie).remove::<Alive>();
        assert_eq!(find_target(&world, a, config.combat.combat_range), Some(near));
    }

    #[test]
    fn test_approach_and_strike_on_cooldown() {
        let (mut world, config) = world();
        let a = spawn(&mut world, &config, "worker_0001", AgentRole::Worker, Vec3::ZERO);
        let b = spawn(&mut world, &config, "worker_0002", AgentRole::Worker, Vec3::new(3.0, 0.0, 0.0));
        let mut rng = SmallRng::seed_from_u64(1);
        let mut combat = CombatBehavior::new();

        // 3 seconds of pursuit and fighting
        for _ in 0..30 {
            let mut ctx = BehaviorCtx {
                world: &mut world,
                agent: a,
                dt: 0.1,
                config: &config,
                rng: &mut rng,
            };
            combat.update(&mut ctx);
        }
        assert_eq!(combat.target, Some(b));
        let health = world.get::<StatTable>(b).unwrap().current(StatType::Health);
        // reached in under a second, then one strike per second
        assert!(health == 80.0 || health == 70.0, "health {}", health);
        assert_eq!(world.get::<LastAttacker>(b), Some(&LastAttacker(a)));
        let attacks = world
            .resource::<TickEvents>()
            .pending()
            .iter()
            .filter(|e| matches!(e.payload, EventKind::Attack { .. }))
            .count();
        assert_eq!(attacks as f64, (100.0 - health) / config.combat.damage);
    }

    #[test]
    fn test_no_target_stays_put() {
        let (mut world, config) = world();
        let a = spawn(&mut world, &config, "worker_0001", AgentRole::Worker, Vec3::ZERO);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut combat = CombatBehavior::new();
        let mut ctx = BehaviorCtx {
            world: &mut world,
            agent: a,
            dt: 0.1,
            config: &config,
            rng: &mut rng,
        };
        combat.update(&mut ctx);
        assert!(combat.target.is_none());
        assert_eq!(world.get::<Position>(a).unwrap().0, Vec3::ZERO);
    }
}
