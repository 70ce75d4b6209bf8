//! Behavior Arbiter
//!
//! Selects which behavior of an agent runs. Registered kinds are kept in
//! descending priority order; every evaluation interval the first enabled
//! behavior whose `can_activate` holds wins. A newly activated behavior is
//! always updated at least once before it can be switched off again.

use bevy_ecs::prelude::*;
use tracing::debug;

use colony_events::BehaviorKind;

use super::{Behavior, BehaviorCtx, BehaviorSet};
use crate::components::IntervalTimer;

/// A change of active behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorSwitch {
    pub from: Option<BehaviorKind>,
    pub to: Option<BehaviorKind>,
}

/// Component: per-agent behavior selector
#[derive(Component, Debug, Clone)]
pub struct BehaviorArbiter {
    order: Vec<BehaviorKind>,
    active: Option<BehaviorKind>,
    timer: IntervalTimer,
    updated_since_activation: bool,
    evaluation_pending: bool,
}

impl BehaviorArbiter {
    /// Arbiter over `kinds`, evaluating on its first update
    pub fn new(kinds: impl IntoIterator<Item = BehaviorKind>, evaluation_interval: f32) -> Self {
        let mut arbiter = Self {
            order: Vec::new(),
            active: None,
            timer: IntervalTimer::primed(evaluation_interval),
            updated_since_activation: true,
            evaluation_pending: false,
        };
        for kind in kinds {
            arbiter.register(kind);
        }
        arbiter
    }

    /// Add a kind, keeping the order by descending priority
    pub fn register(&mut self, kind: BehaviorKind) {
        if self.order.contains(&kind) {
            return;
        }
        self.order.push(kind);
        self.order.sort_by_key(|k| std::cmp::Reverse(k.priority()));
    }

    pub fn order(&self) -> &[BehaviorKind] {
        &self.order
    }

    pub fn active(&self) -> Option<BehaviorKind> {
        self.active
    }

    /// First registered behavior that is enabled and able to run
    pub fn select(&self, set: &BehaviorSet, ctx: &BehaviorCtx) -> Option<BehaviorKind> {
        self.order.iter().copied().find(|kind| {
            set.get(*kind)
                .map(|b| b.is_enabled() && b.can_activate(&*ctx.world, ctx.agent, ctx.config))
                .unwrap_or(false)
        })
    }

    /// Advance one tick: re-evaluate when due, then update the active behavior
    pub fn update(&mut self, set: &mut BehaviorSet, ctx: &mut BehaviorCtx) -> Option<BehaviorSwitch> {
        if self.timer.tick(ctx.dt) {
            self.evaluation_pending = true;
        }

        let mut switch = None;
        if self.evaluation_pending && self.updated_since_activation {
            self.evaluation_pending = false;
            let winner = self.select(set, ctx);
            if winner != self.active {
                switch = Some(self.switch_to(winner, set, ctx));
            }
        }

        if let Some(kind) = self.active {
            if let Some(behavior) = set.get_mut(kind) {
                behavior.update(ctx);
                self.updated_since_activation = true;
            }
        }

        debug_assert!(set.active_count() <= 1, "more than one active behavior");
        switch
    }

    /// Deactivate whatever is running
    pub fn deactivate_all(&mut self, set: &mut BehaviorSet, ctx: &mut BehaviorCtx) -> Option<BehaviorSwitch> {
        if self.active.is_none() {
            return None;
        }
        Some(self.switch_to(None, set, ctx))
    }

    fn switch_to(
        &mut self,
        winner: Option<BehaviorKind>,
        set: &mut BehaviorSet,
        ctx: &mut BehaviorCtx,
    ) -> BehaviorSwitch {
        let from = self.active;
        if let Some(old) = from.and_then(|k| set.get_mut(k)) {
            old.core_mut().active = false;
            old.on_deactivate(ctx);
        }
        if let Some(new) = winner.and_then(|k| set.get_mut(k)) {
            new.core_mut().active = true;
            new.on_activate(ctx);
        }
        self.active = winner;
        self.updated_since_activation = winner.is_none();
        debug!(
            "{}: behavior {:?} -> {:?}",
            super::agent_label(ctx.world, ctx.agent),
            from,
            winner
        );
        BehaviorSwitch { from, to: winner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{BehaviorCore, CombatBehavior, FallbackBehavior};
    use crate::components::{Alive, StatTable};
    use crate::config::ColonyConfig;
    use colony_events::StatType;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup() -> (World, Entity, ColonyConfig) {
        let config = ColonyConfig::default();
        let mut world = World::new();
        let agent = world.spawn((Alive, StatTable::new(&config.stats))).id();
        (world, agent, config)
    }

    fn tick(
        arbiter: &mut BehaviorArbiter,
        set: &mut BehaviorSet,
        world: &mut World,
        agent: Entity,
        config: &ColonyConfig,
        rng: &mut SmallRng,
        dt: f32,
    ) -> Option<BehaviorSwitch> {
        let mut ctx = BehaviorCtx {
            world,
            agent,
            dt,
            config,
            rng,
        };
        arbiter.update(set, &mut ctx)
    }

    #[test]
    fn test_registration_sorted_by_priority() {
        let arbiter = BehaviorArbiter::new(
            [BehaviorKind::Fallback, BehaviorKind::Combat, BehaviorKind::Consumption],
            0.5,
        );
        assert_eq!(
            arbiter.order(),
            &[BehaviorKind::Combat, BehaviorKind::Consumption, BehaviorKind::Fallback]
        );
    }

    #[test]
    fn test_highest_eligible_wins_and_switches() {
        let (mut world, agent, config) = setup();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut set = BehaviorSet {
            combat: Some(CombatBehavior::new()),
            fallback: Some(FallbackBehavior::new(2.0)),
            ..Default::default()
        };
        let mut arbiter = BehaviorArbiter::new(set.kinds(), 0.5);

        let switch = tick(&mut arbiter, &mut set, &mut world, agent, &config, &mut rng, 0.1);
        assert_eq!(
            switch,
            Some(BehaviorSwitch {
                from: None,
                to: Some(BehaviorKind::Fallback)
            })
        );
        assert!(set.fallback.as_ref().unwrap().is_active());

        // calm agent turns aggressive; picked up at the next evaluation only
        world
            .get_mut::<StatTable>(agent)
            .unwrap()
            .set(StatType::Stress, 15.0);
        assert_eq!(
            tick(&mut arbiter, &mut set, &mut world, agent, &config, &mut rng, 0.1),
            None
        );
        let mut switched = None;
        for _ in 0..5 {
            switched = switched.or(tick(&mut arbiter, &mut set, &mut world, agent, &config, &mut rng, 0.1));
        }
        assert_eq!(switched.map(|s| s.to), Some(Some(BehaviorKind::Combat)));
        assert_eq!(arbiter.active(), Some(BehaviorKind::Combat));
        assert_eq!(set.active_count(), 1);
        assert!(!set.fallback.as_ref().unwrap().is_active());
    }

    #[test]
    fn test_disabled_behavior_skipped() {
        let (mut world, agent, config) = setup();
        world
            .get_mut::<StatTable>(agent)
            .unwrap()
            .set(StatType::Stress, 15.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut combat = CombatBehavior::new();
        *combat.core_mut() = BehaviorCore {
            enabled: false,
            active: false,
        };
        let mut set = BehaviorSet {
            combat: Some(combat),
            fallback: Some(FallbackBehavior::new(2.0)),
            ..Default::default()
        };
        let mut arbiter = BehaviorArbiter::new(set.kinds(), 0.5);
        tick(&mut arbiter, &mut set, &mut world, agent, &config, &mut rng, 0.1);
        assert_eq!(arbiter.active(), Some(BehaviorKind::Fallback));
    }

    #[test]
    fn test_all_ineligible_is_idle() {
        let (mut world, agent, config) = setup();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut set = BehaviorSet {
            combat: Some(CombatBehavior::new()),
            ..Default::default()
        };
        let mut arbiter = BehaviorArbiter::new(set.kinds(), 0.5);
        assert_eq!(
            tick(&mut arbiter, &mut set, &mut world, agent, &config, &mut rng, 0.1),
            None
        );
        assert_eq!(arbiter.active(), None);
        assert_eq!(set.active_count(), 0);
    }

    #[test]
    fn test_deactivate_all() {
        let (mut world, agent, config) = setup();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut set = BehaviorSet {
            fallback: Some(FallbackBehavior::new(2.0)),
            ..Default::default()
        };
        let mut arbiter = BehaviorArbiter::new(set.kinds(), 0.5);
        tick(&mut arbiter, &mut set, &mut world, agent, &config, &mut rng, 0.1);

        let mut ctx = BehaviorCtx {
            world: &mut world,
            agent,
            dt: 0.1,
            config: &config,
            rng: &mut rng,
        };
        let switch = arbiter.deactivate_all(&mut set, &mut ctx);
        assert_eq!(switch.and_then(|s| s.from), Some(BehaviorKind::Fallback));
        assert_eq!(set.active_count(), 0);
        assert!(arbiter.deactivate_all(&mut set, &mut ctx).is_none());
    }
}
