//! Death Resolution
//!
//! Turns latched death signals into dead agents: the running behavior is
//! switched off, any carried item is dropped, stress relief is handed out and
//! the agent is marked `Dead`. Dead agents are despawned at the start of the
//! following tick.

use bevy_ecs::prelude::*;
use tracing::info;

use colony_events::{AgentRole, BehaviorKind, DeathCause, EventKind, StatType};

use crate::behavior::{agent_label, is_living_agent, BehaviorArbiter, BehaviorCtx, BehaviorSet};
use crate::components::{drop_item, AgentId, Alive, Dead, ItemId, LastAttacker, Picker, Position, Role, StatTable};
use crate::config::ColonyConfig;
use crate::events::emit;
use crate::SimRng;

/// A death being processed
#[derive(Debug, Clone)]
struct Fatality {
    entity: Entity,
    cause: DeathCause,
    killer: Option<Entity>,
    bad_stats: Vec<StatType>,
}

/// Resolve every agent whose stat table has latched death
pub fn resolve_deaths(world: &mut World) {
    let mut dying: Vec<(AgentId, Entity)> = Vec::new();
    let mut query = world.query_filtered::<(Entity, &AgentId, &mut StatTable), With<Alive>>();
    for (entity, id, mut stats) in query.iter_mut(world) {
        let signalled = stats.take_death_signal();
        if signalled || !stats.is_alive() {
            dying.push((id.clone(), entity));
        }
    }
    dying.sort();

    for (_, entity) in dying {
        let fatality = classify(world, entity);
        kill(world, fatality);
    }
}

/// First resolution pass, after stat drift
pub fn resolve_drift_deaths(world: &mut World) {
    resolve_deaths(world);
}

/// Second resolution pass, after behaviors have dealt damage
pub fn resolve_combat_deaths(world: &mut World) {
    resolve_deaths(world);
}

fn classify(world: &World, entity: Entity) -> Fatality {
    let stats = world.get::<StatTable>(entity);
    let health = stats.map(|s| s.current(StatType::Health)).unwrap_or(0.0);
    let bad_stats = stats.map(|s| s.bad_stats()).unwrap_or_default();
    let attacker = world.get::<LastAttacker>(entity).map(|a| a.0);

    let (cause, killer) = if health <= 0.0 {
        match attacker {
            Some(killer) => (DeathCause::Killed, Some(killer)),
            None => (DeathCause::HealthDepleted, None),
        }
    } else {
        (DeathCause::Neglect, None)
    };
    Fatality {
        entity,
        cause,
        killer,
        bad_stats,
    }
}

fn kill(world: &mut World, fatality: Fatality) {
    let entity = fatality.entity;
    let fought = world
        .get::<BehaviorArbiter>(entity)
        .map(|a| a.active() == Some(BehaviorKind::Combat))
        .unwrap_or(false);

    stop_behaviors(world, entity);

    if let Some(item) = world.get::<Picker>(entity).and_then(|p| p.carrying) {
        if drop_item(world, item, entity) {
            let position = world.get::<Position>(item).map(|p| p.to_array()).unwrap_or_default();
            let item_id = world.get::<ItemId>(item).map(|i| i.0).unwrap_or_default();
            let agent_id = agent_label(world, entity);
            emit(
                world,
                EventKind::ItemDropped {
                    agent_id,
                    item_id,
                    position,
                },
            );
        }
    }

    let mut agent = world.entity_mut(entity);
    agent.remove::<Alive>();
    agent.insert(Dead {
        cause: fatality.cause,
    });

    let agent_id = agent_label(world, entity);
    let role = world.get::<Role>(entity).map(|r| r.0).unwrap_or(AgentRole::Worker);
    let killer = fatality.killer.map(|k| agent_label(world, k));
    info!(
        "{} died ({:?}{})",
        agent_id,
        fatality.cause,
        killer.as_deref().map(|k| format!(", killed by {}", k)).unwrap_or_default()
    );
    emit(
        world,
        EventKind::AgentDied {
            agent_id,
            role,
            cause: fatality.cause,
            killer,
            bad_stats: fatality.bad_stats,
        },
    );

    relieve_stress(world, fatality.killer, fought);
}

/// Switch off whatever the dying agent was doing
fn stop_behaviors(world: &mut World, entity: Entity) {
    if !world.contains_resource::<ColonyConfig>() || !world.contains_resource::<SimRng>() {
        return;
    }
    let mut agent = world.entity_mut(entity);
    let (Some(mut set), Some(mut arbiter)) = (agent.take::<BehaviorSet>(), agent.take::<BehaviorArbiter>()) else {
        return;
    };

    let switch = world.resource_scope(|world, config: Mut<ColonyConfig>| {
        world.resource_scope(|world, mut rng: Mut<SimRng>| {
            let dt = world
                .get_resource::<crate::components::SimClock>()
                .map(|c| c.dt)
                .unwrap_or(0.0);
            let mut ctx = BehaviorCtx {
                world,
                agent: entity,
                dt,
                config: &config,
                rng: &mut rng.0,
            };
            arbiter.deactivate_all(&mut set, &mut ctx)
        })
    });

    if let Some(switch) = switch {
        let agent_id = agent_label(world, entity);
        emit(
            world,
            EventKind::BehaviorChanged {
                agent_id,
                from: switch.from,
                to: switch.to,
            },
        );
    }
    world.entity_mut(entity).insert((set, arbiter));
}

/// Killer gets relief; when a fighter dies everyone else alive does too
fn relieve_stress(world: &mut World, killer: Option<Entity>, fought: bool) {
    let amount = world
        .get_resource::<ColonyConfig>()
        .map(|c| c.combat.stress_reduction_on_death)
        .unwrap_or(0.0);
    if amount == 0.0 {
        return;
    }

    let mut relieved: Vec<Entity> = Vec::new();
    if let Some(killer) = killer.filter(|k| is_living_agent(world, *k)) {
        relieved.push(killer);
    }
    if fought {
        let mut query = world.query_filtered::<Entity, With<Alive>>();
        let others: Vec<Entity> = query
            .iter(world)
            .filter(|e| Some(*e) != killer)
            .collect();
        relieved.extend(others);
    }

    for entity in relieved {
        if let Some(mut stats) = world.get_mut::<StatTable>(entity) {
            stats.modify(StatType::Stress, -amount);
        }
    }
}

/// Remove agents that died during the previous tick
pub fn despawn_dead(mut commands: Commands, dead: Query<Entity, With<Dead>>) {
    for entity in dead.iter() {
        commands.entity(entity).despawn();
    }
}
