//! Behavior System
//!
//! Runs every living agent's arbiter once per tick, in agent id order. Each
//! agent's changes land in the world before the next agent is processed, so
//! when two agents race for the same item the first one processed wins.

use bevy_ecs::prelude::*;

use colony_events::EventKind;

use crate::behavior::{is_living_agent, BehaviorArbiter, BehaviorCtx, BehaviorSet};
use crate::components::{AgentId, Alive, SimClock};
use crate::config::ColonyConfig;
use crate::events::emit;
use crate::SimRng;

pub fn run_agent_behaviors(world: &mut World) {
    let dt = world.resource::<SimClock>().dt;
    let mut query = world.query_filtered::<(Entity, &AgentId), (With<Alive>, With<BehaviorSet>, With<BehaviorArbiter>)>();
    let mut agents: Vec<(AgentId, Entity)> = query
        .iter(world)
        .map(|(entity, id)| (id.clone(), entity))
        .collect();
    agents.sort();

    world.resource_scope(|world, config: Mut<ColonyConfig>| {
        world.resource_scope(|world, mut rng: Mut<SimRng>| {
            for (agent_id, agent) in agents {
                // struck down earlier this tick
                if !is_living_agent(world, agent) {
                    continue;
                }
                let mut entity = world.entity_mut(agent);
                let (Some(mut set), Some(mut arbiter)) =
                    (entity.take::<BehaviorSet>(), entity.take::<BehaviorArbiter>())
                else {
                    continue;
                };

                let switch = {
                    let mut ctx = BehaviorCtx {
                        world: &mut *world,
                        agent,
                        dt,
                        config: &config,
                        rng: &mut rng.0,
                    };
                    arbiter.update(&mut set, &mut ctx)
                };
                if let Some(switch) = switch {
                    emit(
                        world,
                        EventKind::BehaviorChanged {
                            agent_id: agent_id.0.clone(),
                            from: switch.from,
                            to: switch.to,
                        },
                    );
                }
                world.entity_mut(agent).insert((set, arbiter));
            }
        });
    });
}
