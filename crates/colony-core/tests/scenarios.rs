//! End-to-end colony scenarios
//!
//! Each test builds an empty colony, places a few agents and items by hand and
//! runs the real tick schedule.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use colony_core::behavior::BehaviorArbiter;
use colony_core::systems::{spawn_item, spawn_worker};
use colony_core::{ColonyConfig, Dead, Item, Picker, Simulation, StatTable};
use colony_events::{
    BehaviorKind, ColonyEvent, DeathCause, EventKind, ResourceKind, StatType,
};

/// No spawner, no initial population
fn quiet_config() -> ColonyConfig {
    let mut config = ColonyConfig::default();
    config.simulation.initial_workers = 0;
    config.spawning.initial_items = 0;
    config.spawning.item_interval = 1.0e6;
    config
}

fn worker(sim: &mut Simulation, rng: &mut SmallRng, at: Vec3) -> Entity {
    let config = sim.config().clone();
    spawn_worker(&mut sim.world, &config, at, rng).unwrap()
}

fn item(sim: &mut Simulation, kind: ResourceKind, at: Vec3) -> Entity {
    let config = sim.config().clone();
    spawn_item(&mut sim.world, &config, kind, at).unwrap()
}

fn set_stat(sim: &mut Simulation, agent: Entity, stat: StatType, value: f64) {
    sim.world.get_mut::<StatTable>(agent).unwrap().set(stat, value);
}

fn stat(sim: &Simulation, agent: Entity, stat: StatType) -> f64 {
    sim.world.get::<StatTable>(agent).unwrap().current(stat)
}

/// Step until an event matches, returning every event seen so far
fn run_until(
    sim: &mut Simulation,
    max_ticks: u64,
    done: impl Fn(&ColonyEvent) -> bool,
) -> Option<Vec<ColonyEvent>> {
    let mut seen = Vec::new();
    for _ in 0..max_ticks {
        let events = sim.step();
        let hit = events.iter().any(&done);
        seen.extend(events);
        if hit {
            return Some(seen);
        }
    }
    None
}

fn deaths(events: &[ColonyEvent]) -> Vec<&EventKind> {
    events
        .iter()
        .filter(|e| e.is_death())
        .map(|e| &e.payload)
        .collect()
}

#[test]
fn test_two_bad_stats_kill_once_and_agent_is_removed_next_tick() {
    let mut sim = Simulation::empty(quiet_config());
    let mut rng = SmallRng::seed_from_u64(1);
    let w = worker(&mut sim, &mut rng, Vec3::ZERO);
    set_stat(&mut sim, w, StatType::Food, 10.0);
    set_stat(&mut sim, w, StatType::Water, 10.0);

    let events = sim.step();
    let died = deaths(&events);
    assert_eq!(died.len(), 1);
    match died[0] {
        EventKind::AgentDied {
            agent_id,
            cause,
            killer,
            bad_stats,
            ..
        } => {
            assert_eq!(agent_id, "worker_0001");
            assert_eq!(*cause, DeathCause::Neglect);
            assert_eq!(*killer, None);
            assert!(bad_stats.contains(&StatType::Food));
            assert!(bad_stats.contains(&StatType::Water));
        }
        other => panic!("unexpected payload {:?}", other),
    }
    assert!(sim.world.get::<Dead>(w).is_some());

    // no second death event, then gone
    let events = sim.step();
    assert!(deaths(&events).is_empty());
    assert!(sim.agent("worker_0001").is_none());
}

#[test]
fn test_worker_hauls_loose_food_into_food_deposit() {
    let mut sim = Simulation::empty(quiet_config());
    let mut rng = SmallRng::seed_from_u64(2);
    let w = worker(&mut sim, &mut rng, Vec3::ZERO);
    let food = item(&mut sim, ResourceKind::Food, Vec3::new(4.0, 0.0, 0.0));

    let events = run_until(&mut sim, 600, |e| {
        matches!(e.payload, EventKind::ItemDeposited { .. })
    })
    .expect("food was never deposited");

    let picked = events
        .iter()
        .position(|e| matches!(e.payload, EventKind::ItemPickedUp { item_id: 1, .. }))
        .expect("pickup before deposit");
    let deposited = events
        .iter()
        .position(|e| {
            matches!(
                &e.payload,
                EventKind::ItemDeposited { item_id: 1, deposit, .. } if deposit == "food_deposit"
            )
        })
        .unwrap();
    assert!(picked < deposited);

    assert!(sim.world.get::<Picker>(w).unwrap().is_free());
    assert!(!sim.world.get::<Item>(food).unwrap().is_held());
    let snapshot = sim.snapshot("test");
    let stored = snapshot
        .deposits
        .iter()
        .find(|d| d.resource == ResourceKind::Food)
        .unwrap();
    assert_eq!(stored.items_inside, 1);
}

#[test]
fn test_combat_death_relieves_killer_and_bystander_stress() {
    let mut config = quiet_config();
    config.stress.relief_per_second = 0.0;
    config.stats.food.variation_interval = 0.0;
    config.stats.water.variation_interval = 0.0;
    config.combat.damage = 200.0;
    let mut sim = Simulation::empty(config);
    let mut rng = SmallRng::seed_from_u64(3);

    let a = worker(&mut sim, &mut rng, Vec3::new(0.0, 0.0, 0.0));
    let b = worker(&mut sim, &mut rng, Vec3::new(4.0, 0.0, 0.0));
    let bystander = worker(&mut sim, &mut rng, Vec3::new(-15.0, 0.0, 15.0));
    set_stat(&mut sim, a, StatType::Stress, 10.0);
    set_stat(&mut sim, b, StatType::Stress, 10.0);
    set_stat(&mut sim, bystander, StatType::Stress, 50.0);

    let events = run_until(&mut sim, 200, |e| e.is_death()).expect("nobody died");
    let died = deaths(&events);
    assert_eq!(died.len(), 1);
    let (victim_id, killer_id) = match died[0] {
        EventKind::AgentDied {
            agent_id,
            cause: DeathCause::Killed,
            killer: Some(killer),
            ..
        } => (agent_id.clone(), killer.clone()),
        other => panic!("expected a combat death, got {:?}", other),
    };
    assert_ne!(victim_id, killer_id);
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventKind::Attack { target_id, target_health, .. }
            if *target_id == victim_id && *target_health == 0.0
    )));

    let killer = if killer_id == "worker_0001" { a } else { b };
    // 10 less, clamped at the floor
    assert_eq!(stat(&sim, killer, StatType::Stress), 0.0);
    // the victim fought, so everyone else is relieved once
    assert_eq!(stat(&sim, bystander, StatType::Stress), 40.0);
    assert_eq!(
        sim.world.get::<BehaviorArbiter>(bystander).unwrap().active(),
        Some(BehaviorKind::Fallback)
    );
}

#[test]
fn test_hungry_worker_eats_fresh_food_before_rotten() {
    let mut config = quiet_config();
    // still hungry after one meal, so both items get eaten
    config.consumption.need_threshold = 0.5;
    let mut sim = Simulation::empty(config);
    let mut rng = SmallRng::seed_from_u64(4);
    let w = worker(&mut sim, &mut rng, Vec3::new(7.0, 0.0, 0.0));
    let rotten = item(&mut sim, ResourceKind::Food, Vec3::new(9.0, 0.0, 0.0));
    item(&mut sim, ResourceKind::Food, Vec3::new(12.0, 0.0, 0.0));
    sim.world.get_mut::<Item>(rotten).unwrap().rot_level = 80.0;
    set_stat(&mut sim, w, StatType::Food, 20.0);
    set_stat(&mut sim, w, StatType::Stress, 30.0);

    let events = run_until(&mut sim, 350, |e| {
        matches!(e.payload, EventKind::ItemConsumed { item_id: 1, .. })
    })
    .expect("the rotten item was never eaten");
    assert!(deaths(&events).is_empty());

    let meals: Vec<(u64, f64, f64)> = events
        .iter()
        .filter_map(|e| match &e.payload {
            EventKind::ItemConsumed {
                item_id,
                amount,
                stat_after,
                ..
            } => Some((*item_id, *amount, *stat_after)),
            _ => None,
        })
        .collect();

    // the nearer rotten item is skipped for the fresh one
    assert_eq!(meals.len(), 2);
    assert_eq!(meals[0].0, 2);
    assert_eq!(meals[1].0, 1);
    assert!((meals[0].1 - 10.0).abs() < 1e-6);
    assert!(meals[0].2 > 20.0);
    assert!(meals[1].2 > meals[0].2);
}
