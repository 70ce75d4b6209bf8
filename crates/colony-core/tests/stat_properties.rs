//! Property tests for the stat table
//!
//! Whatever sequence of modifications and drift ticks is applied, every stat
//! stays inside its absolute range and death is reported exactly once.

use colony_core::config::{StatsConfig, StressConfig};
use colony_core::{DriftInputs, StatTable};
use colony_events::StatType;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Modify(usize, f64),
    Set(usize, f64),
    Tick {
        dt: f64,
        environment: f64,
        temperature: f64,
        poi: f64,
    },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..7, -150.0f64..150.0).prop_map(|(i, d)| Op::Modify(i, d)),
        (0usize..7, -50.0f64..200.0).prop_map(|(i, v)| Op::Set(i, v)),
        (0.0f64..5.0, 0.0f64..100.0, 0.0f64..100.0, 0.0f64..3.0).prop_map(
            |(dt, environment, temperature, poi)| Op::Tick {
                dt,
                environment,
                temperature,
                poi,
            }
        ),
    ]
}

fn apply(table: &mut StatTable, op: &Op, stress: &StressConfig) {
    match *op {
        Op::Modify(i, delta) => table.modify(StatType::ALL[i], delta),
        Op::Set(i, value) => table.set(StatType::ALL[i], value),
        Op::Tick {
            dt,
            environment,
            temperature,
            poi,
        } => table.tick(
            dt,
            &DriftInputs {
                environment_target: environment,
                temperature_target: temperature,
                poi_stress_per_second: poi,
            },
            stress,
        ),
    }
}

proptest! {
    #[test]
    fn property_stats_stay_within_absolute_bounds(ops in prop::collection::vec(op(), 0..80)) {
        let mut table = StatTable::new(&StatsConfig::default());
        let stress = StressConfig::default();
        for op in &ops {
            apply(&mut table, op, &stress);
            for stat in table.iter() {
                prop_assert!(stat.current() >= stat.profile.absolute_min);
                prop_assert!(stat.current() <= stat.profile.absolute_max);
                prop_assert!((0.0..=1.0).contains(&stat.percentage()));
            }
        }
    }

    #[test]
    fn property_death_is_latched_and_signalled_once(ops in prop::collection::vec(op(), 0..80)) {
        let mut table = StatTable::new(&StatsConfig::default());
        let stress = StressConfig::default();
        let mut signals = 0;
        let mut died_at = None;
        for (i, op) in ops.iter().enumerate() {
            apply(&mut table, op, &stress);
            if table.take_death_signal() {
                signals += 1;
            }
            if !table.is_alive() && died_at.is_none() {
                died_at = Some(i);
            }
            if died_at.is_some() {
                prop_assert!(!table.is_alive());
            }
        }
        prop_assert_eq!(signals, usize::from(!table.is_alive()));
    }

    #[test]
    fn property_living_table_has_health_and_few_bad_stats(ops in prop::collection::vec(op(), 0..80)) {
        let config = StatsConfig::default();
        let mut table = StatTable::new(&config);
        let stress = StressConfig::default();
        for op in &ops {
            apply(&mut table, op, &stress);
            if table.is_alive() {
                prop_assert!(table.current(StatType::Health) > config.health.absolute_min);
                prop_assert!(table.bad_count() < config.bad_stats_for_death);
            }
        }
    }
}
