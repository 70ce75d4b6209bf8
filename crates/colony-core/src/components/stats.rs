//! Stat Components
//!
//! The seven survival gauges of an agent and the rule that decides when the
//! agent dies.
//!
//! A stat is *good* while its value sits inside the baseline range and *bad*
//! otherwise. An agent dies when Health reaches its minimum or when the number
//! of bad stats reaches the configured threshold. Death is latched: a table
//! that has died never reports alive again, and raises its death signal once.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use colony_events::{StatSnapshot, StatType};

use crate::config::{StatProfile, StatsConfig, StressConfig};

/// Whether a stat is inside its baseline range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatState {
    Good,
    Bad,
}

/// A single bounded gauge
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub stat_type: StatType,
    pub profile: StatProfile,
    current: f64,
    /// Seconds accumulated toward the next interval drift
    drift_timer: f64,
}

impl Stat {
    pub fn new(stat_type: StatType, profile: StatProfile, value: f64) -> Self {
        let mut stat = Self {
            stat_type,
            profile,
            current: profile.absolute_min,
            drift_timer: 0.0,
        };
        stat.set(value);
        stat
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Position of the current value inside the absolute range, 0.0 to 1.0
    pub fn percentage(&self) -> f64 {
        let span = self.profile.absolute_max - self.profile.absolute_min;
        if span <= 0.0 {
            return 0.0;
        }
        (self.current - self.profile.absolute_min) / span
    }

    pub fn state(&self) -> StatState {
        if self.current >= self.profile.baseline_min && self.current <= self.profile.baseline_max {
            StatState::Good
        } else {
            StatState::Bad
        }
    }

    pub fn is_good(&self) -> bool {
        self.state() == StatState::Good
    }

    pub fn set(&mut self, value: f64) {
        self.current = value.clamp(self.profile.absolute_min, self.profile.absolute_max);
    }

    pub fn modify(&mut self, delta: f64) {
        self.set(self.current + delta);
    }

    /// Advance the drift timer, returning how many whole intervals elapsed
    fn elapsed_intervals(&mut self, dt: f64) -> u32 {
        let interval = self.profile.variation_interval;
        if interval <= 0.0 {
            return 0;
        }
        self.drift_timer += dt;
        let mut count = 0;
        while self.drift_timer >= interval {
            self.drift_timer -= interval;
            count += 1;
        }
        count
    }

    /// Move toward `target` by at most `step`, never overshooting
    fn step_toward(&mut self, target: f64, step: f64) {
        let step = step.abs();
        let diff = target - self.current;
        if diff.abs() <= step {
            self.set(target);
        } else {
            self.modify(step * diff.signum());
        }
    }

    pub fn to_snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            stat: self.stat_type,
            current: self.current,
            percentage: self.percentage(),
            good: self.is_good(),
        }
    }
}

/// Externally supplied inputs for one drift step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriftInputs {
    pub environment_target: f64,
    pub temperature_target: f64,
    /// Extra stress per second from nearby points of interest
    pub poi_stress_per_second: f64,
}

/// Component: all seven gauges of an agent
#[derive(Component, Debug, Clone)]
pub struct StatTable {
    stats: [Stat; StatType::COUNT],
    bad_stats_for_death: usize,
    deceased: bool,
    death_signal: bool,
}

impl StatTable {
    /// Build a table with every stat at the top of its baseline range
    pub fn new(config: &StatsConfig) -> Self {
        let stats = StatType::ALL.map(|stat_type| {
            let profile = *profile_for(config, stat_type);
            Stat::new(stat_type, profile, profile.baseline_max)
        });
        Self {
            stats,
            bad_stats_for_death: config.bad_stats_for_death,
            deceased: false,
            death_signal: false,
        }
    }

    /// Randomize every stat between the midpoint and the top of its baseline
    pub fn initialize(&mut self, rng: &mut impl Rng) {
        for stat in self.stats.iter_mut() {
            let low = (stat.profile.baseline_min + stat.profile.baseline_max) / 2.0;
            let high = stat.profile.baseline_max;
            let value = if high > low { rng.gen_range(low..=high) } else { high };
            stat.set(value);
            stat.drift_timer = 0.0;
        }
        self.check_death();
    }

    pub fn get(&self, stat_type: StatType) -> &Stat {
        &self.stats[stat_type.index()]
    }

    pub fn current(&self, stat_type: StatType) -> f64 {
        self.get(stat_type).current()
    }

    pub fn percentage(&self, stat_type: StatType) -> f64 {
        self.get(stat_type).percentage()
    }

    pub fn state(&self, stat_type: StatType) -> StatState {
        self.get(stat_type).state()
    }

    pub fn is_good(&self, stat_type: StatType) -> bool {
        self.get(stat_type).is_good()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stat> {
        self.stats.iter()
    }

    pub fn bad_stats(&self) -> Vec<StatType> {
        self.stats
            .iter()
            .filter(|s| !s.is_good())
            .map(|s| s.stat_type)
            .collect()
    }

    pub fn bad_count(&self) -> usize {
        self.stats.iter().filter(|s| !s.is_good()).count()
    }

    pub fn is_alive(&self) -> bool {
        !self.deceased
    }

    pub fn set(&mut self, stat_type: StatType, value: f64) {
        self.stats[stat_type.index()].set(value);
        self.check_death();
    }

    pub fn modify(&mut self, stat_type: StatType, delta: f64) {
        self.stats[stat_type.index()].modify(delta);
        self.check_death();
    }

    pub fn take_damage(&mut self, amount: f64) {
        self.modify(StatType::Health, -amount.abs());
    }

    pub fn heal(&mut self, amount: f64) {
        self.modify(StatType::Health, amount.abs());
    }

    /// Apply one tick of automatic drift
    pub fn tick(&mut self, dt: f64, inputs: &DriftInputs, stress: &StressConfig) {
        for stat_type in [StatType::Food, StatType::Water] {
            let stat = &mut self.stats[stat_type.index()];
            let intervals = stat.elapsed_intervals(dt);
            let amount = stat.profile.variation_amount;
            for _ in 0..intervals {
                stat.modify(amount);
            }
        }

        for (stat_type, target) in [
            (StatType::Environment, inputs.environment_target),
            (StatType::Temperature, inputs.temperature_target),
        ] {
            let stat = &mut self.stats[stat_type.index()];
            let intervals = stat.elapsed_intervals(dt);
            let step = stat.profile.variation_amount;
            for _ in 0..intervals {
                stat.step_toward(target, step);
            }
        }

        let food_bad = !self.is_good(StatType::Food);
        let water_bad = !self.is_good(StatType::Water);
        let space_bad = !self.is_good(StatType::Space);
        let mut rate = 0.0;
        if food_bad {
            rate += stress.food_bad_increase;
        }
        if water_bad {
            rate += stress.water_bad_increase;
        }
        if space_bad {
            rate += stress.space_bad_increase;
        }
        if !food_bad && !water_bad && !space_bad {
            rate -= stress.relief_per_second;
        }
        rate += inputs.poi_stress_per_second;
        self.stats[StatType::Stress.index()].modify(rate * dt);

        self.check_death();
    }

    /// Returns true exactly once, on the first call after the agent died
    pub fn take_death_signal(&mut self) -> bool {
        std::mem::take(&mut self.death_signal)
    }

    pub fn snapshot(&self) -> Vec<StatSnapshot> {
        self.stats.iter().map(Stat::to_snapshot).collect()
    }

    fn check_death(&mut self) {
        if self.deceased {
            return;
        }
        let health = self.get(StatType::Health);
        let health_gone = health.current() <= health.profile.absolute_min;
        if health_gone || self.bad_count() >= self.bad_stats_for_death {
            self.deceased = true;
            self.death_signal = true;
        }
    }
}

fn profile_for(config: &StatsConfig, stat_type: StatType) -> &StatProfile {
    match stat_type {
        StatType::Health => &config.health,
        StatType::Food => &config.food,
        StatType::Water => &config.water,
        StatType::Stress => &config.stress,
        StatType::Environment => &config.environment,
        StatType::Temperature => &config.temperature,
        StatType::Space => &config.space,
    }
}

/// Component: per-agent random offset around the ambient targets
#[derive(Component, Debug, Clone, Default)]
pub struct AmbientOffset {
    pub environment: f64,
    pub temperature: f64,
    /// Seconds until the offsets are resampled
    pub resample_in: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn table() -> StatTable {
        StatTable::new(&StatsConfig::default())
    }

    fn calm_inputs() -> DriftInputs {
        DriftInputs {
            environment_target: 50.0,
            temperature_target: 50.0,
            poi_stress_per_second: 0.0,
        }
    }

    #[test]
    fn test_state_and_percentage() {
        let mut t = table();
        t.set(StatType::Food, 40.0);
        assert_eq!(t.state(StatType::Food), StatState::Bad);
        assert!((t.percentage(StatType::Food) - 0.4).abs() < 1e-9);
        t.set(StatType::Food, 50.0);
        assert_eq!(t.state(StatType::Food), StatState::Good);
    }

    #[test]
    fn test_values_clamped() {
        let mut t = table();
        t.modify(StatType::Water, 500.0);
        assert_eq!(t.current(StatType::Water), 100.0);
        t.modify(StatType::Stress, -500.0);
        assert_eq!(t.current(StatType::Stress), 0.0);
    }

    #[test]
    fn test_initialize_within_upper_baseline() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut t = table();
        t.initialize(&mut rng);
        for stat in t.iter() {
            let mid = (stat.profile.baseline_min + stat.profile.baseline_max) / 2.0;
            assert!(stat.current() >= mid && stat.current() <= stat.profile.baseline_max);
        }
        assert!(t.is_alive());
        assert_eq!(t.bad_count(), 0);
    }

    #[test]
    fn test_one_bad_stat_survives_two_kill() {
        let mut t = table();
        t.set(StatType::Food, 10.0);
        assert!(t.is_alive());
        assert!(!t.take_death_signal());
        t.set(StatType::Water, 10.0);
        assert!(!t.is_alive());
        assert!(t.take_death_signal());
        assert!(!t.take_death_signal());
    }

    #[test]
    fn test_health_zero_kills() {
        let mut t = table();
        t.take_damage(100.0);
        assert!(!t.is_alive());
        assert!(t.take_death_signal());
    }

    #[test]
    fn test_simultaneous_conditions_signal_once() {
        let mut t = table();
        t.set(StatType::Food, 0.0);
        t.take_damage(200.0);
        assert!(t.take_death_signal());
        assert!(!t.take_death_signal());
    }

    #[test]
    fn test_death_latched() {
        let mut t = table();
        t.take_damage(100.0);
        t.heal(100.0);
        assert!(!t.is_alive());
    }

    #[test]
    fn test_food_and_water_interval_drift() {
        let mut t = table();
        let stress = StressConfig::default();
        for _ in 0..20 {
            t.tick(0.5, &calm_inputs(), &stress);
        }
        // 10 seconds: food drifts once, water twice
        assert!((t.current(StatType::Food) - 99.0).abs() < 1e-9);
        assert!((t.current(StatType::Water) - 98.0).abs() < 1e-9);
        assert_eq!(t.current(StatType::Health), 100.0);
    }

    #[test]
    fn test_environment_steps_toward_target() {
        let mut t = table();
        t.set(StatType::Environment, 60.0);
        let inputs = DriftInputs {
            environment_target: 58.5,
            ..calm_inputs()
        };
        let stress = StressConfig::default();
        t.tick(5.0, &inputs, &stress);
        assert!((t.current(StatType::Environment) - 59.0).abs() < 1e-9);
        t.tick(5.0, &inputs, &stress);
        assert!((t.current(StatType::Environment) - 58.5).abs() < 1e-9);
    }

    #[test]
    fn test_stress_rule() {
        let stress = StressConfig::default();

        let mut calm = table();
        calm.set(StatType::Stress, 50.0);
        calm.tick(1.0, &calm_inputs(), &stress);
        assert!((calm.current(StatType::Stress) - 49.9).abs() < 1e-9);

        let mut hungry = table();
        hungry.set(StatType::Stress, 50.0);
        hungry.set(StatType::Food, 20.0);
        hungry.tick(1.0, &calm_inputs(), &stress);
        assert!((hungry.current(StatType::Stress) - 50.5).abs() < 1e-9);

        let mut poi = table();
        poi.set(StatType::Stress, 50.0);
        let inputs = DriftInputs {
            poi_stress_per_second: 1.0,
            ..calm_inputs()
        };
        poi.tick(2.0, &inputs, &stress);
        assert!((poi.current(StatType::Stress) - 51.8).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_covers_all_stats() {
        let snap = table().snapshot();
        assert_eq!(snap.len(), StatType::COUNT);
        assert!(snap.iter().all(|s| s.good));
    }
}
