//! Configuration System
//!
//! Loads tuning parameters from `colony.toml` so a run can be adjusted without
//! recompiling. Every section falls back to its defaults, so a file only needs
//! the values it changes. The configuration is fixed for the duration of a run.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use colony_events::ResourceKind;

use crate::components::item::{Quality, SizeClass};

/// Default tuning file path
pub const DEFAULT_CONFIG_PATH: &str = "colony.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Resource: top-level configuration structure
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColonyConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub stress: StressConfig,
    #[serde(default)]
    pub space: SpaceConfig,
    #[serde(default)]
    pub arbiter: ArbiterConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub picker: PickerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub consumption: ConsumptionConfig,
    #[serde(default)]
    pub pickup_seek: PickupSeekConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub deposits: DepositsConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub spawning: SpawningConfig,
    #[serde(default)]
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub items: ItemsConfig,
}

impl ColonyConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        if !Path::new(DEFAULT_CONFIG_PATH).exists() {
            return Self::default();
        }
        Self::from_file(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_seconds <= 0.0 {
            return Err(ConfigError::Invalid("simulation.tick_seconds must be positive".into()));
        }
        if self.arbiter.evaluation_interval <= 0.0 {
            return Err(ConfigError::Invalid("arbiter.evaluation_interval must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.movement.carry_speed_multiplier)
            || self.movement.carry_speed_multiplier == 0.0
        {
            return Err(ConfigError::Invalid(
                "movement.carry_speed_multiplier must be in (0, 1)".into(),
            ));
        }
        if self.stats.bad_stats_for_death == 0 {
            return Err(ConfigError::Invalid("stats.bad_stats_for_death must be at least 1".into()));
        }
        for (name, profile) in self.stats.profiles() {
            if !(profile.absolute_min <= profile.baseline_min
                && profile.baseline_min <= profile.baseline_max
                && profile.baseline_max <= profile.absolute_max
                && profile.absolute_min < profile.absolute_max)
            {
                return Err(ConfigError::Invalid(format!(
                    "stats.{} ranges must satisfy absolute_min <= baseline_min <= baseline_max <= absolute_max",
                    name
                )));
            }
        }
        for (name, deposit) in [("food", &self.deposits.food), ("water", &self.deposits.water)] {
            if deposit.radius <= 0.0 || deposit.clearing_radius < deposit.radius {
                return Err(ConfigError::Invalid(format!(
                    "deposits.{}: radius must be positive and clearing_radius >= radius",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Run-level parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per tick
    pub tick_seconds: f32,
    pub default_ticks: u64,
    pub snapshot_interval: u64,
    pub seed: u64,
    pub initial_workers: usize,
    pub queen_position: [f32; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.1,
            default_ticks: 6000,
            snapshot_interval: 600,
            seed: 42,
            initial_workers: 12,
            queen_position: [0.0, 0.0, 0.0],
        }
    }
}

/// Ranges and drift of one stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatProfile {
    pub baseline_min: f64,
    pub baseline_max: f64,
    pub absolute_min: f64,
    pub absolute_max: f64,
    /// Signed change applied every `variation_interval` seconds
    pub variation_amount: f64,
    /// Seconds between automatic changes; 0 disables interval drift
    pub variation_interval: f64,
}

impl StatProfile {
    pub const fn new(
        baseline_min: f64,
        baseline_max: f64,
        variation_amount: f64,
        variation_interval: f64,
    ) -> Self {
        Self {
            baseline_min,
            baseline_max,
            absolute_min: 0.0,
            absolute_max: 100.0,
            variation_amount,
            variation_interval,
        }
    }
}

/// Per-stat profiles and the death threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub health: StatProfile,
    pub food: StatProfile,
    pub water: StatProfile,
    pub stress: StatProfile,
    pub environment: StatProfile,
    pub temperature: StatProfile,
    pub space: StatProfile,
    /// Number of simultaneous bad stats that kills an agent
    pub bad_stats_for_death: usize,
}

impl StatsConfig {
    fn profiles(&self) -> [(&'static str, &StatProfile); 7] {
        [
            ("health", &self.health),
            ("food", &self.food),
            ("water", &self.water),
            ("stress", &self.stress),
            ("environment", &self.environment),
            ("temperature", &self.temperature),
            ("space", &self.space),
        ]
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            health: StatProfile::new(50.0, 100.0, 0.0, 0.0),
            food: StatProfile::new(50.0, 100.0, -1.0, 10.0),
            water: StatProfile::new(50.0, 100.0, -1.0, 5.0),
            stress: StatProfile::new(10.0, 80.0, 0.0, 0.0),
            // For environment and temperature the amount is the step size toward the target
            environment: StatProfile::new(30.0, 70.0, 1.0, 5.0),
            temperature: StatProfile::new(30.0, 70.0, 1.0, 5.0),
            space: StatProfile::new(30.0, 100.0, 0.0, 0.0),
            bad_stats_for_death: 2,
        }
    }
}

/// Continuous stress rule, all values per second
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub food_bad_increase: f64,
    pub water_bad_increase: f64,
    pub space_bad_increase: f64,
    /// Decrease applied while food, water and space are all good
    pub relief_per_second: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            food_bad_increase: 0.5,
            water_bad_increase: 0.5,
            space_bad_increase: 0.3,
            relief_per_second: 0.1,
        }
    }
}

/// Crowding recomputation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub interval: f32,
    pub radius: f32,
    /// More neighbours than this is crowded
    pub crowded_above: usize,
    /// Fewer neighbours than this is lonely
    pub lonely_below: usize,
    pub crowded_delta: f64,
    pub lonely_delta: f64,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            interval: 20.0,
            radius: 10.0,
            crowded_above: 10,
            lonely_below: 2,
            crowded_delta: -1.0,
            lonely_delta: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Seconds between behavior re-evaluations
    pub evaluation_interval: f32,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            evaluation_interval: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub worker_speed: f32,
    pub stopping_distance: f32,
    /// Speed factor while carrying an item
    pub carry_speed_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            worker_speed: 3.0,
            stopping_distance: 0.5,
            carry_speed_multiplier: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub max_carry_weight: f32,
    pub max_pickup_size: SizeClass,
    /// Height of the attachment point above the carrier
    pub attach_height: f32,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            max_carry_weight: 5.0,
            max_pickup_size: SizeClass::Medium,
            attach_height: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub search_radius: f32,
    /// Distance from the queen at which a delivery is dropped
    pub delivery_distance: f32,
    pub eligible: Vec<ResourceKind>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            search_radius: 60.0,
            delivery_distance: 1.5,
            eligible: ResourceKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Stress percentage at or below which an agent turns aggressive
    pub stress_threshold: f64,
    pub combat_range: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub damage: f64,
    pub stress_reduction_on_death: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            stress_threshold: 0.2,
            combat_range: 8.0,
            attack_range: 1.0,
            attack_cooldown: 1.0,
            damage: 10.0,
            stress_reduction_on_death: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionConfig {
    /// Need percentage below which an agent looks for something to consume
    pub need_threshold: f64,
    /// Need percentage at which consuming stops
    pub satisfied_threshold: f64,
    /// Priority penalty per unit of distance
    pub distance_weight: f64,
    pub consume_range: f32,
    /// Rot fraction past which an item is no longer consumable
    pub spoiled_rot_fraction: f64,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            need_threshold: 0.3,
            satisfied_threshold: 0.9,
            distance_weight: 0.05,
            consume_range: 1.0,
            spoiled_rot_fraction: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupSeekConfig {
    pub search_radius: f32,
    /// How far outside the deposit edge hauled items are dropped
    pub drop_clearance: f32,
}

impl Default for PickupSeekConfig {
    fn default() -> Self {
        Self {
            search_radius: 60.0,
            drop_clearance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub check_interval: f32,
    pub random_sand_break_chance: f64,
    pub existing_hole_break_chance: f64,
    pub move_chance: f64,
    pub wander_radius: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            check_interval: 2.0,
            random_sand_break_chance: 0.1,
            existing_hole_break_chance: 0.6,
            move_chance: 0.5,
            wander_radius: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositConfig {
    pub name: String,
    pub position: [f32; 3],
    pub radius: f32,
    pub clearing_radius: f32,
    /// Number of block levels removed by clearing, counted from the bottom
    pub clearing_levels: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositsConfig {
    pub food: DepositConfig,
    pub water: DepositConfig,
    pub clearing_interval: f32,
}

impl Default for DepositsConfig {
    fn default() -> Self {
        Self {
            food: DepositConfig {
                name: "food_deposit".into(),
                position: [10.0, 0.0, 0.0],
                radius: 3.0,
                clearing_radius: 4.5,
                clearing_levels: 2,
            },
            water: DepositConfig {
                name: "water_deposit".into(),
                position: [-10.0, 0.0, 0.0],
                radius: 3.0,
                clearing_radius: 4.5,
                clearing_levels: 2,
            },
            clearing_interval: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: i32,
    pub depth: i32,
    pub height: i32,
    /// Filled layers at generation
    pub sand_layers: i32,
    pub block_size: f32,
    pub max_blocks: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 40,
            depth: 40,
            height: 8,
            sand_layers: 2,
            block_size: 1.0,
            max_blocks: 20_000,
        }
    }
}

/// Kind of point-of-interest emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterKind {
    Danger,
    Safety,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub kind: EmitterKind,
    pub position: [f32; 3],
    pub radius: f32,
    /// Stress change per second at the emitter centre
    pub stress_per_second: f64,
    /// Offset applied to the environment target at the emitter centre
    pub environment_offset: f64,
    /// Offset applied to the temperature target at the emitter centre
    pub temperature_offset: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub temperature_target: f64,
    pub environment_target: f64,
    /// Half-width of the random offset around each target
    pub variance: f64,
    pub emitters: Vec<EmitterConfig>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            temperature_target: 50.0,
            environment_target: 50.0,
            variance: 5.0,
            emitters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawningConfig {
    pub item_interval: f32,
    pub max_items: usize,
    pub initial_items: usize,
    pub max_workers: usize,
    pub brood_interval: f32,
    /// Queen food percentage required to spawn a worker
    pub brood_food_threshold: f64,
    pub brood_food_cost: f64,
}

impl Default for SpawningConfig {
    fn default() -> Self {
        Self {
            item_interval: 8.0,
            max_items: 64,
            initial_items: 10,
            max_workers: 40,
            brood_interval: 60.0,
            brood_food_threshold: 0.6,
            brood_food_cost: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub request_interval: f32,
    /// Queen stat percentage below which a resource is requested
    pub request_below: f64,
    /// Queen stat percentage at which a request is cleared
    pub clear_at: f64,
    pub consume_radius: f32,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            request_interval: 1.0,
            request_below: 0.5,
            clear_at: 0.8,
            consume_radius: 2.0,
        }
    }
}

/// Physical and consumable properties of one resource kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemProfile {
    pub weight: f32,
    pub size: SizeClass,
    pub max_amount: f64,
    pub max_rot: f64,
    /// Rot gained per second
    pub rot_rate: f64,
    /// Amount drained per second while being consumed
    pub consumption_rate: f64,
    pub quality: Quality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    pub food: ItemProfile,
    pub water: ItemProfile,
}

impl ItemsConfig {
    pub fn profile(&self, kind: ResourceKind) -> &ItemProfile {
        match kind {
            ResourceKind::Food => &self.food,
            ResourceKind::Water => &self.water,
        }
    }
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            food: ItemProfile {
                weight: 1.0,
                size: SizeClass::Small,
                max_amount: 10.0,
                max_rot: 100.0,
                rot_rate: 0.25,
                consumption_rate: 2.0,
                quality: Quality::Normal,
            },
            water: ItemProfile {
                weight: 1.5,
                size: SizeClass::Small,
                max_amount: 10.0,
                max_rot: 100.0,
                rot_rate: 0.0,
                consumption_rate: 3.0,
                quality: Quality::Normal,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ColonyConfig::default();
        assert_eq!(config.stats.bad_stats_for_death, 2);
        assert_eq!(config.arbiter.evaluation_interval, 0.5);
        assert!(config.movement.carry_speed_multiplier < 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ColonyConfig::from_str(
            r#"
            [combat]
            damage = 25.0

            [simulation]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.combat.damage, 25.0);
        assert_eq!(config.combat.attack_cooldown, 1.0);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.tick_seconds, 0.1);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ColonyConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = ColonyConfig::from_str(&text).unwrap();
        assert_eq!(parsed.stats.food, config.stats.food);
        assert_eq!(parsed.deposits.water.name, "water_deposit");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ColonyConfig::from_str("[movement]\ncarry_speed_multiplier = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ColonyConfig::from_str("[stats]\nbad_stats_for_death = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error_reported() {
        let err = ColonyConfig::from_str("[combat\ndamage = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_emitters_parse() {
        let config = ColonyConfig::from_str(
            r#"
            [[environment.emitters]]
            kind = "danger"
            position = [5.0, 0.0, 5.0]
            radius = 4.0
            stress_per_second = 0.5
            environment_offset = -20.0
            temperature_offset = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(config.environment.emitters.len(), 1);
        assert_eq!(config.environment.emitters[0].kind, EmitterKind::Danger);
    }

    #[test]
    fn test_sample_file_matches_defaults() {
        let sample = ColonyConfig::from_str(include_str!("../../../colony.toml")).unwrap();
        let defaults = ColonyConfig::default();
        assert_eq!(sample.stats.water, defaults.stats.water);
        assert_eq!(sample.combat.stress_reduction_on_death, defaults.combat.stress_reduction_on_death);
        assert_eq!(sample.spawning.max_workers, defaults.spawning.max_workers);
        assert_eq!(sample.picker.max_pickup_size, defaults.picker.max_pickup_size);
        assert_eq!(sample.to_toml().unwrap(), defaults.to_toml().unwrap());
    }
}
