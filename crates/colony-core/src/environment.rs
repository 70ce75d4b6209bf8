//! Environment Field
//!
//! Ambient temperature and environment targets plus point-of-interest
//! emitters. Danger emitters raise stress and sour the local environment,
//! safety emitters do the opposite. Effects fall off linearly to zero at the
//! emitter radius.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::components::world::ground_distance;
use crate::config::{EmitterKind, EnvironmentConfig};

/// A single point of interest
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub kind: EmitterKind,
    pub position: Vec3,
    pub radius: f32,
    pub stress_per_second: f64,
    pub environment_offset: f64,
    pub temperature_offset: f64,
}

impl Emitter {
    /// 1.0 at the centre, 0.0 at and beyond the radius
    pub fn falloff(&self, pos: Vec3) -> f64 {
        if self.radius <= 0.0 {
            return 0.0;
        }
        let d = ground_distance(self.position, pos);
        (1.0 - d / self.radius).max(0.0) as f64
    }

    fn sign(&self) -> f64 {
        match self.kind {
            EmitterKind::Danger => 1.0,
            EmitterKind::Safety => -1.0,
        }
    }
}

/// What the environment asks of an agent standing somewhere
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalConditions {
    pub environment_target: f64,
    pub temperature_target: f64,
    pub stress_per_second: f64,
}

/// Resource: ambient targets and emitters, read-only during a run
#[derive(Resource, Debug, Clone)]
pub struct EnvironmentField {
    pub temperature_target: f64,
    pub environment_target: f64,
    pub variance: f64,
    pub emitters: Vec<Emitter>,
}

impl EnvironmentField {
    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self {
            temperature_target: config.temperature_target,
            environment_target: config.environment_target,
            variance: config.variance,
            emitters: config
                .emitters
                .iter()
                .map(|e| Emitter {
                    kind: e.kind,
                    position: Vec3::from_array(e.position),
                    radius: e.radius,
                    // Danger always stresses and sours, safety always soothes
                    stress_per_second: e.stress_per_second.abs(),
                    environment_offset: e.environment_offset.abs(),
                    temperature_offset: e.temperature_offset,
                })
                .collect(),
        }
    }

    /// Targets and extra stress at `pos`
    pub fn conditions_at(&self, pos: Vec3) -> LocalConditions {
        let mut conditions = LocalConditions {
            environment_target: self.environment_target,
            temperature_target: self.temperature_target,
            stress_per_second: 0.0,
        };
        for emitter in &self.emitters {
            let weight = emitter.falloff(pos);
            if weight <= 0.0 {
                continue;
            }
            let sign = emitter.sign();
            conditions.stress_per_second += sign * emitter.stress_per_second * weight;
            conditions.environment_target -= sign * emitter.environment_offset * weight;
            conditions.temperature_target += emitter.temperature_offset * weight;
        }
        conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitterConfig;

    fn field() -> EnvironmentField {
        EnvironmentField::from_config(&EnvironmentConfig {
            temperature_target: 50.0,
            environment_target: 50.0,
            variance: 0.0,
            emitters: vec![
                EmitterConfig {
                    kind: EmitterKind::Danger,
                    position: [10.0, 0.0, 0.0],
                    radius: 4.0,
                    stress_per_second: 1.0,
                    environment_offset: 20.0,
                    temperature_offset: 8.0,
                },
                EmitterConfig {
                    kind: EmitterKind::Safety,
                    position: [-10.0, 0.0, 0.0],
                    radius: 2.0,
                    stress_per_second: 0.5,
                    environment_offset: 10.0,
                    temperature_offset: 0.0,
                },
            ],
        })
    }

    #[test]
    fn test_ambient_away_from_emitters() {
        let c = field().conditions_at(Vec3::ZERO);
        assert_eq!(c.environment_target, 50.0);
        assert_eq!(c.stress_per_second, 0.0);
    }

    #[test]
    fn test_danger_linear_falloff() {
        let f = field();
        let centre = f.conditions_at(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(centre.stress_per_second, 1.0);
        assert_eq!(centre.environment_target, 30.0);
        assert_eq!(centre.temperature_target, 58.0);

        let half = f.conditions_at(Vec3::new(8.0, 3.0, 0.0));
        assert!((half.stress_per_second - 0.5).abs() < 1e-6);
        assert!((half.environment_target - 40.0).abs() < 1e-4);

        let edge = f.conditions_at(Vec3::new(14.0, 0.0, 0.0));
        assert_eq!(edge.stress_per_second, 0.0);
    }

    #[test]
    fn test_safety_soothes() {
        let c = field().conditions_at(Vec3::new(-10.0, 0.0, 0.0));
        assert_eq!(c.stress_per_second, -0.5);
        assert_eq!(c.environment_target, 60.0);
    }
}
