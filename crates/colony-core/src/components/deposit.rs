//! Deposit Components
//!
//! The food and water drop zones, and the `Colony` resource that owns them
//! together with the queen's resource requests.

use bevy_ecs::prelude::*;
use glam::Vec3;

use colony_events::{DepositSnapshot, ResourceKind};

use crate::components::world::{ground_distance, IntervalTimer};
use crate::config::{DepositConfig, DepositsConfig};

/// How far inside the edge `closest_point_in_area` aims
const EDGE_INSET: f32 = 0.05;

/// A circular drop zone for one resource kind
#[derive(Debug, Clone)]
pub struct Deposit {
    pub kind: ResourceKind,
    pub name: String,
    pub position: Vec3,
    pub radius: f32,
    pub clearing_radius: f32,
    pub clearing_levels: i32,
    pub active: bool,
    clearing_timer: IntervalTimer,
}

impl Deposit {
    pub fn from_config(kind: ResourceKind, config: &DepositConfig, clearing_interval: f32) -> Self {
        Self {
            kind,
            name: config.name.clone(),
            position: Vec3::from_array(config.position),
            radius: config.radius,
            clearing_radius: config.clearing_radius,
            clearing_levels: config.clearing_levels,
            active: true,
            clearing_timer: IntervalTimer::primed(clearing_interval),
        }
    }

    /// Ground-plane containment
    pub fn is_within_area(&self, pos: Vec3) -> bool {
        ground_distance(self.position, pos) <= self.radius
    }

    /// Edge point on the line from the centre toward `from`; the centre
    /// itself when `from` is already inside
    pub fn closest_point_in_area(&self, from: Vec3) -> Vec3 {
        if self.is_within_area(from) {
            return self.position;
        }
        let offset = Vec3::new(from.x - self.position.x, 0.0, from.z - self.position.z);
        let reach = (self.radius - EDGE_INSET).max(0.0);
        self.position + offset.normalize_or_zero() * reach
    }

    /// Advance the clearing timer; true when a clearing pass is due
    pub fn clearing_due(&mut self, dt: f32) -> bool {
        self.active && self.clearing_timer.tick(dt)
    }

    pub fn snapshot(&self, items_inside: usize) -> DepositSnapshot {
        DepositSnapshot {
            name: self.name.clone(),
            resource: self.kind,
            position: self.position.to_array(),
            radius: self.radius,
            active: self.active,
            items_inside,
        }
    }
}

/// The queen's open requests, one flag per resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceRequests {
    pub food: bool,
    pub water: bool,
}

impl ResourceRequests {
    pub fn is_requested(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Water => self.water,
        }
    }

    /// Set a flag, returning whether it changed
    pub fn set(&mut self, kind: ResourceKind, active: bool) -> bool {
        let flag = match kind {
            ResourceKind::Food => &mut self.food,
            ResourceKind::Water => &mut self.water,
        };
        let changed = *flag != active;
        *flag = active;
        changed
    }
}

/// Resource: colony-wide organization state
#[derive(Resource, Debug, Clone)]
pub struct Colony {
    pub food_deposit: Deposit,
    pub water_deposit: Deposit,
    pub requests: ResourceRequests,
    pub queen: Option<Entity>,
}

impl Colony {
    pub fn from_config(config: &DepositsConfig) -> Self {
        Self {
            food_deposit: Deposit::from_config(
                ResourceKind::Food,
                &config.food,
                config.clearing_interval,
            ),
            water_deposit: Deposit::from_config(
                ResourceKind::Water,
                &config.water,
                config.clearing_interval,
            ),
            requests: ResourceRequests::default(),
            queen: None,
        }
    }

    pub fn deposit_for(&self, kind: ResourceKind) -> &Deposit {
        match kind {
            ResourceKind::Food => &self.food_deposit,
            ResourceKind::Water => &self.water_deposit,
        }
    }

    pub fn deposits(&self) -> [&Deposit; 2] {
        [&self.food_deposit, &self.water_deposit]
    }

    pub fn deposits_mut(&mut self) -> [&mut Deposit; 2] {
        [&mut self.food_deposit, &mut self.water_deposit]
    }

    /// Whether an item of `kind` lying at `pos` is stored where it belongs
    pub fn is_in_matching_deposit(&self, kind: ResourceKind, pos: Vec3) -> bool {
        let deposit = self.deposit_for(kind);
        deposit.active && deposit.is_within_area(pos)
    }

    /// Active deposit of another kind containing `pos`, if any
    pub fn foreign_deposit_at(&self, kind: ResourceKind, pos: Vec3) -> Option<&Deposit> {
        self.deposits()
            .into_iter()
            .find(|d| d.kind != kind && d.active && d.is_within_area(pos))
    }

    /// Any active deposit containing `pos`
    pub fn deposit_at(&self, pos: Vec3) -> Option<&Deposit> {
        self.deposits()
            .into_iter()
            .find(|d| d.active && d.is_within_area(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit() -> Deposit {
        Deposit::from_config(
            ResourceKind::Food,
            &DepositConfig {
                name: "food".into(),
                position: [10.0, 0.0, 0.0],
                radius: 3.0,
                clearing_radius: 4.0,
                clearing_levels: 2,
            },
            2.0,
        )
    }

    #[test]
    fn test_within_area_uses_ground_plane() {
        let d = deposit();
        assert!(d.is_within_area(Vec3::new(12.0, 50.0, 0.0)));
        assert!(d.is_within_area(Vec3::new(13.0, 0.0, 0.0)));
        assert!(!d.is_within_area(Vec3::new(13.5, 0.0, 0.0)));
    }

    #[test]
    fn test_closest_point() {
        let d = deposit();
        let inside = Vec3::new(11.0, 2.0, 1.0);
        assert_eq!(d.closest_point_in_area(inside), d.position);
        assert_eq!(d.closest_point_in_area(d.position), d.position);

        let p = d.closest_point_in_area(Vec3::new(0.0, 0.0, 0.0));
        assert!(d.is_within_area(p));
        assert!((ground_distance(p, d.position) - 3.0).abs() < 0.1);
        assert!(p.x < 10.0);
    }

    #[test]
    fn test_clearing_timer() {
        let mut d = deposit();
        assert!(d.clearing_due(0.1));
        assert!(!d.clearing_due(1.0));
        assert!(d.clearing_due(1.0));
        d.active = false;
        assert!(!d.clearing_due(5.0));
    }

    #[test]
    fn test_requests() {
        let mut r = ResourceRequests::default();
        assert!(r.set(ResourceKind::Water, true));
        assert!(!r.set(ResourceKind::Water, true));
        assert!(r.is_requested(ResourceKind::Water));
        assert!(!r.is_requested(ResourceKind::Food));
    }

    #[test]
    fn test_colony_deposit_lookup() {
        let colony = Colony::from_config(&DepositsConfig::default());
        let food_pos = colony.food_deposit.position;
        assert!(colony.is_in_matching_deposit(ResourceKind::Food, food_pos));
        assert!(!colony.is_in_matching_deposit(ResourceKind::Water, food_pos));
        assert_eq!(
            colony.foreign_deposit_at(ResourceKind::Water, food_pos).map(|d| d.kind),
            Some(ResourceKind::Food)
        );
    }
}
