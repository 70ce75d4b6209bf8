//! Item Components
//!
//! Pickable items, the carry capability of agents, and the consumable
//! supplies (food and water) items hold.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use colony_events::{ResourceKind, StatType};

use crate::components::world::Position;
use crate::config::ItemProfile;
use crate::terrain::Terrain;

/// Unique identifier for an item
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemId(pub u64);

/// Coarse size used by pickup limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
}

/// Supply quality, scales nutrition per unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Poor,
    Normal,
    Rich,
}

impl Quality {
    pub fn multiplier(self) -> f64 {
        match self {
            Quality::Poor => 0.5,
            Quality::Normal => 1.0,
            Quality::Rich => 1.5,
        }
    }
}

/// Component: a pickable item lying in the world or carried by an agent
#[derive(Component, Debug, Clone)]
pub struct Item {
    pub weight: f32,
    pub size: SizeClass,
    pub amount: f64,
    pub max_amount: f64,
    pub rot_level: f64,
    pub max_rot: f64,
    /// Rot gained per second
    pub rot_rate: f64,
    pub age_seconds: f64,
    pub holder: Option<Entity>,
    pub physics_enabled: bool,
    pub collision_enabled: bool,
    /// Physics and collision flags from before the current pickup
    saved_flags: Option<(bool, bool)>,
}

impl Item {
    pub fn from_profile(profile: &ItemProfile) -> Self {
        Self {
            weight: profile.weight,
            size: profile.size,
            amount: profile.max_amount,
            max_amount: profile.max_amount,
            rot_level: 0.0,
            max_rot: profile.max_rot,
            rot_rate: profile.rot_rate,
            age_seconds: 0.0,
            holder: None,
            physics_enabled: true,
            collision_enabled: true,
            saved_flags: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.amount <= 0.0
    }

    pub fn rot_fraction(&self) -> f64 {
        if self.max_rot <= 0.0 {
            return 0.0;
        }
        (self.rot_level / self.max_rot).clamp(0.0, 1.0)
    }

    /// Rot has passed the consumable limit
    pub fn is_spoiled(&self, spoiled_rot_fraction: f64) -> bool {
        self.rot_fraction() >= spoiled_rot_fraction
    }

    /// 1.0 when fresh, falling off quadratically to 0.0 at full rot
    pub fn freshness(&self) -> f64 {
        let r = self.rot_fraction();
        1.0 - r * r
    }

    /// Age by `dt` seconds
    pub fn age(&mut self, dt: f64) {
        self.age_seconds += dt;
        self.rot_level = (self.rot_level + self.rot_rate * dt).clamp(0.0, self.max_rot);
    }

    /// Remove up to `requested` from the item, returning what was taken
    pub fn drain(&mut self, requested: f64) -> f64 {
        let taken = requested.max(0.0).min(self.amount);
        self.amount -= taken;
        if self.amount < 1e-9 {
            self.amount = 0.0;
        }
        taken
    }
}

/// Something an agent can consume to restore a stat
pub trait Consumable {
    fn resource(&self) -> ResourceKind;

    fn quality(&self) -> Quality;

    /// Amount drained from the item per second of consumption
    fn consumption_rate(&self) -> f64;

    fn stat(&self) -> StatType {
        self.resource().stat()
    }

    /// Stat restored per unit consumed
    fn nutrition_per_unit(&self) -> f64 {
        self.quality().multiplier()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Food {
    pub quality: Quality,
    pub consumption_rate: f64,
}

impl Consumable for Food {
    fn resource(&self) -> ResourceKind {
        ResourceKind::Food
    }

    fn quality(&self) -> Quality {
        self.quality
    }

    fn consumption_rate(&self) -> f64 {
        self.consumption_rate
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Water {
    pub quality: Quality,
    pub consumption_rate: f64,
}

impl Consumable for Water {
    fn resource(&self) -> ResourceKind {
        ResourceKind::Water
    }

    fn quality(&self) -> Quality {
        self.quality
    }

    fn consumption_rate(&self) -> f64 {
        self.consumption_rate
    }
}

/// Component: the consumable an item holds
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Supply {
    Food(Food),
    Water(Water),
}

impl Supply {
    pub fn from_profile(kind: ResourceKind, profile: &ItemProfile) -> Self {
        match kind {
            ResourceKind::Food => Supply::Food(Food {
                quality: profile.quality,
                consumption_rate: profile.consumption_rate,
            }),
            ResourceKind::Water => Supply::Water(Water {
                quality: profile.quality,
                consumption_rate: profile.consumption_rate,
            }),
        }
    }

    fn inner(&self) -> &dyn Consumable {
        match self {
            Supply::Food(food) => food,
            Supply::Water(water) => water,
        }
    }
}

impl Consumable for Supply {
    fn resource(&self) -> ResourceKind {
        self.inner().resource()
    }

    fn quality(&self) -> Quality {
        self.inner().quality()
    }

    fn consumption_rate(&self) -> f64 {
        self.inner().consumption_rate()
    }
}

/// Component: ability to carry one item
#[derive(Component, Debug, Clone)]
pub struct Picker {
    pub max_carry_weight: f32,
    pub max_size: SizeClass,
    /// Height of the attachment point above the carrier
    pub attach_height: f32,
    pub carrying: Option<Entity>,
}

impl Picker {
    pub fn new(max_carry_weight: f32, max_size: SizeClass, attach_height: f32) -> Self {
        Self {
            max_carry_weight,
            max_size,
            attach_height,
            carrying: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.carrying.is_none()
    }

    /// Whether an item with these properties could ever be carried
    pub fn can_carry(&self, weight: f32, size: SizeClass) -> bool {
        weight <= self.max_carry_weight && size <= self.max_size
    }
}

/// Why a pickup was refused
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PickupError {
    #[error("item is already held")]
    AlreadyHeld,
    #[error("picker is already carrying an item")]
    PickerBusy,
    #[error("item weighs {weight} but only {capacity} can be carried")]
    TooHeavy { weight: f32, capacity: f32 },
    #[error("item is larger than the picker can hold")]
    TooLarge,
    #[error("entity is not a pickable item or the picker has no carry ability")]
    NotPickable,
}

/// Attach `item` to `picker`.
///
/// On success the item is reparented to the picker, its physics and collision
/// are suspended, and it moves to the picker's attachment point.
pub fn try_pickup(world: &mut World, item: Entity, picker: Entity) -> Result<(), PickupError> {
    let (carrier_pos, attach_height) = {
        let carrier = world.get_entity(picker).ok_or(PickupError::NotPickable)?;
        let p = carrier.get::<Picker>().ok_or(PickupError::NotPickable)?;
        let pos = carrier.get::<Position>().map(|p| p.0).unwrap_or(Vec3::ZERO);
        let target = world.get::<Item>(item).ok_or(PickupError::NotPickable)?;

        if target.is_held() {
            return Err(PickupError::AlreadyHeld);
        }
        if !p.is_free() {
            return Err(PickupError::PickerBusy);
        }
        if target.weight > p.max_carry_weight {
            return Err(PickupError::TooHeavy {
                weight: target.weight,
                capacity: p.max_carry_weight,
            });
        }
        if target.size > p.max_size {
            return Err(PickupError::TooLarge);
        }
        (pos, p.attach_height)
    };

    if let Some(mut target) = world.get_mut::<Item>(item) {
        target.saved_flags = Some((target.physics_enabled, target.collision_enabled));
        target.physics_enabled = false;
        target.collision_enabled = false;
        target.holder = Some(picker);
    }
    if let Some(mut p) = world.get_mut::<Picker>(picker) {
        p.carrying = Some(item);
    }
    if let Some(mut pos) = world.get_mut::<Position>(item) {
        pos.0 = carrier_pos + Vec3::Y * attach_height;
    }
    Ok(())
}

/// Release `item` from `picker` onto the ground below the picker.
///
/// Does nothing unless the item is currently held by that picker, so calling
/// it twice is harmless. Returns whether a drop happened.
pub fn drop_item(world: &mut World, item: Entity, picker: Entity) -> bool {
    let held_by_picker = world
        .get::<Item>(item)
        .map(|i| i.holder == Some(picker))
        .unwrap_or(false);
    if !held_by_picker {
        return false;
    }

    let carrier_pos = world
        .get::<Position>(picker)
        .map(|p| p.0)
        .unwrap_or(Vec3::ZERO);
    let ground = world
        .get_resource::<Terrain>()
        .map(|t| t.surface_height(carrier_pos))
        .unwrap_or(carrier_pos.y);

    if let Some(mut target) = world.get_mut::<Item>(item) {
        let (physics, collision) = target.saved_flags.take().unwrap_or((true, true));
        target.physics_enabled = physics;
        target.collision_enabled = collision;
        target.holder = None;
    }
    if let Some(mut p) = world.get_mut::<Picker>(picker) {
        if p.carrying == Some(item) {
            p.carrying = None;
        }
    }
    if let Some(mut pos) = world.get_mut::<Position>(item) {
        pos.0 = Vec3::new(carrier_pos.x, ground, carrier_pos.z);
    }
    true
}
