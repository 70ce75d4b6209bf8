//! Item Lifecycle Systems
//!
//! Ageing and rot, keeping carried items attached to their carrier, and
//! removing items that are used up or rotted through.

use bevy_ecs::prelude::*;
use glam::Vec3;
use tracing::trace;

use crate::components::{Item, ItemId, Picker, Position, SimClock};

/// Age every item and advance its rot
pub fn age_items(clock: Res<SimClock>, mut items: Query<&mut Item>) {
    let dt = clock.dt as f64;
    for mut item in items.iter_mut() {
        item.age(dt);
    }
}

/// Move carried items to their carrier's attachment point
pub fn sync_carried_items(
    carriers: Query<(&Position, &Picker), Without<Item>>,
    mut items: Query<(&Item, &mut Position)>,
) {
    for (carrier_pos, picker) in carriers.iter() {
        let Some(carried) = picker.carrying else {
            continue;
        };
        if let Ok((item, mut pos)) = items.get_mut(carried) {
            if item.is_held() {
                pos.0 = carrier_pos.0 + Vec3::Y * picker.attach_height;
            }
        }
    }
}

/// Whether an unheld item should leave the world
pub fn is_discardable(item: &Item) -> bool {
    if item.is_held() {
        return false;
    }
    item.is_empty() || (item.rot_rate > 0.0 && item.rot_level >= item.max_rot)
}

/// Despawn items that are empty or fully rotten and nobody holds
pub fn despawn_spent_items(mut commands: Commands, items: Query<(Entity, &ItemId, &Item)>) {
    for (entity, id, item) in items.iter() {
        if is_discardable(item) {
            trace!("Removing spent item {}", id.0);
            commands.entity(entity).despawn();
        }
    }
}
