//! Deposit Clearing
//!
//! Deposits keep their drop zones dug out so stored items sit on open ground.

use bevy_ecs::prelude::*;
use tracing::debug;

use colony_events::EventKind;

use crate::components::{Colony, SimClock};
use crate::events::TickEvents;
use crate::terrain::Terrain;

/// Every clearing interval, remove blocks around each active deposit
pub fn clear_deposits(
    clock: Res<SimClock>,
    mut colony: ResMut<Colony>,
    mut terrain: ResMut<Terrain>,
    mut events: ResMut<TickEvents>,
) {
    for deposit in colony.deposits_mut() {
        if !deposit.clearing_due(clock.dt) {
            continue;
        }
        let cells = terrain.cells_within(
            deposit.position,
            deposit.clearing_radius,
            deposit.clearing_levels,
        );
        let blocks_removed = cells
            .into_iter()
            .filter(|cell| terrain.destroy_block(*cell))
            .count();
        if blocks_removed > 0 {
            debug!("Cleared {} blocks at {}", blocks_removed, deposit.name);
            events.emit(
                &clock,
                EventKind::DepositCleared {
                    deposit: deposit.name.clone(),
                    blocks_removed,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColonyConfig;

    #[test]
    fn test_clearing_digs_out_drop_zone_once() {
        let config = ColonyConfig::default();
        let mut world = World::new();
        world.insert_resource(SimClock::new(0.1));
        world.insert_resource(TickEvents::new());
        world.insert_resource(Colony::from_config(&config.deposits));
        world.insert_resource(Terrain::generate(&config.terrain));
        let before = world.resource::<Terrain>().block_count();

        let mut schedule = Schedule::default();
        schedule.add_systems(clear_deposits);
        schedule.run(&mut world);

        let terrain = world.resource::<Terrain>();
        let food = world.resource::<Colony>().food_deposit.clone();
        assert!(terrain.block_count() < before);
        assert_eq!(terrain.surface_height(food.position), 0.0);
        let cleared = world.resource::<TickEvents>().len();
        assert_eq!(cleared, 2);

        // nothing left to clear on the next pass
        for _ in 0..30 {
            schedule.run(&mut world);
        }
        assert_eq!(world.resource::<TickEvents>().len(), 2);
    }
}
