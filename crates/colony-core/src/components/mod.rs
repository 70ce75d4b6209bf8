//! ECS Components
//!
//! Components and plain resources for agents, stats, items and deposits.

pub mod agent;
pub mod deposit;
pub mod item;
pub mod stats;
pub mod world;

pub use agent::{AgentId, Alive, Brood, Dead, LastAttacker, Mover, Role};
pub use deposit::{Colony, Deposit, ResourceRequests};
pub use item::{
    drop_item, try_pickup, Consumable, Food, Item, ItemId, PickupError, Picker, Quality,
    SizeClass, Supply, Water,
};
pub use stats::{AmbientOffset, DriftInputs, Stat, StatState, StatTable};
pub use world::{ground_distance, step_toward, IdAllocator, IntervalTimer, Position, SimClock};
