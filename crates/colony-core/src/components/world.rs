//! World Components
//!
//! Positions, the simulation clock and id allocation.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use colony_events::SimTimestamp;

/// Component: position of an agent or item in world space
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    /// Distance on the ground plane, ignoring height
    pub fn ground_distance(&self, other: Vec3) -> f32 {
        ground_distance(self.0, other)
    }

    pub fn to_array(&self) -> [f32; 3] {
        self.0.to_array()
    }
}

/// Distance between two points on the XZ plane
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Step `from` toward `to` on the ground plane.
///
/// Returns the new point and whether it is within `stopping_distance` of the
/// target. Height is left to the caller.
pub fn step_toward(from: Vec3, to: Vec3, max_step: f32, stopping_distance: f32) -> (Vec3, bool) {
    let distance = ground_distance(from, to);
    if distance <= stopping_distance {
        return (from, true);
    }
    let travel = distance - stopping_distance;
    let dir = Vec3::new(to.x - from.x, 0.0, to.z - from.z) / distance;
    if max_step >= travel {
        (from + dir * travel, true)
    } else {
        (from + dir * max_step, false)
    }
}

/// Resource: simulation clock
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    pub tick: u64,
    pub elapsed: f64,
    /// Seconds per tick
    pub dt: f32,
}

impl SimClock {
    pub fn new(dt: f32) -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            dt,
        }
    }

    /// Elapsed time is derived from the tick count so it carries no
    /// accumulated rounding
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed = self.tick as f64 * self.dt as f64;
    }

    pub fn timestamp(&self) -> SimTimestamp {
        SimTimestamp::new(self.tick, self.elapsed)
    }
}

/// Resource: monotonically increasing ids for agents and items
#[derive(Resource, Debug, Default)]
pub struct IdAllocator {
    next_worker: u64,
    next_item: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_worker: 1,
            next_item: 1,
        }
    }

    pub fn next_worker(&mut self) -> u64 {
        let id = self.next_worker.max(1);
        self.next_worker = id + 1;
        id
    }

    pub fn next_item(&mut self) -> u64 {
        let id = self.next_item.max(1);
        self.next_item = id + 1;
        id
    }
}

/// Periodic timer driven by simulated seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalTimer {
    pub interval: f32,
    elapsed: f32,
}

impl IntervalTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Timer that fires on the first tick
    pub fn primed(interval: f32) -> Self {
        Self {
            interval,
            elapsed: interval,
        }
    }

    /// Advance by `dt`; true when an interval has elapsed
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.interval > 0.0 && self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            if self.elapsed >= self.interval {
                self.elapsed = 0.0;
            }
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_distance_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, -2.0, 4.0);
        assert!((ground_distance(a, b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_step_toward_stops_short() {
        let (p, arrived) = step_toward(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 2.0, 0.5);
        assert!(!arrived);
        assert!((p.x - 2.0).abs() < 1e-6);

        let (p, arrived) = step_toward(p, Vec3::new(10.0, 0.0, 0.0), 100.0, 0.5);
        assert!(arrived);
        assert!((p.x - 9.5).abs() < 1e-5);
    }

    #[test]
    fn test_clock_advance() {
        let mut clock = SimClock::new(0.5);
        clock.advance();
        clock.advance();
        assert_eq!(clock.tick, 2);
        assert_eq!(clock.timestamp().seconds, 1.0);
    }

    #[test]
    fn test_clock_elapsed_has_no_drift() {
        let mut clock = SimClock::new(0.1);
        for _ in 0..110 {
            clock.advance();
        }
        assert_eq!(clock.elapsed, 110.0 * 0.1f32 as f64);
    }

    #[test]
    fn test_interval_timer() {
        let mut timer = IntervalTimer::new(1.0);
        assert!(!timer.tick(0.5));
        assert!(timer.tick(0.5));
        assert!(!timer.tick(0.25));

        let mut primed = IntervalTimer::primed(2.0);
        assert!(primed.tick(0.1));
        assert!(!primed.tick(0.1));
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_worker(), 1);
        assert_eq!(ids.next_worker(), 2);
        assert_eq!(ids.next_item(), 1);
    }
}
