//! Simulation Timestamp
//!
//! Simulation time as a tick counter plus elapsed simulated seconds.
//!
//! # Example
//!
//! ```
//! use colony_events::SimTimestamp;
//!
//! let ts = SimTimestamp::new(125, 12.5);
//! assert_eq!(ts.tick, 125);
//! assert_eq!(ts.to_string(), "tick_125@12.50s");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimTimestamp {
    pub tick: u64,
    /// Simulated seconds since the start of the run
    pub seconds: f64,
}

impl SimTimestamp {
    pub fn new(tick: u64, seconds: f64) -> Self {
        Self { tick, seconds }
    }

    /// Timestamp at the start of a run.
    pub fn zero() -> Self {
        Self::new(0, 0.0)
    }
}

impl Default for SimTimestamp {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for SimTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick_{}@{:.2}s", self.tick, self.seconds)
    }
}

impl PartialOrd for SimTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.tick.cmp(&other.tick))
    }
}
