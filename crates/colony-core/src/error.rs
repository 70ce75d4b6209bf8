//! Error types for the simulation engine.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced at the binary edge
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A spawn request the colony could not honour
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnError {
    #[error("worker population cap of {0} reached")]
    PopulationCap(usize),
    #[error("item cap of {0} reached")]
    ItemCap(usize),
    #[error("position ({x:.1}, {z:.1}) is outside the terrain")]
    OutOfBounds { x: f32, z: f32 },
}
