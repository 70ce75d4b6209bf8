//! Output Generation
//!
//! Colony snapshots and the files they are written to.

pub mod snapshot;

pub use snapshot::*;
