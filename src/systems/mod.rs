//! [Systems](System) provide the per-tick logic that reads and mutates a [Scene](crate::scene::Scene).
//!
//! A [System] must be manually added to a [Simulation](crate::Simulation)
//! for it to run during a tick.

mod system;
mod system_store;

pub use system::*;
pub(crate) use system_store::*;
