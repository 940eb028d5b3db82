//! Entity/component storage for a real-time simulation loop.
//!
//! Entities are plain ids, components are fixed-size blobs described at runtime by a
//! [descriptor](components::ComponentDescriptor), and each component type lives in its own
//! paged sparse-set [pool](components::ComponentPool). Structural changes requested while
//! other code is iterating are queued and applied at one point per tick.

extern crate self as scene_ecs;

pub mod data_structures;
pub mod components;
pub mod entities;
pub mod systems;
pub mod scene;
mod context;
mod config;
mod error;

pub use config::SceneConfig;
pub use context::Simulation;
pub use error::{EcsError, EcsResult};

pub mod prelude {
	pub use crate::systems::*;
	pub use crate::components::*;
	pub use crate::context::Simulation;
	pub use crate::config::SceneConfig;
	pub use crate::error::{EcsError, EcsResult};
	pub use crate::data_structures::Signature;
	pub use crate::scene::{Scene, Signals};
	pub use crate::entities::{EntityId, EntityIdAllocator, EntityQuery, QueryBuilder};
}

#[cfg(test)]
mod tests;
