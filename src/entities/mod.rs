//! [Entities](EntityId) represent the individual "things" in a scene.
//!
//! An entity doesn't store any data and has no associated behaviour;
//! instead, it identifies which pieces of data ([Components](crate::components::Component)) belong together.

mod entity_id;
mod entity_query;
mod id_allocator;

pub use entity_id::*;
pub use entity_query::*;
pub use id_allocator::*;
