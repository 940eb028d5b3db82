//! The [Scene] is the composition root of the storage core: it owns the entity id
//! allocator, one [ComponentPool](crate::components::ComponentPool) per component type in use, the per-entity
//! [signatures](crate::data_structures::Signature) and the [PendingQueue] of deferred structural changes.

mod pending;
mod scene;
mod signals;

pub use pending::*;
pub use scene::*;
pub use signals::*;
