//! [Components](Component) are the data attached to entities, and
//! [component pools](ComponentPool) are where that data lives.
//!
//! Storage never sees concrete types: every pool works on raw bytes and a stride,
//! through the [descriptor](ComponentDescriptor) registered for its [id](ComponentId).

mod component_id;
mod component_pool;
mod component_set;
mod component_type;
mod registry;

pub use component_id::*;
pub use component_pool::*;
pub use component_set::*;
pub use component_type::*;
pub use registry::*;
pub use scene_ecs_derive::Component;

use crate::data_structures::Signature;

impl Component for Signature {}
