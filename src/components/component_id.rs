//! A small runtime identifier tied to a registered component type.
//!
//! Developers shouldn't rely on [component ids](ComponentId) being stable between program re-runs,
//! they are handed out by a [TypeRegistry](crate::components::TypeRegistry) in registration order.
//! [Component ids](ComponentId) index the bits of entity [signatures](crate::data_structures::Signature).

use std::fmt;

/// Upper bound on distinct component types, fixed by the width of a [Signature](crate::data_structures::Signature).
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Identifier for a component type registered in a [TypeRegistry](crate::components::TypeRegistry).
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Debug)]
pub struct ComponentId {
	value: u8,
}

impl ComponentId {
	#[inline(always)]
	pub(crate) const fn from_index(value: u8) -> Self {
		Self { value }
	}

	#[inline(always)]
	pub const fn index(&self) -> usize {
		self.value as usize
	}
}

impl fmt::Display for ComponentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.value)
	}
}
