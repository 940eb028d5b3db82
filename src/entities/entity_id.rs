use std::fmt;

/// A handle identifying an entity inside a [Scene](crate::scene::Scene).
///
/// Ids carry no data and no generation: once an entity is removed its id may be handed
/// out again by the next [add_entity](crate::scene::Scene::add_entity).
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EntityId(u32);

impl EntityId {
	pub const fn new(raw: u32) -> Self {
		Self(raw)
	}

	#[inline(always)]
	pub const fn raw(&self) -> u32 {
		self.0
	}
}

impl From<u32> for EntityId {
	fn from(raw: u32) -> Self {
		Self(raw)
	}
}

impl fmt::Display for EntityId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Entity({})", self.0)
	}
}
