use crate::entities::EntityId;
use std::hash::BuildHasherDefault;
use nohash_hasher::NoHashHasher;
use std::collections::HashSet;

type Hasher = BuildHasherDefault<NoHashHasher<u32>>;

const GAP_WARNING: u32 = 1 << 20;

/// Issues and reclaims [entity ids](EntityId).
///
/// Every id below the high-water mark is either live or in the free set, never both.
/// Releasing the topmost id lowers the mark instead of growing the free set, and keeps
/// lowering it past any free ids directly below, so the mark always sits right above the
/// highest live id.
///
/// Free ids are reused most recently released first. The reuse stack may hold ids that
/// have since left the free set (taken by a hint or compacted away); those are skipped.
#[derive(Clone, Default, Debug)]
pub struct EntityIdAllocator {
	high_water: u32,
	free: HashSet<u32, Hasher>,
	reuse: Vec<u32>,
}

impl EntityIdAllocator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reuse any free id, or take the high-water mark.
	pub fn allocate(&mut self) -> EntityId {
		while let Some(id) = self.reuse.pop() {
			if self.free.remove(&id) {
				return EntityId::new(id);
			}
		}

		assert!(self.high_water < u32::MAX, "entity id space exhausted");
		let id = self.high_water;
		self.high_water += 1;
		EntityId::new(id)
	}

	/// Allocate `hint` if it is available, otherwise fall back to [allocate](Self::allocate).
	///
	/// A hint above the high-water mark is honoured by moving the mark past it, and every
	/// skipped id in between becomes free. This costs time and memory proportional to the
	/// distance between the mark and the hint, so hints are expected to stay close to the
	/// live id range (for example ids restored from a saved scene).
	pub fn allocate_hinted(&mut self, hint: EntityId) -> EntityId {
		let raw = hint.raw();
		if self.free.remove(&raw) {
			return hint;
		}

		if raw >= self.high_water && raw < u32::MAX {
			if raw - self.high_water > GAP_WARNING {
				tracing::warn!(hint = raw, high_water = self.high_water, "entity id hint leaves a large gap of free ids");
			}
			self.free.extend(self.high_water..raw);
			self.reuse.extend((self.high_water..raw).rev());
			self.high_water = raw + 1;
			return hint;
		}

		tracing::warn!(hint = raw, "entity id hint is not available, allocating a fresh id");
		self.allocate()
	}

	/// Return a live id to the allocator.
	///
	/// Releasing an id that is not live is a logic error: it panics in debug builds and is
	/// ignored in release builds.
	pub fn release(&mut self, id: EntityId) {
		debug_assert!(self.is_live(id), "released {id}, which is not live");
		if !self.is_live(id) {
			tracing::error!(%id, "ignoring release of an entity id that is not live");
			return;
		}

		let raw = id.raw();
		if raw + 1 != self.high_water {
			self.free.insert(raw);
			self.reuse.push(raw);
			return;
		}

		self.high_water -= 1;
		while self.high_water > 0 && self.free.remove(&(self.high_water - 1)) {
			self.high_water -= 1;
		}
		if self.free.is_empty() {
			self.reuse.clear();
		}
	}

	pub fn is_live(&self, id: EntityId) -> bool {
		id.raw() < self.high_water && !self.free.contains(&id.raw())
	}

	pub fn is_free(&self, id: EntityId) -> bool {
		self.free.contains(&id.raw())
	}

	/// One past the highest id ever handed out and not yet compacted away.
	pub fn high_water_mark(&self) -> u32 {
		self.high_water
	}

	/// The highest live id, if any.
	pub fn highest_id(&self) -> Option<EntityId> {
		self.high_water.checked_sub(1).map(EntityId::new)
	}

	pub fn free_count(&self) -> usize {
		self.free.len()
	}

	pub fn live_count(&self) -> usize {
		self.high_water as usize - self.free.len()
	}

	pub fn clear(&mut self) {
		self.high_water = 0;
		self.free.clear();
		self.reuse.clear();
	}
}
