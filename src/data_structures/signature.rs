use crate::components::{ComponentId, MAX_COMPONENT_TYPES};

/// A fixed-width set of [component ids](ComponentId).
///
/// Bit `k` is set iff the owner carries a component of registered type `k`.
/// Signatures are stored per entity inside the scene's entity pool, and are used to
/// answer "has all of {A, B, C}" without touching each component pool.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Signature {
	bits: u64,
}

impl Signature {
	pub const EMPTY: Signature = Signature { bits: 0 };

	pub const fn from_bits(bits: u64) -> Self {
		Self { bits }
	}

	pub const fn bits(&self) -> u64 {
		self.bits
	}

	/// Get the value of the bit for `id`.
	#[inline(always)]
	pub fn get(&self, id: ComponentId) -> bool {
		self.bits & Self::mask(id) != 0
	}

	/// Set the value of the bit for `id`.
	#[inline(always)]
	pub fn set(&mut self, id: ComponentId, value: bool) {
		match value {
			true => self.bits |= Self::mask(id),
			false => self.bits &= !Self::mask(id),
		}
	}

	/// Return a copy of the signature with the bit for `id` set.
	pub fn with(mut self, id: ComponentId) -> Self {
		self.set(id, true);
		self
	}

	/// Check if every bit set in `other` is also set in `self`.
	pub fn contains_all(&self, other: Signature) -> bool {
		self.bits & other.bits == other.bits
	}

	/// Check if `self` and `other` share at least one bit.
	pub fn intersects(&self, other: Signature) -> bool {
		self.bits & other.bits != 0
	}

	pub fn is_empty(&self) -> bool {
		self.bits == 0
	}

	/// Number of set bits.
	pub fn len(&self) -> usize {
		self.bits.count_ones() as usize
	}

	/// Iterate over the ids of all set bits, lowest first.
	pub fn iter(&self) -> SignatureIter {
		SignatureIter { bits: self.bits }
	}

	#[inline(always)]
	fn mask(id: ComponentId) -> u64 {
		debug_assert!(id.index() < MAX_COMPONENT_TYPES);
		1u64 << id.index()
	}
}

impl From<&[ComponentId]> for Signature {
	fn from(ids: &[ComponentId]) -> Self {
		ids.iter().fold(Signature::EMPTY, |signature, id| signature.with(*id))
	}
}

impl FromIterator<ComponentId> for Signature {
	fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
		iter.into_iter().fold(Signature::EMPTY, |signature, id| signature.with(id))
	}
}

/// Iterates over the [component ids](ComponentId) set in a [Signature].
pub struct SignatureIter {
	bits: u64,
}

impl Iterator for SignatureIter {
	type Item = ComponentId;

	fn next(&mut self) -> Option<Self::Item> {
		if self.bits == 0 {
			return None;
		}
		let index = self.bits.trailing_zeros();
		self.bits &= self.bits - 1;
		Some(ComponentId::from_index(index as u8))
	}
}
