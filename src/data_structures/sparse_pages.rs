use crate::entities::EntityId;

/// Number of low id bits addressed inside a single page.
pub const PAGE_BITS: u32 = 10;
/// Number of sparse entries held by one page.
pub const PAGE_SIZE: usize = 1 << PAGE_BITS;

const PAGE_MASK: u32 = (PAGE_SIZE as u32) - 1;
const ABSENT: u32 = u32::MAX;

type Page = Box<[u32; PAGE_SIZE]>;

/// The sparse half of a sparse set: maps an [EntityId] to a dense index.
///
/// Entries are grouped in fixed-size pages keyed by the high bits of the id.
/// Pages are only allocated when an id inside them is first inserted,
/// so a handful of large ids does not require one huge contiguous table.
#[derive(Clone, Default)]
pub struct SparsePages {
	pages: Vec<Option<Page>>,
}

impl SparsePages {
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the dense index stored for `id`.
	#[inline(always)]
	pub fn get(&self, id: EntityId) -> Option<usize> {
		let (page, offset) = Self::split(id);
		match self.pages.get(page) {
			Some(Some(entries)) => match entries[offset] {
				ABSENT => None,
				index => Some(index as usize),
			},
			_ => None,
		}
	}

	#[inline(always)]
	pub fn contains(&self, id: EntityId) -> bool {
		self.get(id).is_some()
	}

	/// Store `index` for `id`, allocating the page on demand.
	pub fn insert(&mut self, id: EntityId, index: usize) {
		debug_assert!(index < ABSENT as usize, "dense index does not fit the sparse table");
		let (page, offset) = Self::split(id);
		if self.pages.len() <= page {
			self.pages.resize_with(page + 1, || None);
		}

		let entries = self.pages[page].get_or_insert_with(|| Box::new([ABSENT; PAGE_SIZE]));
		entries[offset] = index as u32;
	}

	/// Clear the entry for `id`, returning the dense index it held.
	pub fn remove(&mut self, id: EntityId) -> Option<usize> {
		let (page, offset) = Self::split(id);
		let entries = self.pages.get_mut(page)?.as_mut()?;
		match std::mem::replace(&mut entries[offset], ABSENT) {
			ABSENT => None,
			index => Some(index as usize),
		}
	}

	/// Number of pages currently allocated.
	pub fn page_count(&self) -> usize {
		self.pages.iter().filter(|page| page.is_some()).count()
	}

	/// Release every page.
	pub fn clear(&mut self) {
		self.pages.clear();
	}

	#[inline(always)]
	fn split(id: EntityId) -> (usize, usize) {
		let raw = id.raw();
		((raw >> PAGE_BITS) as usize, (raw & PAGE_MASK) as usize)
	}
}
