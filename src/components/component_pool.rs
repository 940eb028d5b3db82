use crate::data_structures::{AnyBuffer, SparsePages};
use crate::components::{Component, ComponentDescriptor};
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::entities::EntityId;
use crate::error::EcsResult;
use rayon::prelude::*;
use std::ptr::NonNull;
use std::sync::Arc;

/// Type-erased, paged sparse-set storage for exactly one component type.
///
/// The sparse half maps an [EntityId] to a slot of the dense half, which keeps every value
/// tightly packed together with a parallel slot → entity table used to fix up the sparse
/// entry of whichever value gets moved by a swap-remove.
///
/// Pointers handed out by the accessors are only valid until the next `add` or `remove`
/// on the same pool, since both may relocate dense values. The borrow checker enforces
/// this for the typed and byte-slice accessors; [dense_index](Self::dense_index) can be
/// used to remember a position instead.
pub struct ComponentPool {
	descriptor: Arc<ComponentDescriptor>,
	sparse: SparsePages,
	dense: AnyBuffer,
	entities: Vec<EntityId>,
	locks: AtomicUsize,
}

impl ComponentPool {
	pub fn new(descriptor: Arc<ComponentDescriptor>) -> Self {
		Self::with_capacity(descriptor, 0)
	}

	pub fn with_capacity(descriptor: Arc<ComponentDescriptor>, capacity: usize) -> Self {
		Self {
			dense: AnyBuffer::with_capacity(descriptor.layout(), capacity),
			entities: Vec::with_capacity(capacity),
			sparse: SparsePages::new(),
			locks: AtomicUsize::new(0),
			descriptor,
		}
	}

	pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
		&self.descriptor
	}

	#[inline(always)]
	pub fn len(&self) -> usize {
		self.entities.len()
	}

	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	#[inline(always)]
	pub fn has(&self, id: EntityId) -> bool {
		self.sparse.contains(id)
	}

	/// Slot of `id` in the dense array.
	pub fn dense_index(&self, id: EntityId) -> Option<usize> {
		self.sparse.get(id)
	}

	/// Owner of every dense slot, in dense order.
	pub fn entities(&self) -> &[EntityId] {
		&self.entities
	}

	pub fn sparse_page_count(&self) -> usize {
		self.sparse.page_count()
	}

	/// Append a zero-filled slot for `id` and return a pointer to it for in-place construction.
	///
	/// # Safety
	/// The caller must initialize the slot as a value of the pool's type before the pool is
	/// used again in any other way.
	///
	/// # Panics
	/// If `id` already has a value in this pool.
	pub unsafe fn add(&mut self, id: EntityId) -> NonNull<u8> {
		assert!(!self.has(id), "{id} already has a `{}` component", self.descriptor.name());
		self.warn_if_locked("add");

		let index = self.dense.push_zeroed();
		self.sparse.insert(id, index);
		self.entities.push(id);
		NonNull::new_unchecked(self.dense.as_mut_ptr(index))
	}

	/// Add a default-constructed value for `id` and return a pointer to it.
	///
	/// # Panics
	/// If `id` already has a value in this pool.
	pub fn add_default(&mut self, id: EntityId) -> NonNull<u8> {
		unsafe {
			let ptr = self.add(id);
			self.descriptor.construct(ptr.as_ptr());
			ptr
		}
	}

	/// Move the value at `src` into a new slot for `id`.
	///
	/// # Safety
	/// `src` must hold a live value of the pool's type, which is moved out:
	/// the caller must not use or destroy it afterwards.
	pub(crate) unsafe fn add_moved(&mut self, id: EntityId, src: *const u8) -> NonNull<u8> {
		let ptr = self.add(id);
		std::ptr::copy_nonoverlapping(src, ptr.as_ptr(), self.descriptor.size());
		ptr
	}

	/// Destroy the current value of `id` and move the value at `src` in its place.
	/// Returns `false` if `id` has no value in this pool.
	///
	/// # Safety
	/// Same contract as [add_moved](Self::add_moved).
	pub(crate) unsafe fn replace_moved(&mut self, id: EntityId, src: *const u8) -> bool {
		let index = match self.sparse.get(id) {
			Some(index) => index,
			None => return false,
		};

		let dst = self.dense.as_mut_ptr(index);
		self.descriptor.destroy(dst);
		std::ptr::copy_nonoverlapping(src, dst, self.descriptor.size());
		true
	}

	/// Destroy the value of `id` and compact the dense array.
	/// Returns `false` if `id` has no value in this pool.
	pub fn remove(&mut self, id: EntityId) -> bool {
		let index = match self.sparse.remove(id) {
			Some(index) => index,
			None => return false,
		};
		self.warn_if_locked("remove");

		unsafe {
			self.descriptor.destroy(self.dense.as_mut_ptr(index));
			self.dense.swap_remove_forget(index);
		}

		self.entities.swap_remove(index);
		if let Some(moved) = self.entities.get(index) {
			self.sparse.insert(*moved, index);
		}

		true
	}

	/// Bytes of the value of `id`.
	///
	/// # Panics
	/// If the pool's descriptor is not [plain bytes](ComponentDescriptor::is_plain_bytes).
	pub fn get(&self, id: EntityId) -> Option<&[u8]> {
		self.assert_plain_bytes();
		let index = self.sparse.get(id)?;
		unsafe { Some(self.dense.get(index)) }
	}

	/// # Panics
	/// If the pool's descriptor is not [plain bytes](ComponentDescriptor::is_plain_bytes).
	pub fn get_mut(&mut self, id: EntityId) -> Option<&mut [u8]> {
		self.assert_plain_bytes();
		let index = self.sparse.get(id)?;
		unsafe { Some(self.dense.get_mut(index)) }
	}

	/// Read-only pointer to the value of `id`.
	/// Invalidated by the next `add` or `remove` on this pool.
	pub fn get_ptr(&self, id: EntityId) -> Option<NonNull<u8>> {
		let index = self.sparse.get(id)?;
		NonNull::new(self.dense.as_ptr(index) as *mut u8)
	}

	/// Writable pointer to the value of `id`.
	/// Invalidated by the next `add` or `remove` on this pool.
	pub fn get_mut_ptr(&mut self, id: EntityId) -> Option<NonNull<u8>> {
		let index = self.sparse.get(id)?;
		NonNull::new(self.dense.as_mut_ptr(index))
	}

	/// # Panics
	/// If the pool does not hold values of type `T`.
	pub fn get_as<T: Component>(&self, id: EntityId) -> Option<&T> {
		self.assert_type::<T>();
		let index = self.sparse.get(id)?;
		unsafe { Some(&*(self.dense.as_ptr(index) as *const T)) }
	}

	/// # Panics
	/// If the pool does not hold values of type `T`.
	pub fn get_as_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
		self.assert_type::<T>();
		let index = self.sparse.get(id)?;
		unsafe { Some(&mut *(self.dense.as_mut_ptr(index) as *mut T)) }
	}

	/// Every value, in dense order.
	pub fn as_slice<T: Component>(&self) -> EcsResult<&[T]> {
		self.descriptor.check::<T>()?;
		unsafe { Ok(self.dense.as_slice_unchecked()) }
	}

	pub fn as_mut_slice<T: Component>(&mut self) -> EcsResult<&mut [T]> {
		self.descriptor.check::<T>()?;
		unsafe { Ok(self.dense.as_mut_slice_unchecked()) }
	}

	/// Iterate over `(owner, read-only pointer)` pairs in dense order.
	pub fn iter(&self) -> impl Iterator<Item = (EntityId, NonNull<u8>)> + '_ {
		self.entities
			.iter()
			.enumerate()
			.filter_map(move |(index, id)| Some((*id, NonNull::new(self.dense.as_ptr(index) as *mut u8)?)))
	}

	/// Update every value in place across the rayon thread pool.
	/// The pool is locked for the duration of the call.
	pub fn par_for_each_mut<T, F>(&mut self, func: F) -> EcsResult<()>
	where
		T: Component,
		F: Fn(EntityId, &mut T) + Send + Sync,
	{
		self.descriptor.check::<T>()?;

		let _lock = LockGuard::new(&self.locks);
		let values = unsafe { self.dense.as_mut_slice_unchecked::<T>() };
		values.par_iter_mut().zip(self.entities.par_iter()).for_each(|(value, id)| func(*id, value));
		Ok(())
	}

	/// Declare that values are about to be bulk-mutated in place, and the dense array must
	/// not be resized until [unlock](Self::unlock). The lock is advisory: it does not block
	/// anything, structural changes made while it is held are only reported.
	pub fn lock(&self) {
		self.locks.fetch_add(1, Ordering::AcqRel);
	}

	pub fn unlock(&self) {
		let previous = self.locks.fetch_sub(1, Ordering::AcqRel);
		debug_assert!(previous > 0, "unlock called on a pool that is not locked");
		if previous == 0 {
			self.locks.store(0, Ordering::Release);
		}
	}

	pub fn is_locked(&self) -> bool {
		self.locks.load(Ordering::Acquire) > 0
	}

	/// Destroy every value.
	pub fn clear(&mut self) {
		if self.is_empty() {
			return;
		}
		self.warn_if_locked("clear");
		self.destroy_all();
		self.entities.clear();
		self.sparse.clear();
	}

	/// Replace the contents of `self` with a deep copy of `other`.
	pub fn copy_from(&mut self, other: &ComponentPool) {
		self.clear();
		self.descriptor = other.descriptor.clone();
		self.dense = AnyBuffer::with_capacity(other.descriptor.layout(), other.len());

		for index in 0..other.len() {
			unsafe {
				let dst = self.dense.slot_ptr(index);
				self.descriptor.clone_value(other.dense.as_ptr(index), dst);
				self.dense.set_len(index + 1);
			}
		}

		self.sparse = other.sparse.clone();
		self.entities = other.entities.clone();
	}

	/// Exchange the contents of two pools without copying any values.
	pub fn swap(&mut self, other: &mut ComponentPool) {
		std::mem::swap(&mut self.descriptor, &mut other.descriptor);
		std::mem::swap(&mut self.sparse, &mut other.sparse);
		std::mem::swap(&mut self.dense, &mut other.dense);
		std::mem::swap(&mut self.entities, &mut other.entities);
	}

	fn destroy_all(&mut self) {
		unsafe {
			if self.descriptor.needs_destroy() {
				for index in 0..self.dense.len() {
					self.descriptor.destroy(self.dense.as_mut_ptr(index));
				}
			}
			self.dense.set_len(0);
		}
	}

	fn assert_type<T: Component>(&self) {
		if let Err(err) = self.descriptor.check::<T>() {
			panic!("{err}");
		}
	}

	fn assert_plain_bytes(&self) {
		assert!(
			self.descriptor.is_plain_bytes(),
			"`{}` is not plain bytes, use the typed or pointer accessors",
			self.descriptor.name()
		);
	}

	fn warn_if_locked(&self, operation: &'static str) {
		if self.is_locked() {
			tracing::warn!(component = self.descriptor.name(), operation, "structural change on a locked component pool");
		}
	}
}

impl Clone for ComponentPool {
	fn clone(&self) -> Self {
		let mut pool = ComponentPool::new(self.descriptor.clone());
		pool.copy_from(self);
		pool
	}
}

impl Drop for ComponentPool {
	fn drop(&mut self) {
		self.destroy_all();
	}
}

struct LockGuard<'l> {
	locks: &'l AtomicUsize,
}

impl<'l> LockGuard<'l> {
	fn new(locks: &'l AtomicUsize) -> Self {
		locks.fetch_add(1, Ordering::AcqRel);
		Self { locks }
	}
}

impl Drop for LockGuard<'_> {
	fn drop(&mut self) {
		self.locks.fetch_sub(1, Ordering::AcqRel);
	}
}
