use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// A growable, densely packed array of values whose type is only known by its layout.
///
/// The buffer does not keep track of how its values were constructed,
/// nor will it drop them upon destruction; that is left to the owner, which knows the
/// [descriptor](crate::components::ComponentDescriptor) of the stored type.
pub struct AnyBuffer {
	ptr: NonNull<u8>,
	len: usize,
	capacity: usize,
	stride: usize,
	align: usize,
}

// The buffer only ever holds component bytes, and component types are required to be Send + Sync.
unsafe impl Send for AnyBuffer {}
unsafe impl Sync for AnyBuffer {}

impl AnyBuffer {
	/// Create an empty buffer for elements of the given layout.
	pub fn new(layout: Layout) -> Self {
		let layout = layout.pad_to_align();
		Self {
			ptr: dangling(layout.align()),
			len: 0,
			capacity: if layout.size() == 0 { usize::MAX } else { 0 },
			stride: layout.size(),
			align: layout.align(),
		}
	}

	pub fn with_capacity(layout: Layout, capacity: usize) -> Self {
		let mut buffer = Self::new(layout);
		buffer.ensure_capacity(capacity);
		buffer
	}

	#[inline(always)]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Distance in bytes between two consecutive elements.
	#[inline(always)]
	pub fn stride(&self) -> usize {
		self.stride
	}

	pub fn align(&self) -> usize {
		self.align
	}

	/// Set the minimum capacity of the buffer, in elements.
	pub fn ensure_capacity(&mut self, capacity: usize) {
		if capacity <= self.capacity {
			return;
		}

		let old = self.layout_for(self.capacity);
		let new = self.layout_for(capacity);

		let ptr = unsafe {
			if old.size() == 0 {
				alloc::alloc(new)
			} else {
				alloc::realloc(self.ptr.as_ptr(), old, new.size())
			}
		};

		self.ptr = NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(new));
		self.capacity = capacity;
	}

	/// Reserve room for at least `additional` more elements.
	pub fn reserve(&mut self, additional: usize) {
		let required = self.len.checked_add(additional).unwrap_or_else(|| capacity_overflow());
		if required > self.capacity {
			let grown = usize::max(self.capacity.saturating_mul(2), 4);
			self.ensure_capacity(usize::max(grown, required));
		}
	}

	/// Append a zero-filled element and return its index.
	pub fn push_zeroed(&mut self) -> usize {
		self.reserve(1);
		let index = self.len;
		unsafe {
			self.ptr.as_ptr().add(index * self.stride).write_bytes(0, self.stride);
		}
		self.len += 1;
		index
	}

	/// Append a copy of the bytes of one element and return its index.
	///
	/// # Safety
	/// `src` must point to `stride` readable bytes that do not overlap the buffer.
	pub unsafe fn push_from(&mut self, src: *const u8) -> usize {
		self.reserve(1);
		let index = self.len;
		std::ptr::copy_nonoverlapping(src, self.ptr.as_ptr().add(index * self.stride), self.stride);
		self.len += 1;
		index
	}

	#[inline(always)]
	pub fn as_ptr(&self, index: usize) -> *const u8 {
		debug_assert!(index < self.len);
		unsafe { self.ptr.as_ptr().add(index * self.stride) }
	}

	#[inline(always)]
	pub fn as_mut_ptr(&mut self, index: usize) -> *mut u8 {
		debug_assert!(index < self.len);
		unsafe { self.ptr.as_ptr().add(index * self.stride) }
	}

	/// Pointer to slot `index`, which may lie past the initialized length.
	///
	/// # Safety
	/// `index` must be below the buffer's capacity.
	#[inline(always)]
	pub unsafe fn slot_ptr(&mut self, index: usize) -> *mut u8 {
		debug_assert!(index < self.capacity);
		self.ptr.as_ptr().add(index * self.stride)
	}

	/// Bytes of element `index`.
	///
	/// # Safety
	/// Every byte of the element must be initialized, which excludes types with padding.
	pub unsafe fn get(&self, index: usize) -> &[u8] {
		assert!(index < self.len, "index {index} out of bounds for buffer of length {}", self.len);
		std::slice::from_raw_parts(self.as_ptr(index), self.stride)
	}

	/// # Safety
	/// Same as [get](Self::get), and any bytes written must still form a valid value of the
	/// stored type.
	pub unsafe fn get_mut(&mut self, index: usize) -> &mut [u8] {
		assert!(index < self.len, "index {index} out of bounds for buffer of length {}", self.len);
		std::slice::from_raw_parts_mut(self.as_mut_ptr(index), self.stride)
	}

	/// Move the last element into `index` and shrink the buffer by one.
	/// Returns `true` if an element was actually moved.
	///
	/// # Safety
	/// The value at `index` must already have been destroyed or moved out.
	pub unsafe fn swap_remove_forget(&mut self, index: usize) -> bool {
		debug_assert!(index < self.len);
		let last = self.len - 1;
		let moved = index != last;
		if moved {
			let base = self.ptr.as_ptr();
			std::ptr::copy_nonoverlapping(base.add(last * self.stride), base.add(index * self.stride), self.stride);
		}
		self.len = last;
		moved
	}

	/// # Safety
	/// Every element in `0..len` must be initialized, and every element past `len` must
	/// already have been destroyed or moved out.
	pub unsafe fn set_len(&mut self, len: usize) {
		debug_assert!(len <= self.capacity);
		self.len = len;
	}

	/// # Safety
	/// `T` must match the layout and the type of the values stored in the buffer.
	pub unsafe fn as_slice_unchecked<T>(&self) -> &[T] {
		std::slice::from_raw_parts(self.ptr.as_ptr() as *const T, self.len)
	}

	/// # Safety
	/// `T` must match the layout and the type of the values stored in the buffer.
	pub unsafe fn as_mut_slice_unchecked<T>(&mut self) -> &mut [T] {
		std::slice::from_raw_parts_mut(self.ptr.as_ptr() as *mut T, self.len)
	}

	fn layout_for(&self, capacity: usize) -> Layout {
		if self.stride == 0 {
			return unsafe { Layout::from_size_align_unchecked(0, self.align) };
		}
		let bytes = self.stride.checked_mul(capacity).unwrap_or_else(|| capacity_overflow());
		Layout::from_size_align(bytes, self.align).unwrap_or_else(|_| capacity_overflow())
	}
}

impl Drop for AnyBuffer {
	fn drop(&mut self) {
		let layout = self.layout_for(self.capacity);
		if layout.size() != 0 {
			unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) }
		}
	}
}

fn dangling(align: usize) -> NonNull<u8> {
	// Alignments are non-zero powers of two.
	unsafe { NonNull::new_unchecked(align as *mut u8) }
}

#[cold]
fn capacity_overflow() -> ! {
	panic!("capacity overflow")
}
