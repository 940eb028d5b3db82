use crate::error::{EcsError, EcsResult};
use std::alloc::Layout;
use std::any::TypeId;
use std::fmt;

/// A typed, fixed-size piece of data that can be attached to an entity.
///
/// Implemented by #\[derive([`Component`])], or by hand to give the type a custom name.
pub trait Component
where
	Self: 'static + Clone + Default + Send + Sync,
{
	/// Human readable name used by descriptors and log output.
	fn type_name() -> &'static str {
		std::any::type_name::<Self>()
	}
}

/// Construction, destruction and copy capabilities of a component type,
/// expressed over raw bytes so storage never needs to know the concrete type.
#[derive(Clone)]
pub struct ComponentDescriptor {
	name: String,
	layout: Layout,
	type_id: Option<TypeId>,
	construct: Option<unsafe fn(*mut u8)>,
	destroy: Option<unsafe fn(*mut u8)>,
	clone: Option<unsafe fn(*const u8, *mut u8)>,
}

impl ComponentDescriptor {
	/// Describe the Rust type `T`.
	pub fn of<T: Component>() -> Self {
		Self {
			name: T::type_name().to_owned(),
			layout: Layout::new::<T>(),
			type_id: Some(TypeId::of::<T>()),
			construct: Some(construct_default::<T>),
			destroy: std::mem::needs_drop::<T>().then_some(destroy_in_place::<T> as unsafe fn(*mut u8)),
			clone: Some(clone_into::<T>),
		}
	}

	/// Describe a plain-bytes type: constructed as all zeroes, copied bitwise, nothing to destroy.
	pub fn zeroed(name: impl Into<String>, size: usize, align: usize) -> EcsResult<Self> {
		let name = name.into();
		let layout = Layout::from_size_align(size, align).map_err(|_| EcsError::InvalidLayout { name: name.clone() })?;
		Ok(Self {
			name,
			layout,
			type_id: None,
			construct: None,
			destroy: None,
			clone: None,
		})
	}

	/// Describe a foreign type through its raw capabilities.
	/// Values are copied bitwise.
	///
	/// # Safety
	/// - `construct` must fully initialize `layout.size()` bytes at a suitably aligned pointer.
	/// - `destroy`, if any, must release whatever `construct` acquired and leave the bytes unused.
	/// - The type must be safe to move bitwise and to send between threads.
	pub unsafe fn raw(
		name: impl Into<String>, layout: Layout, construct: unsafe fn(*mut u8), destroy: Option<unsafe fn(*mut u8)>,
	) -> Self {
		Self {
			name: name.into(),
			layout,
			type_id: None,
			construct: Some(construct),
			destroy,
			clone: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn layout(&self) -> Layout {
		self.layout
	}

	pub fn size(&self) -> usize {
		self.layout.size()
	}

	/// The Rust type this descriptor was built from, if any.
	pub fn type_id(&self) -> Option<TypeId> {
		self.type_id
	}

	pub fn is<T: 'static>(&self) -> bool {
		self.type_id == Some(TypeId::of::<T>())
	}

	pub fn needs_destroy(&self) -> bool {
		self.destroy.is_some()
	}

	/// `true` for descriptors built with [zeroed](Self::zeroed): every byte pattern is a
	/// valid value, so the bytes may be read and written directly.
	pub fn is_plain_bytes(&self) -> bool {
		self.type_id.is_none() && self.construct.is_none() && self.destroy.is_none() && self.clone.is_none()
	}

	/// Construct a default value in place.
	///
	/// # Safety
	/// `ptr` must be valid for writes of `size()` bytes and aligned to the descriptor's layout.
	#[inline(always)]
	pub unsafe fn construct(&self, ptr: *mut u8) {
		match self.construct {
			Some(construct) => construct(ptr),
			None => ptr.write_bytes(0, self.layout.size()),
		}
	}

	/// Destroy the value at `ptr` in place.
	///
	/// # Safety
	/// `ptr` must point to a value previously constructed with this descriptor and not yet destroyed.
	#[inline(always)]
	pub unsafe fn destroy(&self, ptr: *mut u8) {
		if let Some(destroy) = self.destroy {
			destroy(ptr)
		}
	}

	/// Write a deep copy of the value at `src` into `dst`.
	///
	/// # Safety
	/// `src` must point to a live value of this type, `dst` to uninitialized, aligned storage
	/// that does not overlap `src`.
	#[inline(always)]
	pub unsafe fn clone_value(&self, src: *const u8, dst: *mut u8) {
		match self.clone {
			Some(clone) => clone(src, dst),
			None => std::ptr::copy_nonoverlapping(src, dst, self.layout.size()),
		}
	}

	pub(crate) fn check<T: 'static>(&self) -> EcsResult<()> {
		match self.is::<T>() {
			true => Ok(()),
			false => Err(EcsError::TypeMismatch {
				expected: std::any::type_name::<T>(),
				found: self.name.clone(),
			}),
		}
	}
}

impl fmt::Debug for ComponentDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentDescriptor")
			.field("name", &self.name)
			.field("size", &self.layout.size())
			.field("align", &self.layout.align())
			.finish()
	}
}

unsafe fn construct_default<T: Default>(ptr: *mut u8) {
	std::ptr::write(ptr as *mut T, T::default());
}

unsafe fn destroy_in_place<T>(ptr: *mut u8) {
	std::ptr::drop_in_place(ptr as *mut T);
}

unsafe fn clone_into<T: Clone>(src: *const u8, dst: *mut u8) {
	std::ptr::write(dst as *mut T, (*(src as *const T)).clone());
}
