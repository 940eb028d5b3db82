use crate::components::{ComponentDescriptor, ComponentId};
use crate::data_structures::AnyBuffer;
use crate::entities::EntityId;
use std::ptr::NonNull;
use std::sync::Arc;

/// A default-constructed component that is not part of any pool yet.
pub(crate) struct StagedComponent {
	descriptor: Arc<ComponentDescriptor>,
	buffer: AnyBuffer,
}

impl StagedComponent {
	pub fn new(descriptor: Arc<ComponentDescriptor>) -> Self {
		let mut buffer = AnyBuffer::with_capacity(descriptor.layout(), 1);
		unsafe {
			descriptor.construct(buffer.slot_ptr(0));
			buffer.set_len(1);
		}
		Self { descriptor, buffer }
	}

	pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
		&self.descriptor
	}

	pub fn as_ptr(&self) -> NonNull<u8> {
		unsafe { NonNull::new_unchecked(self.buffer.as_ptr(0) as *mut u8) }
	}

	pub fn as_mut_ptr(&mut self) -> NonNull<u8> {
		unsafe { NonNull::new_unchecked(self.buffer.as_mut_ptr(0)) }
	}

	/// Hand the staged value over to `sink`, which takes ownership of it.
	///
	/// # Safety
	/// `sink` must move the value out of the pointer it receives (or destroy it).
	pub unsafe fn move_into<R>(mut self, sink: impl FnOnce(*const u8) -> R) -> R {
		let result = sink(self.buffer.as_ptr(0));
		self.buffer.set_len(0);
		result
	}
}

impl Drop for StagedComponent {
	fn drop(&mut self) {
		if !self.buffer.is_empty() {
			unsafe { self.descriptor.destroy(self.buffer.as_mut_ptr(0)) }
		}
	}
}

/// A structural change requested while deferral was enabled.
pub struct PendingOperation {
	pub(crate) entity: EntityId,
	pub(crate) component: ComponentId,
	pub(crate) is_add: bool,
	pub(crate) is_pending: bool,
	pub(crate) staged: Option<StagedComponent>,
}

impl PendingOperation {
	pub fn entity(&self) -> EntityId {
		self.entity
	}

	pub fn component(&self) -> ComponentId {
		self.component
	}

	pub fn is_add(&self) -> bool {
		self.is_add
	}

	/// `false` once the operation has been cancelled, e.g. because its entity was removed.
	pub fn is_pending(&self) -> bool {
		self.is_pending
	}

	/// Read-only pointer to the staged value of an add.
	pub fn staged(&self) -> Option<NonNull<u8>> {
		self.staged.as_ref().map(StagedComponent::as_ptr)
	}
}

/// Ordered log of pending adds and removes, replayed once per tick by
/// [Scene::update](crate::scene::Scene::update).
#[derive(Default)]
pub struct PendingQueue {
	operations: Vec<PendingOperation>,
}

impl PendingQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn push_add(&mut self, entity: EntityId, component: ComponentId, staged: StagedComponent) -> NonNull<u8> {
		self.operations.push(PendingOperation {
			entity,
			component,
			is_add: true,
			is_pending: true,
			staged: Some(staged),
		});

		let index = self.operations.len() - 1;
		match &mut self.operations[index].staged {
			Some(staged) => staged.as_mut_ptr(),
			None => unreachable!("pending add without a staged value"),
		}
	}

	pub(crate) fn push_remove(&mut self, entity: EntityId, component: ComponentId) {
		self.operations.push(PendingOperation {
			entity,
			component,
			is_add: false,
			is_pending: true,
			staged: None,
		});
	}

	/// Read-only pointer to the most recently staged value for `(entity, component)`.
	pub fn lookup(&self, entity: EntityId, component: ComponentId) -> Option<NonNull<u8>> {
		self.operations
			.iter()
			.rev()
			.find(|op| op.is_pending && op.is_add && op.entity == entity && op.component == component)
			.and_then(PendingOperation::staged)
	}

	pub fn lookup_mut(&mut self, entity: EntityId, component: ComponentId) -> Option<NonNull<u8>> {
		self.operations
			.iter_mut()
			.rev()
			.find(|op| op.is_pending && op.is_add && op.entity == entity && op.component == component)
			.and_then(|op| op.staged.as_mut())
			.map(StagedComponent::as_mut_ptr)
	}

	/// Cancel every operation targeting `entity`, destroying staged values.
	/// Returns how many operations were cancelled.
	pub fn cancel_entity(&mut self, entity: EntityId) -> usize {
		let mut cancelled = 0;
		for op in self.operations.iter_mut().filter(|op| op.is_pending && op.entity == entity) {
			op.is_pending = false;
			op.staged = None;
			cancelled += 1;
		}
		cancelled
	}

	/// Swap the queue out for an empty one.
	pub(crate) fn take(&mut self) -> Vec<PendingOperation> {
		std::mem::take(&mut self.operations)
	}

	pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
		self.operations.iter()
	}

	pub fn len(&self) -> usize {
		self.operations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}

	pub fn clear(&mut self) {
		self.operations.clear();
	}
}
