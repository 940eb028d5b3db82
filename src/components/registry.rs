use crate::components::{Component, ComponentDescriptor, ComponentId, MAX_COMPONENT_TYPES};
use crate::error::{EcsError, EcsResult};
use std::collections::HashMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::any::TypeId;
use std::sync::Arc;

lazy_static! {
	static ref GLOBAL_REGISTRY: Arc<TypeRegistry> = Arc::new(TypeRegistry::new());
}

/// Maps [component ids](ComponentId) to the [descriptors](ComponentDescriptor) of their types.
///
/// Scenes that share a registry agree on what every id means, which is required for
/// copying or swapping their contents.
#[derive(Default)]
pub struct TypeRegistry {
	inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
	descriptors: Vec<Arc<ComponentDescriptor>>,
	by_type: HashMap<TypeId, ComponentId>,
}

impl TypeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The process-wide registry used by [Scene::new](crate::scene::Scene::new).
	pub fn global() -> Arc<TypeRegistry> {
		GLOBAL_REGISTRY.clone()
	}

	/// Register the Rust type `T`, or return its id if it is already registered.
	pub fn register<T: Component>(&self) -> EcsResult<ComponentId> {
		if let Some(id) = self.id_of::<T>() {
			return Ok(id);
		}

		let mut inner = self.inner.write();
		if let Some(id) = inner.by_type.get(&TypeId::of::<T>()) {
			return Ok(*id);
		}

		let id = inner.push(ComponentDescriptor::of::<T>())?;
		inner.by_type.insert(TypeId::of::<T>(), id);
		Ok(id)
	}

	/// Register a type through its descriptor alone.
	/// Every call allocates a new id, even for descriptors with the same name.
	pub fn register_descriptor(&self, descriptor: ComponentDescriptor) -> EcsResult<ComponentId> {
		let type_id = descriptor.type_id();
		let mut inner = self.inner.write();
		let id = inner.push(descriptor)?;
		if let Some(type_id) = type_id {
			inner.by_type.entry(type_id).or_insert(id);
		}
		Ok(id)
	}

	/// Id of the Rust type `T`, if registered.
	pub fn id_of<T: 'static>(&self) -> Option<ComponentId> {
		self.inner.read().by_type.get(&TypeId::of::<T>()).copied()
	}

	pub fn descriptor(&self, id: ComponentId) -> EcsResult<Arc<ComponentDescriptor>> {
		self.inner.read().descriptors.get(id.index()).cloned().ok_or(EcsError::UnknownComponentType(id))
	}

	pub fn contains(&self, id: ComponentId) -> bool {
		id.index() < self.len()
	}

	pub fn len(&self) -> usize {
		self.inner.read().descriptors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl RegistryInner {
	fn push(&mut self, descriptor: ComponentDescriptor) -> EcsResult<ComponentId> {
		let index = self.descriptors.len();
		if index >= MAX_COMPONENT_TYPES {
			return Err(EcsError::TooManyComponentTypes { limit: MAX_COMPONENT_TYPES });
		}

		tracing::debug!(id = index, name = descriptor.name(), size = descriptor.size(), "registered component type");
		self.descriptors.push(Arc::new(descriptor));
		Ok(ComponentId::from_index(index as u8))
	}
}
