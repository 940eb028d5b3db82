use crate::components::ComponentId;
use std::hash::BuildHasherDefault;
use nohash_hasher::NoHashHasher;
use std::collections::HashMap;
use crate::entities::EntityId;
use crate::scene::Scene;
use std::sync::Arc;

type Hasher = BuildHasherDefault<NoHashHasher<u8>>;

/// Handler for entity lifecycle events.
pub type EntityHook = Arc<dyn Fn(&mut Scene, EntityId) + Send + Sync>;
/// Handler for per-type component lifecycle events.
/// The component itself is reached through the scene, using the entity and component ids.
pub type ComponentHook = Arc<dyn Fn(&mut Scene, EntityId, ComponentId) + Send + Sync>;

/// The lifecycle hook points a [Scene] reports to.
///
/// - entity created: right after a new id is allocated and its signature is zeroed
/// - entity removing: before any of the entity's components are detached
/// - component init: after a component is attached (for deferred adds, after the whole batch is applied)
/// - component shutdown: before a component is detached
#[derive(Default, Clone)]
pub struct Signals {
	entity_created: Vec<EntityHook>,
	entity_removing: Vec<EntityHook>,
	component_init: HashMap<ComponentId, Vec<ComponentHook>, Hasher>,
	component_shutdown: HashMap<ComponentId, Vec<ComponentHook>, Hasher>,
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum EntityEvent {
	Created,
	Removing,
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum ComponentEvent {
	Init,
	Shutdown,
}

impl Signals {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on_entity_created(&mut self, hook: impl Fn(&mut Scene, EntityId) + Send + Sync + 'static) {
		self.entity_created.push(Arc::new(hook));
	}

	pub fn on_entity_removing(&mut self, hook: impl Fn(&mut Scene, EntityId) + Send + Sync + 'static) {
		self.entity_removing.push(Arc::new(hook));
	}

	pub fn on_component_init(
		&mut self, component: ComponentId, hook: impl Fn(&mut Scene, EntityId, ComponentId) + Send + Sync + 'static,
	) {
		self.component_init.entry(component).or_default().push(Arc::new(hook));
	}

	pub fn on_component_shutdown(
		&mut self, component: ComponentId, hook: impl Fn(&mut Scene, EntityId, ComponentId) + Send + Sync + 'static,
	) {
		self.component_shutdown.entry(component).or_default().push(Arc::new(hook));
	}

	/// Drop every registered hook.
	pub fn clear(&mut self) {
		self.entity_created.clear();
		self.entity_removing.clear();
		self.component_init.clear();
		self.component_shutdown.clear();
	}

	pub(crate) fn entity_hooks(&self, event: EntityEvent) -> Vec<EntityHook> {
		match event {
			EntityEvent::Created => self.entity_created.clone(),
			EntityEvent::Removing => self.entity_removing.clone(),
		}
	}

	pub(crate) fn component_hooks(&self, event: ComponentEvent, component: ComponentId) -> Vec<ComponentHook> {
		let hooks = match event {
			ComponentEvent::Init => &self.component_init,
			ComponentEvent::Shutdown => &self.component_shutdown,
		};
		hooks.get(&component).cloned().unwrap_or_default()
	}
}
