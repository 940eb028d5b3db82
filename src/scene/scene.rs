use crate::components::{Component, ComponentDescriptor, ComponentId, ComponentPool, ComponentSet, TypeRegistry};
use crate::scene::{ComponentEvent, EntityEvent, PendingQueue, Signals, StagedComponent};
use crate::entities::{EntityId, EntityIdAllocator, EntityQuery};
use crate::data_structures::Signature;
use std::hash::BuildHasherDefault;
use nohash_hasher::NoHashHasher;
use std::collections::{HashMap, HashSet};
use crate::error::EcsResult;
use crate::config::SceneConfig;
use std::ptr::NonNull;
use std::sync::Arc;

type Hasher = BuildHasherDefault<NoHashHasher<u8>>;
type EntityHasher = BuildHasherDefault<NoHashHasher<u32>>;

/// Everything a scene exchanges on [swap](Scene::swap).
struct SceneStorage {
	registry: Arc<TypeRegistry>,
	allocator: EntityIdAllocator,
	entities: ComponentPool,
	pools: HashMap<ComponentId, ComponentPool, Hasher>,
	pending: PendingQueue,
}

impl SceneStorage {
	fn new(registry: Arc<TypeRegistry>, entity_capacity: usize) -> Self {
		let signature = Arc::new(ComponentDescriptor::of::<Signature>());
		Self {
			registry,
			allocator: EntityIdAllocator::new(),
			entities: ComponentPool::with_capacity(signature, entity_capacity),
			pools: HashMap::default(),
			pending: PendingQueue::new(),
		}
	}
}

/// A container for entities and their components.
///
/// Components are addressed by [ComponentId] through the type-erased API
/// (`add_component`, `get_component`, ...), or by Rust type through the typed façade
/// (`add`, `get`, ...), which resolves the id and then behaves identically.
/// The type-erased API hands out raw pointers; byte slices are only available for
/// [plain bytes](ComponentDescriptor::is_plain_bytes) types.
///
/// While deferral is enabled (inside [deferred](Self::deferred), entity iteration, and by
/// default inside lifecycle notifications) component adds and removes are recorded in the
/// pending queue instead of touching the pools. [update](Self::update) applies them.
pub struct Scene {
	storage: SceneStorage,
	signals: Signals,
	config: SceneConfig,
	defer_depth: u32,
	flush_removed: Option<HashSet<EntityId, EntityHasher>>,
}

impl Scene {
	/// Create a scene backed by the [global registry](TypeRegistry::global).
	pub fn new() -> Self {
		Self::with_config(SceneConfig::default())
	}

	pub fn with_config(config: SceneConfig) -> Self {
		Self::with_registry(TypeRegistry::global(), config)
	}

	pub fn with_registry(registry: Arc<TypeRegistry>, config: SceneConfig) -> Self {
		Self {
			storage: SceneStorage::new(registry, config.entity_capacity),
			signals: Signals::new(),
			defer_depth: 0,
			flush_removed: None,
			config,
		}
	}

	pub fn registry(&self) -> &Arc<TypeRegistry> {
		&self.storage.registry
	}

	pub fn config(&self) -> &SceneConfig {
		&self.config
	}

	pub fn signals(&self) -> &Signals {
		&self.signals
	}

	pub fn signals_mut(&mut self) -> &mut Signals {
		&mut self.signals
	}

	pub fn allocator(&self) -> &EntityIdAllocator {
		&self.storage.allocator
	}

	pub fn pending(&self) -> &PendingQueue {
		&self.storage.pending
	}

	// ---------------------------------------------------------------- entities

	/// Create an entity with no components.
	pub fn add_entity(&mut self) -> EntityId {
		let id = self.storage.allocator.allocate();
		self.spawn(id)
	}

	/// Create an entity, using `hint` as its id if that id is available.
	pub fn add_entity_hinted(&mut self, hint: EntityId) -> EntityId {
		let id = self.storage.allocator.allocate_hinted(hint);
		self.spawn(id)
	}

	/// Remove an entity and every component attached to it.
	/// Returns `false` if `id` is not alive.
	pub fn remove_entity(&mut self, id: EntityId) -> bool {
		if !self.is_alive(id) {
			return false;
		}

		self.emit_entity(EntityEvent::Removing, id);
		if !self.is_alive(id) {
			return false;
		}

		for pool in self.storage.pools.values_mut() {
			pool.remove(id);
		}

		let cancelled = self.storage.pending.cancel_entity(id);
		if let Some(removed) = &mut self.flush_removed {
			removed.insert(id);
		}
		self.storage.entities.remove(id);
		self.storage.allocator.release(id);
		tracing::trace!(%id, cancelled, "entity removed");
		true
	}

	pub fn is_alive(&self, id: EntityId) -> bool {
		self.storage.entities.has(id)
	}

	pub fn entity_count(&self) -> usize {
		self.storage.entities.len()
	}

	/// Every live entity, in storage order.
	pub fn entities(&self) -> &[EntityId] {
		self.storage.entities.entities()
	}

	pub fn signature(&self, id: EntityId) -> Option<Signature> {
		self.storage.entities.get_as::<Signature>(id).copied()
	}

	fn spawn(&mut self, id: EntityId) -> EntityId {
		self.storage.entities.add_default(id);
		tracing::trace!(%id, "entity created");
		self.emit_entity(EntityEvent::Created, id);
		id
	}

	// -------------------------------------------------------------- components

	/// Attach a default-constructed component of type `component` to `id` and return a
	/// pointer to it.
	///
	/// With deferral enabled the component is staged: the pointer refers to the staged
	/// instance, which joins the pool on the next [update](Self::update). If the entity
	/// already carries the component, the live instance is returned instead.
	///
	/// The pointer is invalidated by the next add or remove on the same pool, or by the
	/// next [update](Self::update) for a staged instance.
	///
	/// # Panics
	/// - If `component` is not registered or `id` is not alive.
	/// - Without deferral, if `id` already carries the component.
	/// - Without deferral, if an init notification running with
	///   [defer_notifications](SceneConfig::defer_notifications) disabled removes the new
	///   component, or its entity, before the call returns.
	pub fn add_component(&mut self, component: ComponentId, id: EntityId) -> NonNull<u8> {
		self.add_component_with(component, id, |_| {})
	}

	/// Like [add_component](Self::add_component), running `init` on the new value before
	/// any notification observes it.
	pub fn add_component_with(
		&mut self, component: ComponentId, id: EntityId, init: impl FnOnce(NonNull<u8>),
	) -> NonNull<u8> {
		let descriptor = self.descriptor(component);
		assert!(self.is_alive(id), "cannot add `{}` to {id}, which is not alive", descriptor.name());

		if self.is_deferred() {
			if let Some(live) = self.get_component_mut(component, id) {
				init(live);
				return live;
			}

			tracing::trace!(%id, %component, "staged component add");
			let staged = self.storage.pending.push_add(id, component, StagedComponent::new(descriptor));
			init(staged);
			return staged;
		}

		init(self.pool_or_insert(component, descriptor).add_default(id));
		self.set_signature_bit(id, component, true);
		tracing::trace!(%id, %component, "component added");

		self.emit_component(ComponentEvent::Init, id, component);
		match self.get_component_mut(component, id) {
			Some(ptr) => ptr,
			None => panic!("component {component} of {id} was removed by its own init notification"),
		}
	}

	/// Read-only pointer to the component of type `component` of `id`.
	pub fn get_component(&self, component: ComponentId, id: EntityId) -> Option<NonNull<u8>> {
		self.storage.pools.get(&component)?.get_ptr(id)
	}

	/// Writable pointer to the component of type `component` of `id`.
	pub fn get_component_mut(&mut self, component: ComponentId, id: EntityId) -> Option<NonNull<u8>> {
		self.storage.pools.get_mut(&component)?.get_mut_ptr(id)
	}

	/// Bytes of a plain-bytes component.
	///
	/// # Panics
	/// If the type is not [plain bytes](ComponentDescriptor::is_plain_bytes).
	pub fn get_bytes(&self, component: ComponentId, id: EntityId) -> Option<&[u8]> {
		self.storage.pools.get(&component)?.get(id)
	}

	/// # Panics
	/// If the type is not [plain bytes](ComponentDescriptor::is_plain_bytes).
	pub fn get_bytes_mut(&mut self, component: ComponentId, id: EntityId) -> Option<&mut [u8]> {
		self.storage.pools.get_mut(&component)?.get_mut(id)
	}

	pub fn has_component(&self, component: ComponentId, id: EntityId) -> bool {
		self.storage.pools.get(&component).map_or(false, |pool| pool.has(id))
	}

	/// Check the entity's signature for every bit of `signature`.
	pub fn has_all(&self, id: EntityId, signature: Signature) -> bool {
		self.signature(id).map_or(false, |own| own.contains_all(signature))
	}

	/// Detach the component of type `component` from `id`.
	///
	/// With deferral enabled the removal is queued, and the return value tells whether the
	/// component currently exists.
	///
	/// # Panics
	/// If `component` is not registered.
	pub fn remove_component(&mut self, component: ComponentId, id: EntityId) -> bool {
		self.descriptor(component);
		let present = self.has_component(component, id);

		if self.is_deferred() {
			if self.is_alive(id) {
				tracing::trace!(%id, %component, "queued component removal");
				self.storage.pending.push_remove(id, component);
			}
			return present;
		}

		if !present {
			return false;
		}

		self.emit_component(ComponentEvent::Shutdown, id, component);
		self.detach(component, id)
	}

	/// Read-only pointer to the most recently staged, not yet applied, instance of
	/// `component` for `id`.
	pub fn get_pending_component(&self, component: ComponentId, id: EntityId) -> Option<NonNull<u8>> {
		self.storage.pending.lookup(id, component)
	}

	pub fn get_pending_component_mut(&mut self, component: ComponentId, id: EntityId) -> Option<NonNull<u8>> {
		self.storage.pending.lookup_mut(id, component)
	}

	/// Shared access to a pool. Structural changes only go through the scene, which keeps
	/// entity signatures in step with the pools.
	pub fn pool(&self, component: ComponentId) -> Option<&ComponentPool> {
		self.storage.pools.get(&component)
	}

	/// Every allocated component pool.
	pub fn pools(&self) -> impl Iterator<Item = (ComponentId, &ComponentPool)> {
		self.storage.pools.iter().map(|(id, pool)| (*id, pool))
	}

	// ---------------------------------------------------------------- deferral

	pub fn is_deferred(&self) -> bool {
		self.defer_depth > 0
	}

	/// Start queueing structural changes. Calls nest.
	pub fn begin_deferred(&mut self) {
		self.defer_depth += 1;
	}

	pub fn end_deferred(&mut self) {
		debug_assert!(self.defer_depth > 0, "end_deferred without a matching begin_deferred");
		self.defer_depth = self.defer_depth.saturating_sub(1);
	}

	/// Run `func` with deferral enabled.
	pub fn deferred<R>(&mut self, func: impl FnOnce(&mut Scene) -> R) -> R {
		self.begin_deferred();
		let result = func(self);
		self.end_deferred();
		result
	}

	/// Apply every pending operation. This is the single synchronization point of a tick.
	///
	/// Shutdown notifications for queued removals fire first, then all operations are
	/// applied in the order they were requested, then init notifications fire for the
	/// applied adds. Changes requested by the notifications land in a fresh queue, and an
	/// entity removed by a notification drops whatever is left of its operations, even if
	/// its id is handed out again during the flush.
	pub fn update(&mut self) {
		let batch = self.storage.pending.take();
		if batch.is_empty() {
			return;
		}
		tracing::debug!(operations = batch.len(), "flushing pending operations");
		let outer = self.flush_removed.replace(HashSet::default());

		for op in batch.iter().filter(|op| op.is_pending && !op.is_add) {
			if !self.removed_in_flush(op.entity) && self.has_component(op.component, op.entity) {
				self.emit_component(ComponentEvent::Shutdown, op.entity, op.component);
			}
		}

		let depth = std::mem::replace(&mut self.defer_depth, 0);
		let mut initialized = Vec::new();
		for op in batch {
			if !op.is_pending || self.removed_in_flush(op.entity) || !self.is_alive(op.entity) {
				continue;
			}

			match op.staged {
				Some(staged) => {
					if self.attach_staged(op.component, op.entity, staged) {
						initialized.push((op.entity, op.component));
					}
				},
				None => {
					self.detach(op.component, op.entity);
				},
			}
		}
		self.defer_depth = depth;

		for (id, component) in initialized {
			if !self.removed_in_flush(id) && self.has_component(component, id) {
				self.emit_component(ComponentEvent::Init, id, component);
			}
		}

		// Removals seen by a nested flush also cancel what is left of the enclosing one.
		let removed = std::mem::replace(&mut self.flush_removed, outer).unwrap_or_default();
		if let Some(outer) = &mut self.flush_removed {
			outer.extend(removed);
		}
	}

	// --------------------------------------------------------------- iteration

	/// Ids of every live entity matching `query`.
	pub fn query(&self, query: &EntityQuery) -> Vec<EntityId> {
		let signatures = self.storage.entities.as_slice::<Signature>().unwrap_or_default();
		self.entities()
			.iter()
			.zip(signatures)
			.filter(|(_, signature)| query.matches(**signature))
			.map(|(id, _)| *id)
			.collect()
	}

	/// Visit every live entity with deferral enabled.
	/// Entities removed during the visit are skipped, entities created during it are not visited.
	pub fn for_each_entity(&mut self, mut func: impl FnMut(&mut Scene, EntityId)) {
		let ids = self.entities().to_vec();
		self.visit(ids, &mut func);
	}

	/// Visit every live entity matching `query` with deferral enabled.
	pub fn for_each_matching(&mut self, query: &EntityQuery, mut func: impl FnMut(&mut Scene, EntityId)) {
		let ids = self.query(query);
		self.visit(ids, &mut func);
	}

	fn visit(&mut self, ids: Vec<EntityId>, func: &mut impl FnMut(&mut Scene, EntityId)) {
		self.deferred(|scene| {
			for id in ids {
				if scene.is_alive(id) {
					func(&mut *scene, id);
				}
			}
		});
	}

	// ------------------------------------------------------------ whole scene

	/// Replace the contents of `self` with a deep copy of `other`'s entities and components.
	/// Pending operations are discarded, hooks and configuration are kept.
	pub fn copy_from(&mut self, other: &Scene) {
		self.storage.pending.clear();
		self.storage.registry = other.storage.registry.clone();
		self.storage.allocator = other.storage.allocator.clone();
		self.storage.entities.copy_from(&other.storage.entities);
		self.storage.pools = other.storage.pools.iter().map(|(id, pool)| (*id, pool.clone())).collect();
		tracing::debug!(entities = self.entity_count(), pools = self.storage.pools.len(), "scene copied");
	}

	/// Exchange contents with `other`. Both scenes stay where they are, along with their
	/// hooks and configuration, so anything holding a reference to `self` observes what
	/// used to be `other`'s entities.
	pub fn swap(&mut self, other: &mut Scene) {
		std::mem::swap(&mut self.storage, &mut other.storage);
	}

	/// Drop every entity, component pool and pending operation.
	pub fn clear(&mut self) {
		self.storage.pending.clear();
		self.storage.pools.clear();
		self.storage.entities.clear();
		self.storage.allocator.clear();
	}

	// ------------------------------------------------------------------ typed

	/// Register `T` with the scene's registry.
	pub fn register<T: Component>(&self) -> EcsResult<ComponentId> {
		self.storage.registry.register::<T>()
	}

	/// Id of `T`, if registered.
	pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
		self.storage.registry.id_of::<T>()
	}

	/// Typed [add_component](Self::add_component). Registers `T` on first use.
	pub fn add<T: Component>(&mut self, id: EntityId) -> &mut T {
		let component = self.require::<T>();
		unsafe { self.add_component(component, id).cast::<T>().as_mut() }
	}

	/// Attach `value` as the `T` of `id`; notifications observe `value`, not the default.
	pub fn insert<T: Component>(&mut self, id: EntityId, value: T) -> &mut T {
		let component = self.require::<T>();
		let ptr = self.add_component_with(component, id, |ptr| unsafe { *ptr.cast::<T>().as_ptr() = value });
		unsafe { ptr.cast::<T>().as_mut() }
	}

	pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
		self.pool(self.component_id::<T>()?)?.get_as(id)
	}

	pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
		let component = self.component_id::<T>()?;
		self.storage.pools.get_mut(&component)?.get_as_mut(id)
	}

	pub fn has<T: Component>(&self, id: EntityId) -> bool {
		self.component_id::<T>().map_or(false, |component| self.has_component(component, id))
	}

	/// Check that `id` carries every type of the set `S`.
	pub fn has_all_of<S: ComponentSet>(&self, id: EntityId) -> bool {
		S::signature(&self.storage.registry).map_or(false, |signature| self.has_all(id, signature))
	}

	pub fn remove<T: Component>(&mut self, id: EntityId) -> bool {
		match self.component_id::<T>() {
			Some(component) => self.remove_component(component, id),
			None => false,
		}
	}

	/// Typed [get_pending_component_mut](Self::get_pending_component_mut).
	pub fn pending_component<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
		let component = self.component_id::<T>()?;
		let ptr = self.get_pending_component_mut(component, id)?;
		unsafe { Some(ptr.cast::<T>().as_mut()) }
	}

	/// Update every `T` in place across the rayon thread pool.
	pub fn par_for_each_mut<T, F>(&mut self, func: F) -> EcsResult<()>
	where
		T: Component,
		F: Fn(EntityId, &mut T) + Send + Sync,
	{
		match self.component_id::<T>().and_then(|component| self.storage.pools.get_mut(&component)) {
			Some(pool) => pool.par_for_each_mut(func),
			None => Ok(()),
		}
	}

	pub fn on_component_init<T: Component>(
		&mut self, hook: impl Fn(&mut Scene, EntityId, ComponentId) + Send + Sync + 'static,
	) -> EcsResult<ComponentId> {
		let component = self.register::<T>()?;
		self.signals.on_component_init(component, hook);
		Ok(component)
	}

	pub fn on_component_shutdown<T: Component>(
		&mut self, hook: impl Fn(&mut Scene, EntityId, ComponentId) + Send + Sync + 'static,
	) -> EcsResult<ComponentId> {
		let component = self.register::<T>()?;
		self.signals.on_component_shutdown(component, hook);
		Ok(component)
	}

	// --------------------------------------------------------------- internals

	fn require<T: Component>(&self) -> ComponentId {
		match self.register::<T>() {
			Ok(component) => component,
			Err(err) => panic!("cannot use `{}` as a component: {err}", T::type_name()),
		}
	}

	fn descriptor(&self, component: ComponentId) -> Arc<ComponentDescriptor> {
		match self.storage.registry.descriptor(component) {
			Ok(descriptor) => descriptor,
			Err(err) => panic!("{err}"),
		}
	}

	fn pool_or_insert(&mut self, component: ComponentId, descriptor: Arc<ComponentDescriptor>) -> &mut ComponentPool {
		let capacity = self.config.component_capacity;
		self.storage.pools.entry(component).or_insert_with(|| {
			tracing::debug!(%component, name = descriptor.name(), "allocated component pool");
			ComponentPool::with_capacity(descriptor, capacity)
		})
	}

	fn set_signature_bit(&mut self, id: EntityId, component: ComponentId, value: bool) {
		if let Some(signature) = self.storage.entities.get_as_mut::<Signature>(id) {
			signature.set(component, value);
		}
	}

	/// Move a staged value into its pool. Returns `true` if the component was newly attached,
	/// `false` if it overwrote a live value.
	fn attach_staged(&mut self, component: ComponentId, id: EntityId, staged: StagedComponent) -> bool {
		let pool = self.pool_or_insert(component, staged.descriptor().clone());
		let attached = unsafe {
			staged.move_into(|src| match pool.has(id) {
				true => {
					pool.replace_moved(id, src);
					false
				},
				false => {
					pool.add_moved(id, src);
					true
				},
			})
		};

		if attached {
			self.set_signature_bit(id, component, true);
			tracing::trace!(%id, %component, "applied pending add");
		}
		attached
	}

	fn removed_in_flush(&self, id: EntityId) -> bool {
		self.flush_removed.as_ref().map_or(false, |removed| removed.contains(&id))
	}

	fn detach(&mut self, component: ComponentId, id: EntityId) -> bool {
		let removed = self.storage.pools.get_mut(&component).map_or(false, |pool| pool.remove(id));
		if removed {
			self.set_signature_bit(id, component, false);
			tracing::trace!(%id, %component, "component removed");
		}
		removed
	}

	fn emit_entity(&mut self, event: EntityEvent, id: EntityId) {
		let hooks = self.signals.entity_hooks(event);
		if hooks.is_empty() {
			return;
		}
		self.notification_window(|scene| {
			for hook in &hooks {
				hook(&mut *scene, id);
			}
		});
	}

	fn emit_component(&mut self, event: ComponentEvent, id: EntityId, component: ComponentId) {
		let hooks = self.signals.component_hooks(event, component);
		if hooks.is_empty() {
			return;
		}
		self.notification_window(|scene| {
			for hook in &hooks {
				hook(&mut *scene, id, component);
			}
		});
	}

	fn notification_window(&mut self, func: impl FnOnce(&mut Scene)) {
		match self.config.defer_notifications {
			true => self.deferred(func),
			false => func(self),
		}
	}
}

impl Default for Scene {
	fn default() -> Self {
		Self::new()
	}
}
