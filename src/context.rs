use crate::systems::{System, SystemStore};
use crate::config::SceneConfig;
use std::ops::{Deref, DerefMut};
use crate::scene::Scene;

/// A [Scene] together with the [systems](System) that advance it.
///
/// Each [tick](Simulation::tick) runs every system with deferral enabled, then flushes the
/// scene's pending operations, so structural changes requested during a tick become
/// visible all at once at its end.
pub struct Simulation {
	scene: Scene,
	system_store: SystemStore,
	ticks: u64,
}

impl Simulation {
	pub fn new() -> Self {
		Self::with_scene(Scene::new())
	}

	pub fn with_config(config: SceneConfig) -> Self {
		Self::with_scene(Scene::with_config(config))
	}

	pub fn with_scene(scene: Scene) -> Self {
		Self {
			scene,
			system_store: SystemStore::new(),
			ticks: 0,
		}
	}

	pub fn scene(&self) -> &Scene {
		&self.scene
	}

	pub fn scene_mut(&mut self) -> &mut Scene {
		&mut self.scene
	}

	/// Add a new [system](System) to the [Simulation].
	pub fn register_system<T: 'static + System>(&mut self, system: T) {
		self.system_store.add_system(system);
	}

	pub fn system_count(&self) -> usize {
		self.system_store.len()
	}

	/// Initialize all [systems](System).
	/// Must be called before the first tick.
	pub fn setup_systems(&mut self) {
		self.system_store.setup_systems(&mut self.scene);
		self.scene.update();
	}

	/// Run all [systems](System), then apply the changes they requested.
	/// Systems are initialized on the first tick if [setup_systems](Self::setup_systems) was not called.
	pub fn tick(&mut self) {
		if !self.system_store.is_initialized() {
			self.setup_systems();
		}

		self.system_store.run_systems(&mut self.scene);
		self.scene.update();
		self.ticks += 1;
		tracing::trace!(tick = self.ticks, entities = self.scene.entity_count(), "tick complete");
	}

	/// Number of completed ticks.
	pub fn tick_count(&self) -> u64 {
		self.ticks
	}
}

impl Default for Simulation {
	fn default() -> Self {
		Self::new()
	}
}

impl Deref for Simulation {
	type Target = Scene;

	#[inline(always)]
	fn deref(&self) -> &Self::Target {
		&self.scene
	}
}

impl DerefMut for Simulation {
	#[inline(always)]
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.scene
	}
}
