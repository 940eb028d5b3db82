use crate::scene::Scene;

/// Per-tick logic operating on a [Scene].
///
/// Systems run with deferral enabled: component adds and removes they request are
/// applied once all systems of the tick have run.
pub trait System {
	/// Initialises the [System].
	/// **This function should not be called by user code.**
	fn setup(&mut self, _scene: &mut Scene) {}

	/// Executes the system.
	fn run(&mut self, scene: &mut Scene);
}
