/// Construction-time settings for a [Scene](crate::scene::Scene).
#[derive(Clone, Debug)]
pub struct SceneConfig {
	/// Run lifecycle notifications inside a deferral window, so structural
	/// changes requested by handlers are queued until the next flush.
	pub defer_notifications: bool,
	/// Dense capacity reserved up front for the entity signature pool.
	pub entity_capacity: usize,
	/// Dense capacity reserved for every component pool when it is first allocated.
	pub component_capacity: usize,
}

impl SceneConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_defer_notifications(mut self, value: bool) -> Self {
		self.defer_notifications = value;
		self
	}

	pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
		self.entity_capacity = capacity;
		self
	}

	pub fn with_component_capacity(mut self, capacity: usize) -> Self {
		self.component_capacity = capacity;
		self
	}
}

impl Default for SceneConfig {
	fn default() -> Self {
		Self {
			defer_notifications: true,
			entity_capacity: 0,
			component_capacity: 0,
		}
	}
}
