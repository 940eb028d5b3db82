use crate::components::Component;
use std::sync::Arc;

mod scene_tests;

#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub(crate) struct Position {
	pub x: f32,
	pub y: f32,
}

#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub(crate) struct Velocity {
	pub x: f32,
	pub y: f32,
}

#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub(crate) struct Health(pub u32);

#[derive(Component, Clone, Default, Debug, PartialEq)]
pub(crate) struct Name(pub String);

#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub(crate) struct Frozen;

/// Holds a clone of a shared token, so live instances can be counted through `Arc::strong_count`.
#[derive(Clone, Default, Debug)]
pub(crate) struct Tracked(pub Arc<()>);

impl Component for Tracked {
	fn type_name() -> &'static str {
		"Tracked"
	}
}
