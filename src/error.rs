//! Error types for the registry side of the storage core.
//!
//! Structural misuse of a [Scene](crate::scene::Scene) (adding a component twice,
//! releasing an id that is not alive) is treated as a programming error and panics;
//! ordinary lookup misses are reported through `Option` and `bool`.

use crate::components::ComponentId;
use thiserror::Error;

/// Errors returned by [TypeRegistry](crate::components::TypeRegistry) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
	/// The registry already holds the maximum number of component types.
	#[error("cannot register more than {limit} component types")]
	TooManyComponentTypes {
		/// The hard limit imposed by the signature width.
		limit: usize,
	},

	/// No descriptor is registered under the given id.
	#[error("component type {0} is not registered")]
	UnknownComponentType(ComponentId),

	/// A descriptor was built from a size/alignment pair that is not a valid layout.
	#[error("invalid layout for component type `{name}`")]
	InvalidLayout {
		/// Name of the offending descriptor.
		name: String,
	},

	/// A typed accessor was used on storage holding a different type.
	#[error("component storage holds `{found}`, not `{expected}`")]
	TypeMismatch {
		/// The type the caller asked for.
		expected: &'static str,
		/// The type actually stored.
		found: String,
	},
}

/// Result alias used across the crate.
pub type EcsResult<T> = Result<T, EcsError>;
