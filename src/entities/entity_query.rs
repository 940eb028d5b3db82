use crate::components::{ComponentSet, TypeRegistry};
use crate::data_structures::Signature;
use std::marker::PhantomData;

/// A [Signature] based entity filter.
///
/// An entity matches when its signature contains every `include` bit and none of the
/// `exclude` bits.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq)]
pub struct EntityQuery {
	include: Signature,
	exclude: Signature,
	satisfiable: bool,
}

impl EntityQuery {
	pub fn new(include: Signature, exclude: Signature) -> Self {
		Self {
			include,
			exclude,
			satisfiable: true,
		}
	}

	pub fn build() -> QueryBuilder {
		QueryBuilder::default()
	}

	pub fn include(&self) -> Signature {
		self.include
	}

	pub fn exclude(&self) -> Signature {
		self.exclude
	}

	pub fn matches(&self, signature: Signature) -> bool {
		self.satisfiable && signature.contains_all(self.include) && !signature.intersects(self.exclude)
	}
}

impl Default for EntityQuery {
	fn default() -> Self {
		Self::new(Signature::EMPTY, Signature::EMPTY)
	}
}

/// A utility structure to build [EntityQueries](EntityQuery) from component types.
pub struct QueryBuilder<I: 'static + ComponentSet = (), E: 'static + ComponentSet = ()> {
	i_phantom: PhantomData<&'static I>,
	e_phantom: PhantomData<&'static E>,
}

impl Default for QueryBuilder {
	fn default() -> Self {
		Self {
			i_phantom: PhantomData,
			e_phantom: PhantomData,
		}
	}
}

impl<I: 'static + ComponentSet, E: 'static + ComponentSet> QueryBuilder<I, E> {
	/// Specify which types to include in the query.
	pub fn include<TI: 'static + ComponentSet>(self) -> QueryBuilder<TI, E> {
		QueryBuilder {
			i_phantom: PhantomData,
			e_phantom: PhantomData,
		}
	}

	/// Specify which types to exclude from the query.
	pub fn exclude<TE: 'static + ComponentSet>(self) -> QueryBuilder<I, TE> {
		QueryBuilder {
			i_phantom: PhantomData,
			e_phantom: PhantomData,
		}
	}

	/// Construct a query from the previously specified types.
	/// Including a type the registry has never seen yields a query that matches nothing.
	pub fn create(self, registry: &TypeRegistry) -> EntityQuery {
		let exclude = E::registered_signature(registry);
		match I::signature(registry) {
			Some(include) => EntityQuery::new(include, exclude),
			None => EntityQuery {
				include: Signature::EMPTY,
				exclude,
				satisfiable: false,
			},
		}
	}
}
