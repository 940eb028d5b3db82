use crate::components::{Component, TypeRegistry};
use crate::data_structures::Signature;

/// A tuple of [Component] types that can be resolved to a [Signature].
/// It provides a unified way to ask "does this entity carry all of these types".
pub trait ComponentSet {
	/// Resolve the set against `registry`.
	/// Returns `None` if any member is not registered, since no entity can carry it yet.
	fn signature(registry: &TypeRegistry) -> Option<Signature>;

	/// Resolve only the registered members of the set.
	fn registered_signature(registry: &TypeRegistry) -> Signature;
}

impl ComponentSet for () {
	fn signature(_registry: &TypeRegistry) -> Option<Signature> {
		Some(Signature::EMPTY)
	}

	fn registered_signature(_registry: &TypeRegistry) -> Signature {
		Signature::EMPTY
	}
}

macro_rules! impl_component_set {
    ($($t: ident),*) => {
        impl<$($t: Component),*> ComponentSet for ($($t,)*) {
            fn signature(registry: &TypeRegistry) -> Option<Signature> {
                let mut signature = Signature::EMPTY;
                $(signature.set(registry.id_of::<$t>()?, true);)*
                Some(signature)
            }

            fn registered_signature(registry: &TypeRegistry) -> Signature {
                let mut signature = Signature::EMPTY;
                $(if let Some(id) = registry.id_of::<$t>() {
                    signature.set(id, true);
                })*
                signature
            }
        }
    };
}

impl_component_set!(T0);
impl_component_set!(T0, T1);
impl_component_set!(T0, T1, T2);
impl_component_set!(T0, T1, T2, T3);
impl_component_set!(T0, T1, T2, T3, T4);
impl_component_set!(T0, T1, T2, T3, T4, T5);
impl_component_set!(T0, T1, T2, T3, T4, T5, T6);
impl_component_set!(T0, T1, T2, T3, T4, T5, T6, T7);
