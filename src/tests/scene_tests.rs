use crate::components::{ComponentDescriptor, TypeRegistry};
use crate::tests::{Frozen, Health, Name, Position, Velocity};
use rand::{rngs::StdRng, Rng, SeedableRng};
use crate::entities::{EntityId, EntityQuery};
use crate::data_structures::Signature;
use crate::config::SceneConfig;
use crate::scene::Scene;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
pub fn typed_components_round_trip_through_the_scene() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();

	scene.insert(entity, Position { x: 1.0, y: 2.0 });
	scene.add::<Velocity>(entity).x = 3.0;

	assert_eq!(scene.get::<Position>(entity), Some(&Position { x: 1.0, y: 2.0 }));
	assert_eq!(scene.get::<Velocity>(entity).map(|v| v.x), Some(3.0));
	assert!(scene.has_all_of::<(Position, Velocity)>(entity));
	assert!(!scene.has_all_of::<(Position, Health)>(entity));

	assert!(scene.remove::<Position>(entity));
	assert!(!scene.remove::<Position>(entity));
	assert!(!scene.has::<Position>(entity));
	assert!(scene.has::<Velocity>(entity));
}

#[test]
pub fn signature_tracks_attached_components() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();
	assert_eq!(scene.signature(entity), Some(Signature::EMPTY));

	scene.add::<Frozen>(entity);
	scene.add::<Health>(entity);
	let frozen = scene.component_id::<Frozen>().unwrap();
	let health = scene.component_id::<Health>().unwrap();

	assert_eq!(scene.signature(entity), Some(Signature::EMPTY.with(frozen).with(health)));
	assert!(scene.has_all(entity, Signature::EMPTY.with(frozen)));

	scene.remove_component(frozen, entity);
	assert_eq!(scene.signature(entity), Some(Signature::EMPTY.with(health)));
	assert_eq!(scene.signature(EntityId::new(99)), None);
}

#[test]
pub fn removing_an_entity_detaches_everything() {
	let mut scene = Scene::new();
	let keep = scene.add_entity();
	let doomed = scene.add_entity();
	scene.insert(keep, Health(1));
	scene.insert(doomed, Health(2));
	scene.insert(doomed, Name("doomed".into()));

	assert!(scene.remove_entity(doomed));
	assert!(!scene.remove_entity(doomed));
	assert!(!scene.is_alive(doomed));
	assert!(!scene.has::<Health>(doomed));
	assert!(!scene.has::<Name>(doomed));
	assert_eq!(scene.get::<Health>(keep), Some(&Health(1)));
	assert_eq!(scene.entity_count(), 1);
	assert_eq!(scene.entities(), &[keep]);

	let name = scene.component_id::<Name>().unwrap();
	assert!(scene.pool(name).unwrap().is_empty());
}

#[test]
#[should_panic(expected = "not alive")]
pub fn adding_to_a_dead_entity_panics() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();
	scene.remove_entity(entity);
	scene.add::<Health>(entity);
}

#[test]
#[should_panic(expected = "already has")]
pub fn adding_twice_without_deferral_panics() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();
	scene.add::<Health>(entity);
	scene.add::<Health>(entity);
}

#[test]
#[should_panic(expected = "is not registered")]
pub fn unknown_component_ids_panic_on_add() {
	let registry = Arc::new(TypeRegistry::new());
	let other = TypeRegistry::new();
	other.register::<Health>().unwrap();
	let health = other.id_of::<Health>().unwrap();

	let mut scene = Scene::with_registry(registry, SceneConfig::default());
	let entity = scene.add_entity();
	scene.add_component(health, entity);
}

#[test]
pub fn type_erased_components_are_plain_bytes() {
	let registry = Arc::new(TypeRegistry::new());
	let blob = registry.register_descriptor(ComponentDescriptor::zeroed("blob", 16, 8).unwrap()).unwrap();
	let mut scene = Scene::with_registry(registry, SceneConfig::default());
	let entity = scene.add_entity();

	let ptr = scene.add_component(blob, entity);
	assert_eq!(ptr.as_ptr() as usize % 8, 0);

	let bytes = scene.get_bytes_mut(blob, entity).unwrap();
	assert_eq!(bytes.len(), 16);
	assert!(bytes.iter().all(|byte| *byte == 0));
	bytes[0] = 7;

	assert_eq!(scene.get_bytes(blob, entity).map(|bytes| bytes[0]), Some(7));
	assert_eq!(scene.get_component(blob, entity).map(|ptr| unsafe { *ptr.as_ptr() }), Some(7));
	assert!(scene.has_component(blob, entity));
	assert!(scene.get::<Health>(entity).is_none());
	assert!(scene.remove_component(blob, entity));
	assert!(scene.get_component(blob, entity).is_none());
}

#[test]
pub fn typed_components_are_reached_through_pointers() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();
	let name = scene.register::<Name>().unwrap();

	let ptr = scene.add_component(name, entity);
	unsafe { ptr.cast::<Name>().as_ptr().as_mut().unwrap().0.push_str("erased") };

	let read = scene.get_component(name, entity).unwrap();
	assert_eq!(unsafe { &read.cast::<Name>().as_ref().0 }, "erased");
	assert_eq!(scene.get::<Name>(entity).unwrap().0, "erased");
	assert!(scene.remove::<Name>(entity));
}

#[test]
#[should_panic(expected = "not plain bytes")]
pub fn typed_components_are_not_exposed_as_bytes() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();
	scene.insert(entity, Name("x".into()));

	let name = scene.component_id::<Name>().unwrap();
	scene.get_bytes_mut(name, entity);
}

#[test]
pub fn queries_filter_by_include_and_exclude() {
	let mut scene = Scene::new();
	let moving = scene.add_entity();
	let frozen = scene.add_entity();
	let idle = scene.add_entity();

	for entity in [moving, frozen, idle] {
		scene.add::<Position>(entity);
	}
	scene.add::<Velocity>(moving);
	scene.add::<Velocity>(frozen);
	scene.add::<Frozen>(frozen);

	let query = EntityQuery::build().include::<(Position, Velocity)>().exclude::<(Frozen,)>().create(scene.registry());
	assert_eq!(scene.query(&query), vec![moving]);

	let everything = EntityQuery::default();
	assert_eq!(scene.query(&everything).len(), 3);

	let impossible = EntityQuery::build().include::<(Position, Unregistered)>().create(scene.registry());
	assert!(scene.query(&impossible).is_empty());
	assert!(!impossible.matches(Signature::from_bits(u64::MAX)));
}

#[derive(crate::components::Component, Clone, Default)]
struct Unregistered;

#[test]
pub fn iteration_defers_structural_changes() {
	let mut scene = Scene::new();
	let entities: Vec<_> = (0..4).map(|_| scene.add_entity()).collect();

	let mut visited = 0;
	scene.for_each_entity(|scene, entity| {
		visited += 1;
		scene.insert(entity, Health(entity.raw()));
		assert!(!scene.has::<Health>(entity));
		if entity == entities[0] {
			scene.remove_entity(entities[1]);
		}
	});

	assert_eq!(visited, 3);
	assert!(!scene.is_deferred());
	scene.update();

	assert!(scene.has::<Health>(entities[0]));
	assert!(!scene.is_alive(entities[1]));
	assert_eq!(scene.get::<Health>(entities[3]), Some(&Health(3)));
}

#[test]
pub fn copy_is_deep_and_isolated() {
	let mut source = Scene::new();
	let entity = source.add_entity();
	source.insert(entity, Name("alpha".into()));
	source.insert(entity, Health(5));

	let mut copy = Scene::new();
	let stale = copy.add_entity();
	copy.add_entity();
	copy.insert(stale, Position::default());
	copy.copy_from(&source);

	assert_eq!(copy.entity_count(), 1);
	assert!(!copy.has::<Position>(stale));
	copy.get_mut::<Name>(entity).unwrap().0.push_str("-copy");
	copy.get_mut::<Health>(entity).unwrap().0 = 9;

	assert_eq!(source.get::<Name>(entity).unwrap().0, "alpha");
	assert_eq!(copy.get::<Name>(entity).unwrap().0, "alpha-copy");
	assert_eq!(source.get::<Health>(entity), Some(&Health(5)));

	let next = copy.add_entity();
	assert_eq!(next, source.add_entity());
}

#[test]
pub fn copy_discards_pending_operations() {
	let mut source = Scene::new();
	let entity = source.add_entity();

	let mut copy = Scene::new();
	let other = copy.add_entity();
	copy.deferred(|scene| {
		scene.add::<Health>(other);
	});
	assert_eq!(copy.pending().len(), 1);

	copy.copy_from(&source);
	assert!(copy.pending().is_empty());
	copy.update();
	assert!(!copy.has::<Health>(entity));
}

#[test]
pub fn swap_keeps_scene_identity() {
	let mut left = Scene::new();
	let mut right = Scene::new();
	let a = left.add_entity();
	left.insert(a, Health(1));
	right.add_entity();
	let b = right.add_entity();
	right.insert(b, Health(2));

	let log = Arc::new(Mutex::new(Vec::new()));
	let sink = log.clone();
	left.signals_mut().on_entity_created(move |_, entity| sink.lock().push(entity));

	let address = &left as *const Scene;
	left.swap(&mut right);
	assert_eq!(address, &left as *const Scene);

	assert_eq!(left.entity_count(), 2);
	assert_eq!(right.entity_count(), 1);
	assert_eq!(left.get::<Health>(b), Some(&Health(2)));
	assert_eq!(right.get::<Health>(a), Some(&Health(1)));

	let created = left.add_entity();
	right.add_entity();
	assert_eq!(*log.lock(), vec![created]);
}

#[test]
pub fn clear_empties_the_scene() {
	let mut scene = Scene::new();
	let entity = scene.add_entity();
	scene.insert(entity, Name("gone".into()));
	scene.deferred(|scene| {
		scene.add::<Health>(entity);
	});

	scene.clear();
	assert_eq!(scene.entity_count(), 0);
	assert!(scene.pending().is_empty());
	assert_eq!(scene.allocator().high_water_mark(), 0);
	assert_eq!(scene.pools().count(), 0);
	assert_eq!(scene.add_entity(), EntityId::new(0));
}

#[test]
pub fn entity_hooks_see_live_components() {
	let mut scene = Scene::new();
	let log = Arc::new(Mutex::new(Vec::new()));

	let sink = log.clone();
	scene.signals_mut().on_entity_removing(move |scene, entity| {
		sink.lock().push(format!("removing {} health={}", entity, scene.has::<Health>(entity)));
	});
	let sink = log.clone();
	scene
		.on_component_shutdown::<Health>(move |scene, entity, _| {
			sink.lock().push(format!("shutdown {} alive={}", entity, scene.is_alive(entity)));
		})
		.unwrap();

	let entity = scene.add_entity();
	scene.insert(entity, Health(1));
	scene.remove_entity(entity);

	assert_eq!(*log.lock(), vec!["removing Entity(0) health=true".to_owned()]);
}

#[test]
pub fn immediate_hooks_fire_around_attach_and_detach() {
	let mut scene = Scene::new();
	let log = Arc::new(Mutex::new(Vec::new()));

	let sink = log.clone();
	scene
		.on_component_init::<Health>(move |scene, entity, _| {
			sink.lock().push(format!("init {}", scene.get::<Health>(entity).unwrap().0));
		})
		.unwrap();
	let sink = log.clone();
	scene
		.on_component_shutdown::<Health>(move |scene, entity, _| {
			sink.lock().push(format!("shutdown {}", scene.get::<Health>(entity).unwrap().0));
		})
		.unwrap();

	let entity = scene.add_entity();
	scene.insert(entity, Health(12));
	scene.get_mut::<Health>(entity).unwrap().0 = 13;
	scene.remove::<Health>(entity);

	assert_eq!(*log.lock(), vec!["init 12".to_owned(), "shutdown 13".to_owned()]);
}

#[test]
pub fn undeferred_notifications_apply_changes_at_once() {
	let mut scene = Scene::with_config(SceneConfig::new().with_defer_notifications(false));
	scene.signals_mut().on_entity_created(|scene, entity| {
		scene.insert(entity, Health(100));
	});

	let entity = scene.add_entity();
	assert_eq!(scene.get::<Health>(entity), Some(&Health(100)));
	assert!(scene.pending().is_empty());
}

#[test]
pub fn parallel_update_through_the_scene() {
	let mut scene = Scene::with_config(SceneConfig::new().with_component_capacity(256));
	let entities: Vec<_> = (0..256).map(|_| scene.add_entity()).collect();
	for entity in &entities {
		scene.insert(*entity, Velocity { x: 1.0, y: 2.0 });
	}

	scene.par_for_each_mut(|_, velocity: &mut Velocity| velocity.x *= 4.0).unwrap();
	assert!(entities.iter().all(|entity| scene.get::<Velocity>(*entity).unwrap().x == 4.0));

	let registry = Arc::new(TypeRegistry::new());
	let mut empty = Scene::with_registry(registry, SceneConfig::default());
	assert!(empty.par_for_each_mut(|_, _: &mut Velocity| unreachable!()).is_ok());
}

#[test]
pub fn signatures_agree_with_pools_after_random_ticks() {
	let mut rng = StdRng::seed_from_u64(7);
	let mut scene = Scene::new();
	let mut live: Vec<EntityId> = Vec::new();

	for _ in 0..64 {
		let deferred = rng.gen_bool(0.5);
		if deferred {
			scene.begin_deferred();
		}

		for _ in 0..32 {
			match rng.gen_range(0..10) {
				0 | 1 => live.push(scene.add_entity()),
				2 if !live.is_empty() => {
					let entity = live.swap_remove(rng.gen_range(0..live.len()));
					scene.remove_entity(entity);
				},
				3..=6 if !live.is_empty() => {
					let entity = live[rng.gen_range(0..live.len())];
					match rng.gen_range(0..3) {
						0 if deferred || !scene.has::<Health>(entity) => {
							scene.insert(entity, Health(1));
						},
						1 if deferred || !scene.has::<Position>(entity) => {
							scene.add::<Position>(entity);
						},
						_ if deferred || !scene.has::<Frozen>(entity) => {
							scene.add::<Frozen>(entity);
						},
						_ => {},
					}
				},
				_ if !live.is_empty() => {
					let entity = live[rng.gen_range(0..live.len())];
					match rng.gen_range(0..3) {
						0 => scene.remove::<Health>(entity),
						1 => scene.remove::<Position>(entity),
						_ => scene.remove::<Frozen>(entity),
					};
				},
				_ => {},
			}
		}

		if deferred {
			scene.end_deferred();
		}
		scene.update();
		assert!(scene.pending().is_empty());

		for entity in scene.entities() {
			let signature = scene.signature(*entity).unwrap();
			for (component, pool) in scene.pools() {
				assert_eq!(signature.get(component), pool.has(*entity));
			}
		}
		assert_eq!(scene.entity_count(), live.len());
	}
}

#[test]
#[should_panic(expected = "removed by its own init notification")]
pub fn init_hook_removing_its_component_panics_without_deferral() {
	let mut scene = Scene::with_config(SceneConfig::new().with_defer_notifications(false));
	scene
		.on_component_init::<Health>(|scene, entity, _| {
			scene.remove::<Health>(entity);
		})
		.unwrap();

	let entity = scene.add_entity();
	scene.add::<Health>(entity);
}

#[test]
pub fn shared_pool_access_keeps_signatures_in_step() {
	let mut scene = Scene::new();
	let entities: Vec<_> = (0..8).map(|_| scene.add_entity()).collect();
	for entity in &entities[..4] {
		scene.insert(*entity, Health(1));
	}

	let health = scene.component_id::<Health>().unwrap();
	scene.pool(health).unwrap().lock();
	scene.insert(entities[5], Health(2));
	scene.remove::<Health>(entities[0]);
	scene.pool(health).unwrap().unlock();
	scene.par_for_each_mut(|_, health: &mut Health| health.0 += 1).unwrap();
	scene.update();

	for entity in &entities {
		let bit = scene.signature(*entity).unwrap().get(health);
		assert_eq!(bit, scene.pool(health).unwrap().has(*entity));
	}
	assert!(!scene.pool(health).unwrap().is_locked());
	assert_eq!(scene.get::<Health>(entities[5]), Some(&Health(3)));
}
