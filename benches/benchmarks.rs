use criterion::*;
use nalgebra_glm::{Mat4, Vec3};
use scene_ecs::prelude::*;

const COUNT: usize = 10000;

#[derive(Default, Clone, Component)]
struct Transform(Mat4);

#[derive(Default, Clone, Component)]
struct Translation(Vec3);

#[derive(Default, Clone, Component)]
struct Rotation(Vec3);

#[derive(Default, Clone, Component)]
struct Velocity(Vec3);

fn populate(scene: &mut Scene) -> Vec<EntityId> {
    (0..COUNT)
        .map(|i| {
            let entity = scene.add_entity();
            scene.add::<Transform>(entity);
            scene.add::<Translation>(entity);
            scene.insert(entity, Rotation(Vec3::new(0.0, i as f32 * 0.001, 0.0)));
            scene.insert(entity, Velocity(Vec3::new(1.0, 0.0, 0.5)));
            entity
        })
        .collect()
}

fn create_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("Create entities");
    group.bench_function("Immediate", |b| {
        b.iter_batched(
            || Scene::with_config(SceneConfig::new().with_entity_capacity(COUNT).with_component_capacity(COUNT)),
            |mut scene| populate(&mut scene),
            BatchSize::PerIteration,
        );
    });

    group.bench_function("Deferred", |b| {
        b.iter_batched(
            Scene::new,
            |mut scene| {
                scene.deferred(|scene| populate(scene));
                scene.update();
                scene
            },
            BatchSize::PerIteration,
        );
    });
}

fn destroy_entities(c: &mut Criterion) {
    c.bench_function("Destroy entities", |b| {
        b.iter_batched(
            || {
                let mut scene = Scene::new();
                let entities = populate(&mut scene);
                (scene, entities)
            },
            |(mut scene, entities)| {
                for entity in entities {
                    scene.remove_entity(entity);
                }
                scene
            },
            BatchSize::PerIteration,
        );
    });
}

fn iterate_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("Iterate entities");
    group.bench_function("Single-threaded", |b| {
        let mut scene = Scene::new();
        populate(&mut scene);
        let query = EntityQuery::build()
            .include::<(Transform, Translation, Rotation, Velocity)>()
            .create(scene.registry());

        b.iter(|| {
            scene.for_each_matching(&query, |scene, entity| {
                let v = scene.get::<Velocity>(entity).unwrap().0;
                let r = scene.get::<Rotation>(entity).unwrap().0;
                let t = scene.get_mut::<Translation>(entity).unwrap();
                t.0 += v;
                let m = Mat4::new_translation(&t.0) * Mat4::new_rotation(r);
                scene.get_mut::<Transform>(entity).unwrap().0 = m;
            })
        });
    });

    group.bench_function("Multi-threaded", |b| {
        let mut scene = Scene::new();
        populate(&mut scene);

        b.iter(|| {
            scene
                .par_for_each_mut(|_, t: &mut Translation| t.0 += Vec3::new(1.0, 0.0, 0.5))
                .unwrap()
        });
    });
}

fn copy_scene(c: &mut Criterion) {
    let mut source = Scene::new();
    populate(&mut source);

    c.bench_function("Copy scene", |b| {
        let mut target = Scene::new();
        b.iter(|| target.copy_from(&source));
    });
}

criterion_group!(
    benchmarks,
    create_entities,
    destroy_entities,
    iterate_entities,
    copy_scene,
);
criterion_main!(benchmarks);
