use criterion::{black_box, criterion_group, criterion_main, Criterion};
use render_core::ecs::{Component, EntityStore};

#[derive(Clone, Copy)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Position {
    const NAME: &'static str = "Position";
}

#[derive(Clone, Copy)]
#[repr(C)]
struct Velocity {
    dx: f32,
    dy: f32,
    dz: f32,
}
impl Component for Velocity {
    const NAME: &'static str = "Velocity";
}

fn spawn_10k(c: &mut Criterion) {
    c.bench_function("spawn 10k entities into a two-component prototype", |b| {
        b.iter(|| {
            let mut store = EntityStore::new(1);
            let pos = store.register_component::<Position>().unwrap();
            let vel = store.register_component::<Velocity>().unwrap();
            let proto = store.ensure_prototype(&[pos, vel]).unwrap();
            for _ in 0..10_000 {
                black_box(store.spawn(proto));
            }
        });
    });
}

fn spawn_then_destroy_half(c: &mut Criterion) {
    c.bench_function("spawn 10k, destroy every other entity", |b| {
        b.iter(|| {
            let mut store = EntityStore::new(7);
            let pos = store.register_component::<Position>().unwrap();
            let proto = store.ensure_prototype(&[pos]).unwrap();
            let ids: Vec<_> = (0..10_000).map(|_| store.spawn(proto)).collect();
            for id in ids.into_iter().step_by(2) {
                black_box(store.destroy(id));
            }
        });
    });
}

criterion_group!(benches, spawn_10k, spawn_then_destroy_half);
criterion_main!(benches);
