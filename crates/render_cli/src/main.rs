//! Smoke-test binary for the render core.
//!
//! Three subcommands exercise one crate each, end to end, against synthetic
//! data — there is no asset pipeline or window here, only enough wiring to
//! prove the archetype store, the command buffer, and the render-view
//! pipeline all still fit together:
//!
//! - `bench-entities` stresses [`render_core::ecs::EntityStore`] with a
//!   spawn/destroy churn loop.
//! - `bench-cmdbuf` records a synthetic [`render_gpu::CommandBuffer`],
//!   executes it against a [`render_gpu::RecordingSink`], and prints the
//!   decoded call log.
//! - `run-frame` builds a toy scene, runs one [`render_view::RenderView`]
//!   pipeline end to end, and prints extraction/recording stats.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use render_core::ecs::{Component, EntityStore};
use render_core::memory::MemoryPool;
use render_gpu::{CommandBuffer, Primitive, RecordingSink};
use render_view::scene::{Material, Mesh, SceneComponentIds, Transform, Visibility};
use render_view::{RenderKind, RenderView, Renderer, RendererConfig, Scene, ViewKind, WorkerPool};
use render_view::math::{Aabb, Mat4, Vec3};

#[derive(Parser)]
#[command(name = "render_cli", about = "Smoke-test harness for the render core", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Spawn and destroy a large number of entities, reporting throughput.
    BenchEntities {
        /// Number of entities to spawn before the churn phase.
        #[arg(long, default_value_t = 100_000)]
        entities: usize,
        /// Number of spawn/destroy churn iterations after the initial fill.
        #[arg(long, default_value_t = 50_000)]
        churn: usize,
        /// RNG seed driving which live entity gets destroyed each churn step.
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Record a synthetic command buffer and print its decoded op log.
    BenchCmdbuf {
        /// Number of draw calls to record between a begin/end pair.
        #[arg(long, default_value_t = 256)]
        draws: u32,
    },
    /// Build a toy scene and run one render-view frame against a recording sink.
    RunFrame {
        /// Number of mesh entities to populate the scene with.
        #[arg(long, default_value_t = 1_000)]
        meshes: usize,
        /// Number of light entities to populate the scene with.
        #[arg(long, default_value_t = 4)]
        lights: usize,
        /// Worker pool thread count.
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// RNG seed driving synthetic mesh placement.
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::BenchEntities { entities, churn, seed } => bench_entities(entities, churn, seed),
        Command::BenchCmdbuf { draws } => bench_cmdbuf(draws),
        Command::RunFrame { meshes, lights, workers, seed } => run_frame(meshes, lights, workers, seed),
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

impl Component for Position {
    const NAME: &'static str = "Position";
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct Velocity {
    dx: f32,
    dy: f32,
    dz: f32,
}

impl Component for Velocity {
    const NAME: &'static str = "Velocity";
}

fn bench_entities(entities: usize, churn: usize, seed: u64) {
    let mut store = EntityStore::new(seed as u32 | 1);
    let position = store.register_component::<Position>().expect("component registration");
    let velocity = store.register_component::<Velocity>().expect("component registration");
    let proto = store
        .ensure_prototype(&[position, velocity])
        .expect("prototype creation");

    let fill_start = Instant::now();
    let mut live: Vec<_> = (0..entities).map(|_| store.spawn(proto)).collect();
    let fill_elapsed = fill_start.elapsed();
    println!(
        "spawned {} entities in {:.3}ms ({:.0} entities/ms)",
        entities,
        fill_elapsed.as_secs_f64() * 1000.0,
        entities as f64 / (fill_elapsed.as_secs_f64() * 1000.0).max(1e-6)
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let churn_start = Instant::now();
    for _ in 0..churn {
        let index = rng.gen_range(0..live.len());
        let id = live.swap_remove(index);
        store.destroy(id);
        live.push(store.spawn(proto));
    }
    let churn_elapsed = churn_start.elapsed();
    println!(
        "churned {} spawn/destroy pairs in {:.3}ms ({:.0} pairs/ms)",
        churn,
        churn_elapsed.as_secs_f64() * 1000.0,
        churn as f64 / (churn_elapsed.as_secs_f64() * 1000.0).max(1e-6)
    );
    println!("live entity count after churn: {}", store.entity_count());
    assert_eq!(store.entity_count(), entities, "churn must not leak or duplicate entities");
}

fn bench_cmdbuf(draws: u32) {
    let mut command = CommandBuffer::new();
    command.begin_render_pass(1).expect("operand fits 24 bits");
    command.use_program(2).expect("operand fits 24 bits");
    for i in 0..draws {
        command
            .draw(i % 64, Primitive::Triangles, 3 * (i % 4096))
            .expect("operand fits 24 bits");
    }
    command.fence_sync(render_core::sync::FenceId::from_raw(1)).expect("operand fits 24 bits");
    command.end().expect("buffer not already ended");

    println!("recorded {} words for {draws} draw calls", command.word_count());

    let pool = MemoryPool::new(0);
    let mut sink = RecordingSink::new(None);
    command.execute(&mut sink, &pool);
    println!("executed {} decoded calls:", sink.calls.len());
    for call in sink.calls.iter().take(10) {
        println!("  {call}");
    }
    if sink.calls.len() > 10 {
        println!("  ... and {} more", sink.calls.len() - 10);
    }
}

fn run_frame(mesh_count: usize, light_count: usize, workers: usize, seed: u64) {
    let mut store = EntityStore::new(seed as u32 | 1);
    let ids = SceneComponentIds::register(&mut store).expect("scene component registration");
    let mesh_proto = store
        .ensure_prototype(&[ids.transform, ids.mesh, ids.material, ids.visibility])
        .expect("mesh prototype creation");
    let light_proto = store
        .ensure_prototype(&[ids.transform, ids.light])
        .expect("light prototype creation");

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..mesh_count {
        store.spawn(mesh_proto);
    }
    {
        let prototype = store.prototype(mesh_proto).prototype().clone();
        for chunk in store.prototype_mut(mesh_proto).chunks_mut() {
            let transforms = chunk.component_slice_mut::<Transform>(&prototype, ids.transform);
            for t in transforms.iter_mut() {
                let x = rng.gen_range(-50.0..50.0);
                let y = rng.gen_range(-50.0..50.0);
                let z = rng.gen_range(-50.0..50.0);
                *t = Transform::from_translation(Vec3::new(x, y, z));
            }
            let meshes = chunk.component_slice_mut::<Mesh>(&prototype, ids.mesh);
            for m in meshes.iter_mut() {
                *m = Mesh::single(Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)), 1, 36);
            }
            let materials = chunk.component_slice_mut::<Material>(&prototype, ids.material);
            for mat in materials.iter_mut() {
                *mat = Material::default();
            }
            let visibility = chunk.component_slice_mut::<Visibility>(&prototype, ids.visibility);
            for v in visibility.iter_mut() {
                *v = Visibility;
            }
        }
    }

    for _ in 0..light_count {
        store.spawn(light_proto);
    }
    {
        use render_view::scene::Light;
        let prototype = store.prototype(light_proto).prototype().clone();
        for chunk in store.prototype_mut(light_proto).chunks_mut() {
            let transforms = chunk.component_slice_mut::<Transform>(&prototype, ids.transform);
            for t in transforms.iter_mut() {
                *t = Transform::identity();
            }
            let lights = chunk.component_slice_mut::<Light>(&prototype, ids.light);
            for l in lights.iter_mut() {
                *l = Light::Sphere {
                    color: Vec3::new(1.0, 1.0, 1.0),
                    radius: 10.0,
                };
            }
        }
    }

    let scene = Scene::new(Arc::new(store), ids);
    let renderer = Arc::new(Renderer::new());
    let config = RendererConfig::default();
    let pool = WorkerPool::new(workers);

    let eye = Vec3::new(0.0, 0.0, 100.0);
    let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
    let projection = Mat4::perspective(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.1, 1000.0);
    let mut camera = RenderView::new(ViewKind::Camera, RenderKind::Forward, 1920, 1080, 1, view, projection, eye);

    let frame_start = Instant::now();
    camera.init(&renderer, &config, "run-frame");
    let extract_job = camera.extract(&scene, &pool);
    let extraction = pool.wait(extract_job);
    let objects = camera.finish_extraction(extraction);
    let object_count = objects.len();

    let render_job = camera.render(Arc::clone(&renderer), config, objects, &pool);
    let command = pool.wait(render_job);
    let frame_elapsed = frame_start.elapsed();

    let scratch = MemoryPool::new(0);
    let mut sink = RecordingSink::new(None);
    command.execute(&mut sink, &scratch);
    camera.release(&renderer);

    println!("scene: {mesh_count} meshes, {light_count} lights");
    println!("extracted {object_count} objects in a frame that took {:.3}ms", frame_elapsed.as_secs_f64() * 1000.0);
    println!("recorded {} words, {} decoded GL calls", command.word_count(), sink.calls.len());
    let draw_calls = sink.calls.iter().filter(|c| c.starts_with("draw")).count();
    println!("draw calls dispatched after culling: {draw_calls}");
}
