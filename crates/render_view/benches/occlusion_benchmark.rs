use criterion::{black_box, criterion_group, criterion_main, Criterion};
use render_view::math::{Aabb, Mat4, Vec3};
use render_view::occlusion::ViewVisibility;

fn occluder_grid(rows: u32, cols: u32) -> Vec<Aabb> {
    let mut boxes = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            #[allow(clippy::cast_precision_loss)]
            let x = col as f32 * 2.0 - cols as f32;
            #[allow(clippy::cast_precision_loss)]
            let y = row as f32 * 2.0 - rows as f32;
            boxes.push(Aabb::new(Vec3::new(x, y, -5.0), Vec3::new(x + 1.0, y + 1.0, -4.0)));
        }
    }
    boxes
}

fn rasterize_occluder_grid(c: &mut Criterion) {
    let view = Mat4::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
    let projection = Mat4::perspective(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.1, 1000.0);
    let view_projection = projection.mul(&view);
    let boxes = occluder_grid(8, 8);

    c.bench_function("rasterize 64 occluder boxes (768 triangles)", |b| {
        b.iter(|| {
            let mut visibility = ViewVisibility::new();
            for aabb in &boxes {
                for triangle in aabb.triangles() {
                    visibility.rasterize_occluder(&view_projection, triangle);
                }
            }
            black_box(&visibility);
        });
    });
}

fn query_against_occluder_grid(c: &mut Criterion) {
    let view = Mat4::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
    let projection = Mat4::perspective(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.1, 1000.0);
    let view_projection = projection.mul(&view);
    let occluders = occluder_grid(8, 8);
    let mut visibility = ViewVisibility::new();
    for aabb in &occluders {
        for triangle in aabb.triangles() {
            visibility.rasterize_occluder(&view_projection, triangle);
        }
    }
    let queries = occluder_grid(20, 20);

    c.bench_function("query 400 boxes against a rasterized occluder grid", |b| {
        b.iter(|| {
            for aabb in &queries {
                black_box(visibility.query(&view_projection, aabb));
            }
        });
    });
}

criterion_group!(benches, rasterize_occluder_grid, query_against_occluder_grid);
criterion_main!(benches);
