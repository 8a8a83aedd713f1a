//! CPU raymarch kernel and software frame benchmarks.
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Mat4, UVec3, Vec3, Vec4};
use sdfview::camera::{CameraState, ProjectionKind};
use sdfview::composite::Texel;
use sdfview::frame::software::{Image, SoftwareFrame};
use sdfview::frame::Destination;
use sdfview::options::Options;
use sdfview::raymarch::kernel::{MarchContext, MarchParams, Ray};
use sdfview::volume::SdfGrid;

fn sphere_grid(resolution: u32) -> SdfGrid {
    let size = Vec3::splat(2.0);
    SdfGrid::from_distance_fn(
        UVec3::splat(resolution),
        size,
        size.length() * MarchParams::default().band_width_factor,
        |p| p.length() - 0.8,
    )
    .unwrap()
}

fn camera() -> CameraState {
    let world_to_view =
        Mat4::look_at_rh(Vec3::new(0.0, -4.0, 1.0), Vec3::ZERO, Vec3::Z);
    CameraState {
        projection: ProjectionKind::Perspective,
        view_to_world: world_to_view.inverse(),
        clip_from_view: Mat4::perspective_rh_gl(
            45f32.to_radians(),
            1.0,
            0.1,
            100.0,
        ),
    }
}

fn cast_ray_benchmark(c: &mut Criterion) {
    let grid = sphere_grid(64);
    let state = camera();
    let ctx = MarchContext::new(
        grid.resolution(),
        grid.size(),
        state.view_to_model(Mat4::IDENTITY),
        &MarchParams::default(),
    );
    let center = state.world_to_view().transform_point3(Vec3::ZERO);
    let ray = Ray {
        origin: Vec3::ZERO,
        dir: center.normalize(),
    };
    let max_dist = center.length() + 2.0;

    let _ = c.bench_function("cast_ray_center", |b| {
        b.iter(|| black_box(ctx.cast_ray(&grid, black_box(&ray), max_dist)));
    });
}

fn software_frame_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("software_frame");
    let _ = group.sample_size(10);

    for render_size in [64u32, 128] {
        let mut options = Options::default();
        options.volume.render_size = render_size;
        let viewport = (render_size, render_size);
        let mut frame = SoftwareFrame::new(sphere_grid(32), &options, viewport);
        let state = camera();
        let mut out = Image::new(1, 1, Texel::cleared(Vec4::ZERO));

        let _ = group.bench_function(format!("{render_size}px"), |b| {
            b.iter(|| {
                frame.render(
                    &state,
                    Mat4::IDENTITY,
                    Destination::External(&mut out),
                );
            });
        });
    }
    group.finish();
}

criterion_group!(benches, cast_ray_benchmark, software_frame_benchmark);
criterion_main!(benches);
