//! Benchmarks for the CPU side of a frame.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;

use particleflow::{hue_interpolate, FlowConfig, HueDirection, ParticleFlow, Simulation, SpeedGradient, TouchSample, Viewport};

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for count in [10_000u32, 50_000, 200_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let config = FlowConfig::default().with_particle_count(count).with_seed(1);
            let mut flow = ParticleFlow::new(config).unwrap();
            flow.resize(1280, 720).unwrap();
            b.iter(|| black_box(flow.step()))
        });
    }

    group.finish();
}

fn bench_step_with_touches(c: &mut Criterion) {
    let config = FlowConfig::default()
        .with_particle_count(50_000)
        .with_attraction_points(16)
        .with_seed(1);
    let mut flow = ParticleFlow::new(config).unwrap();
    flow.resize(1280, 720).unwrap();
    let samples: Vec<TouchSample> = (0..16)
        .map(|i| TouchSample::new(i, 80.0 * i as f32, 45.0 * i as f32))
        .collect();

    c.bench_function("step_16_points_touched", |b| {
        b.iter(|| {
            flow.on_touch(&samples);
            black_box(flow.step())
        })
    });
}

fn bench_init(c: &mut Criterion) {
    let config = FlowConfig::default().with_seed(1);
    let mut simulation = Simulation::new(&config, Viewport::new(1280, 720));
    c.bench_function("init_particles_50k", |b| b.iter(|| simulation.init_particles()));
}

fn bench_color(c: &mut Criterion) {
    let gradient = SpeedGradient::new(
        FlowConfig::default().slow_color,
        FlowConfig::default().fast_color,
        HueDirection::Clockwise,
    );
    c.bench_function("color_for", |b| {
        b.iter(|| black_box(gradient.color_for(black_box(Vec2::new(3.0, -4.0)))))
    });
    c.bench_function("hue_interpolate", |b| {
        b.iter(|| black_box(hue_interpolate(black_box(0.3), 10.0, 350.0, HueDirection::Clockwise)))
    });
}

criterion_group!(benches, bench_step, bench_step_with_touches, bench_init, bench_color);
criterion_main!(benches);
