//! Integration tests for the particle flow.
//!
//! These drive the public API the way the render loop does and check the
//! behavior visible from outside: buffer sizes, reinitialization policy,
//! attraction point debouncing and the speed-to-color mapping.

use glam::Vec2;
use particleflow::tracker::{is_active, INACTIVE};
use particleflow::{
    gradient_preview, hue_interpolate, speed_coefficient, AttractionTracker, Color, ConfigError,
    FlowConfig, HueDirection, ParticleFlow, Resize, Simulation, SpeedGradient, TouchSample, Viewport,
};

fn flow(config: FlowConfig, width: u32, height: u32) -> ParticleFlow {
    let mut flow = ParticleFlow::new(config).unwrap();
    flow.resize(width, height).unwrap();
    flow
}

// ============================================================================
// Buffers and reinitialization
// ============================================================================

#[test]
fn test_buffer_lengths_follow_config() {
    for (count, points) in [(1, 1), (4, 16), (10_000, 5), (123_457, 7)] {
        let config = FlowConfig::default()
            .with_particle_count(count)
            .with_attraction_points(points)
            .with_seed(11);
        let flow = flow(config, 640, 480);
        let simulation = flow.simulation().unwrap();
        assert_eq!(simulation.positions().len(), count as usize);
        assert_eq!(simulation.velocities().len(), count as usize);
        assert_eq!(simulation.colors().len(), count as usize);
        assert_eq!(simulation.attraction_points().len(), points as usize);
    }
}

#[test]
fn test_same_size_resize_keeps_positions() {
    let mut flow = flow(FlowConfig::default().with_particle_count(500).with_seed(2), 300, 200);
    for _ in 0..10 {
        flow.step();
    }
    let before = flow.simulation().unwrap().positions().to_vec();
    let steps = flow.simulation().unwrap().steps();

    assert_eq!(flow.resize(300, 200).unwrap(), Resize::Unchanged);
    assert_eq!(flow.simulation().unwrap().positions(), &before[..]);
    assert_eq!(flow.simulation().unwrap().steps(), steps);
}

#[test]
fn test_new_size_reinitializes() {
    let mut flow = flow(FlowConfig::default().with_particle_count(500).with_seed(2), 300, 200);
    for _ in 0..10 {
        flow.step();
    }
    assert_eq!(flow.resize(200, 300).unwrap(), Resize::Reinitialized);

    let simulation = flow.simulation().unwrap();
    assert_eq!(simulation.viewport(), Viewport::new(200, 300));
    assert_eq!(simulation.steps(), 0);
    assert!(simulation.velocities().iter().all(|v| *v == Vec2::ZERO));

    // Attraction points are back on the ring for the new size.
    let center = Vec2::new(100.0, 150.0);
    for p in simulation.attraction_points() {
        assert!(((*p - center).length() - 200.0 / 3.0).abs() < 1e-3);
    }
}

#[test]
fn test_particle_count_change_reallocates() {
    let mut flow = flow(FlowConfig::default().with_particle_count(1000).with_seed(5), 400, 400);
    for _ in 0..20 {
        flow.step();
    }

    let config = flow.config().clone().with_particle_count(250);
    flow.apply_config(config).unwrap();

    let simulation = flow.simulation().unwrap();
    assert_eq!(simulation.particle_count(), 250);
    assert_eq!(simulation.steps(), 0);
    assert!(simulation.velocities().iter().all(|v| *v == Vec2::ZERO));
    let viewport = simulation.viewport();
    let radius = viewport.diagonal() / 2.0;
    for p in simulation.positions() {
        assert!((*p - viewport.center()).length() <= radius + 1e-3);
    }
}

#[test]
fn test_rejected_config_changes_nothing() {
    let mut flow = flow(FlowConfig::default().with_particle_count(100).with_seed(5), 400, 400);
    flow.step();
    let before = flow.simulation().unwrap().positions().to_vec();

    let err = flow
        .apply_config(FlowConfig::default().with_attraction_coefficient(5000))
        .unwrap_err();
    assert!(matches!(err, ConfigError::AttractionCoefficient { value: 5000, .. }));
    assert_eq!(flow.config().particle_count, 100);
    assert_eq!(flow.simulation().unwrap().positions(), &before[..]);
}

#[test]
fn test_paused_flow_keeps_buffers() {
    let mut flow = flow(FlowConfig::default().with_particle_count(100).with_seed(5), 400, 400);
    flow.step();
    let before = flow.simulation().unwrap().positions().to_vec();
    flow.pause();
    assert!(!flow.step());
    assert_eq!(flow.resize(400, 400).unwrap(), Resize::Unchanged);
    flow.resume();
    assert_eq!(flow.simulation().unwrap().positions(), &before[..]);
}

// ============================================================================
// Physics
// ============================================================================

#[test]
fn test_zero_attraction_decays_monotonically() {
    let config = FlowConfig::default()
        .with_particle_count(64)
        .with_attraction_coefficient(0)
        .with_drag_coefficient(10)
        .with_seed(9);
    let mut flow = flow(config, 200, 200);

    let simulation = flow.simulation_mut().unwrap();
    for (i, v) in simulation.velocities_mut().iter_mut().enumerate() {
        *v = Vec2::new(i as f32 - 32.0, 3.0);
    }

    let mut previous: Vec<f32> = flow.simulation().unwrap().velocities().iter().map(|v| v.length()).collect();
    for _ in 0..50 {
        flow.step();
        let speeds: Vec<f32> = flow.simulation().unwrap().velocities().iter().map(|v| v.length()).collect();
        for (now, before) in speeds.iter().zip(&previous) {
            assert!(now <= before);
        }
        previous = speeds;
    }
    assert!(previous.iter().all(|s| *s < 1.0));
}

#[test]
fn test_single_point_pulls_every_particle() {
    let config = FlowConfig::default()
        .with_particle_count(4)
        .with_attraction_points(1)
        .with_attraction_coefficient(100)
        .with_drag_coefficient(0)
        .with_seed(1);
    let mut simulation = Simulation::new(&config, Viewport::new(100, 100));

    let start = [
        Vec2::new(10.0, 0.0),
        Vec2::new(-5.0, 20.0),
        Vec2::new(30.0, 40.0),
        Vec2::new(-7.0, -3.0),
    ];
    simulation.positions_mut().copy_from_slice(&start);
    simulation.attraction_points_mut()[0] = Vec2::ZERO;

    simulation.step();

    for (p, v) in start.iter().zip(simulation.velocities()) {
        assert!(v.dot(Vec2::ZERO - *p) > 0.0);
    }
}

#[test]
fn test_deactivated_point_stops_pulling() {
    let config = FlowConfig::default()
        .with_particle_count(10)
        .with_attraction_points(1)
        .with_drag_coefficient(0)
        .with_seed(4);
    let mut flow = flow(config, 100, 100);
    flow.on_touch(&[TouchSample::new(0, 10.0, 10.0)]);
    flow.step();
    for _ in 0..3 {
        flow.on_touch(&[]);
    }
    flow.step();
    assert_eq!(flow.simulation().unwrap().attraction_points()[0], INACTIVE);

    // With no drag and no force, velocities no longer change.
    let velocities = flow.simulation().unwrap().velocities().to_vec();
    flow.step();
    assert_eq!(flow.simulation().unwrap().velocities(), &velocities[..]);
}

// ============================================================================
// Attraction tracking
// ============================================================================

#[test]
fn test_touch_down_sets_point_and_dirty() {
    let mut tracker = AttractionTracker::new(5, Viewport::new(100, 100));
    let mut buffer = vec![INACTIVE; 5];
    tracker.sync(&mut buffer);

    tracker.update(&[TouchSample::new(0, 50.0, 50.0)]);
    assert_eq!(tracker.points()[0], Vec2::new(50.0, 50.0));
    assert!(tracker.is_dirty());

    assert!(tracker.sync(&mut buffer));
    assert_eq!(buffer[0], Vec2::new(50.0, 50.0));
    assert!(!tracker.is_dirty());
}

#[test]
fn test_point_deactivates_on_third_absent_sample() {
    let mut tracker = AttractionTracker::new(2, Viewport::new(100, 100));
    let held = TouchSample::new(0, 20.0, 20.0);
    tracker.update(&[held, TouchSample::new(1, 60.0, 60.0)]);

    tracker.update(&[held]);
    assert!(is_active(tracker.points()[1]));
    tracker.update(&[held]);
    assert!(is_active(tracker.points()[1]));
    assert_eq!(tracker.points()[1], Vec2::new(60.0, 40.0));
    tracker.update(&[held]);
    assert_eq!(tracker.points()[1], INACTIVE);
    assert_eq!(tracker.points()[0], Vec2::new(20.0, 80.0));
}

#[test]
fn test_pointer_beyond_slots_is_ignored() {
    let mut flow = flow(FlowConfig::default().with_particle_count(10).with_attraction_points(2), 100, 100);
    let before = flow.simulation().unwrap().attraction_points().to_vec();
    flow.on_touch(&[TouchSample::new(5, 1.0, 1.0)]);
    flow.step();
    assert_eq!(flow.simulation().unwrap().attraction_points(), &before[..]);
}

#[test]
fn test_attraction_point_count_change_resizes_tracker() {
    let mut flow = flow(FlowConfig::default().with_particle_count(10), 100, 100);
    flow.apply_config(flow.config().clone().with_attraction_points(16)).unwrap();
    assert_eq!(flow.tracker().len(), 16);
    assert_eq!(flow.tracker().absent_counts(), &[0; 16]);
    flow.on_touch(&[TouchSample::new(15, 1.0, 1.0)]);
    flow.step();
    assert_eq!(flow.simulation().unwrap().attraction_points()[15], Vec2::new(1.0, 99.0));
}

// ============================================================================
// Color mapping
// ============================================================================

#[test]
fn test_hue_interpolation_endpoints() {
    let approx = |a: f32, b: f32| (a - b).abs() < 1e-3;
    assert!(approx(hue_interpolate(0.0, 10.0, 350.0, HueDirection::Clockwise), 10.0));
    assert!(approx(hue_interpolate(1.0, 10.0, 350.0, HueDirection::Clockwise), 350.0));
    assert!(approx(hue_interpolate(0.0, 350.0, 10.0, HueDirection::CounterClockwise), 350.0));
    assert!(approx(hue_interpolate(1.0, 350.0, 10.0, HueDirection::CounterClockwise), 10.0));
}

#[test]
fn test_fast_particles_converge_to_fast_color() {
    let slow = Color::from_rgb(0x20, 0xC0, 0x40);
    let fast = Color::from_rgb(0xFF, 0x80, 0x10);
    // Hue 135 down to 30 without wrapping.
    let gradient = SpeedGradient::new(slow, fast, HueDirection::Clockwise);
    let target = gradient.fast();

    let mut last = f32::MAX;
    for speed in [0.5, 2.0, 8.0, 32.0, 128.0, 1.0e4, 1.0e8] {
        let hsv = gradient.hsv_at(speed_coefficient(Vec2::new(speed, 0.0)));
        let error = (hsv.h - target.h).abs() + (hsv.s - target.s).abs() + (hsv.v - target.v).abs();
        assert!(error <= last + 1e-6);
        last = error;
    }
    assert!(last < 0.05);
}

#[test]
fn test_particle_colors_follow_speed() {
    let config = FlowConfig::default()
        .with_particle_count(2)
        .with_attraction_points(1)
        .with_seed(3);
    let mut simulation = Simulation::new(&config, Viewport::new(100, 100));
    simulation.positions_mut()[0] = Vec2::new(50.0, 0.0);
    simulation.positions_mut()[1] = Vec2::new(50.0, 0.0);
    simulation.velocities_mut()[1] = Vec2::new(0.0, 40.0);
    simulation.attraction_points_mut()[0] = Vec2::new(50.0, 100.0);
    simulation.step();

    let gradient = SpeedGradient::new(config.slow_color, config.fast_color, config.hue_direction);
    for (v, c) in simulation.velocities().iter().zip(simulation.colors()) {
        assert_eq!(*c, gradient.color_for(*v));
    }
    assert_ne!(simulation.colors()[0], simulation.colors()[1]);
}

#[test]
fn test_preview_matches_particle_colors() {
    let config = FlowConfig::default().with_hue_direction(HueDirection::CounterClockwise);
    let gradient = SpeedGradient::new(config.slow_color, config.fast_color, config.hue_direction);
    let bar = gradient_preview(config.slow_color, config.fast_color, config.hue_direction, 11);

    for (x, color) in bar.iter().enumerate() {
        let expected = gradient.rgba_at(x as f32 / 10.0);
        let actual = color.to_rgba_f32();
        for i in 0..4 {
            assert!((expected[i] - actual[i]).abs() <= 0.5 / 255.0 + 1e-6);
        }
    }
}
