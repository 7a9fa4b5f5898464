//! Particle state and the physics step.
//!
//! A [`Simulation`] owns every buffer of one configuration generation:
//! positions, velocities, colors and the attraction point buffer. It is built
//! from a validated [`FlowConfig`] and a [`Viewport`] and is never resized in
//! place; a different particle count means a new `Simulation`.
//!
//! Each step is independent per particle. A particle's new state depends only
//! on its own previous state and the shared attraction buffer, so the step
//! runs data-parallel with rayon and returns deterministic buffers.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::color::SpeedGradient;
use crate::config::FlowConfig;
use crate::tracker::{is_active, INACTIVE};

/// Below this squared distance a particle is considered on top of an
/// attraction point and gets pushed in a pseudo-random direction instead.
const MIN_DISTANCE_SQ: f32 = 0.1;

/// Drawable area in pixels. Simulation space spans `[0, width] x [0, height]`
/// with y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn diagonal(&self) -> f32 {
        Vec2::new(self.width as f32, self.height as f32).length()
    }
}

/// Per-step coefficients derived from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StepParams {
    strength: f32,
    retain: f32,
}

/// One generation of particle buffers.
pub struct Simulation {
    viewport: Viewport,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    colors: Vec<[f32; 4]>,
    attraction: Vec<Vec2>,
    params: StepParams,
    gradient: SpeedGradient,
    rng: StdRng,
    steps: u64,
}

impl Simulation {
    /// Allocate buffers for `config` and distribute the particles.
    ///
    /// The attraction buffer starts with every point inactive.
    pub fn new(config: &FlowConfig, viewport: Viewport) -> Self {
        let count = config.particle_count as usize;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut simulation = Self {
            viewport,
            positions: vec![Vec2::ZERO; count],
            velocities: vec![Vec2::ZERO; count],
            colors: vec![[0.0; 4]; count],
            attraction: vec![INACTIVE; config.max_attraction_points as usize],
            params: StepParams {
                strength: config.attraction_strength(),
                retain: config.velocity_retention(),
            },
            gradient: SpeedGradient::new(config.slow_color, config.fast_color, config.hue_direction),
            rng,
            steps: 0,
        };
        simulation.init_particles();
        simulation
    }

    /// Scatter every particle uniformly over a disk and stop it.
    ///
    /// The disk is centred on the viewport with a radius of half its
    /// diagonal, so it covers the whole visible area.
    pub fn init_particles(&mut self) {
        let center = self.viewport.center();
        let radius = self.viewport.diagonal() / 2.0;
        let rest_color = self.gradient.color_for(Vec2::ZERO);

        for ((position, velocity), color) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .zip(self.colors.iter_mut())
        {
            let r = radius * self.rng.gen::<f32>().sqrt();
            let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
            *position = center + r * Vec2::new(theta.cos(), theta.sin());
            *velocity = Vec2::ZERO;
            *color = rest_color;
        }
        self.steps = 0;
    }

    /// Adopt a new viewport and scatter the particles over it again.
    /// Buffers are reused.
    pub fn reinitialize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.init_particles();
    }

    /// Advance every particle by one step.
    ///
    /// `v' = (1 - drag) * v + strength * Σ unit(point - p)` over active points,
    /// then `p' = p + v'`. Positions are never clamped or wrapped.
    pub fn step(&mut self) {
        let attraction = &self.attraction;
        let params = self.params;
        let gradient = &self.gradient;
        let step = self.steps;

        self.positions
            .par_iter_mut()
            .zip(self.velocities.par_iter_mut())
            .zip(self.colors.par_iter_mut())
            .enumerate()
            .for_each(|(index, ((position, velocity), color))| {
                let pull = attraction_at(*position, attraction, index, step);
                *velocity = *velocity * params.retain + pull * params.strength;
                *position += *velocity;
                *color = gradient.color_for(*velocity);
            });

        self.steps += 1;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }

    /// Steps taken since the last initialization.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vec2] {
        &mut self.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn velocities_mut(&mut self) -> &mut [Vec2] {
        &mut self.velocities
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    pub fn attraction_points(&self) -> &[Vec2] {
        &self.attraction
    }

    pub fn attraction_points_mut(&mut self) -> &mut [Vec2] {
        &mut self.attraction
    }
}

/// Sum of unit vectors from `position` toward every active point.
#[inline]
fn attraction_at(position: Vec2, points: &[Vec2], index: usize, step: u64) -> Vec2 {
    let mut total = Vec2::ZERO;
    for point in points.iter().copied().filter(|p| is_active(*p)) {
        let diff = point - position;
        let distance_sq = diff.length_squared();
        if distance_sq < MIN_DISTANCE_SQ {
            total += jitter_direction(index, step);
        } else {
            total += diff / distance_sq.sqrt();
        }
    }
    total
}

/// Unit vector with a direction hashed from the particle index and step.
fn jitter_direction(index: usize, step: u64) -> Vec2 {
    let seed = (index as u32).wrapping_mul(0x9E37_79B9) ^ (step as u32);
    let theta = pseudo_random(seed) * std::f32::consts::TAU;
    Vec2::new(theta.cos(), theta.sin())
}

fn pseudo_random(seed: u32) -> f32 {
    let x = seed.wrapping_mul(1103515245).wrapping_add(12345);
    let x = x ^ (x >> 16);
    (x & 0x7FFFFFFF) as f32 / 0x7FFFFFFF as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(count: u32) -> FlowConfig {
        FlowConfig::default()
            .with_particle_count(count)
            .with_attraction_points(2)
            .with_seed(7)
    }

    #[test]
    fn test_buffer_lengths_match_config() {
        let sim = Simulation::new(&config(1234), Viewport::new(640, 480));
        assert_eq!(sim.particle_count(), 1234);
        assert_eq!(sim.velocities().len(), 1234);
        assert_eq!(sim.colors().len(), 1234);
        assert_eq!(sim.attraction_points().len(), 2);
    }

    #[test]
    fn test_initial_distribution_inside_disk() {
        let viewport = Viewport::new(640, 480);
        let sim = Simulation::new(&config(5000), viewport);
        let radius = viewport.diagonal() / 2.0;
        for p in sim.positions() {
            assert!((*p - viewport.center()).length() <= radius + 1e-3);
        }
        assert!(sim.velocities().iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = Simulation::new(&config(100), Viewport::new(100, 100));
        let b = Simulation::new(&config(100), Viewport::new(100, 100));
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_inactive_points_exert_no_force() {
        let mut sim = Simulation::new(&config(50).with_drag_coefficient(0), Viewport::new(100, 100));
        let before = sim.positions().to_vec();
        sim.step();
        assert_eq!(sim.positions(), &before[..]);
        assert!(sim.velocities().iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn test_pull_is_unit_times_strength() {
        let mut sim = Simulation::new(
            &config(1).with_attraction_coefficient(200).with_drag_coefficient(0),
            Viewport::new(100, 100),
        );
        sim.positions_mut()[0] = Vec2::new(10.0, 10.0);
        sim.attraction_points_mut()[0] = Vec2::new(10.0, 50.0);
        sim.step();
        assert!((sim.velocities()[0] - Vec2::new(0.0, 2.0)).length() < 1e-5);
        assert!((sim.positions()[0] - Vec2::new(10.0, 12.0)).length() < 1e-5);
    }

    #[test]
    fn test_full_drag_keeps_only_acceleration() {
        let mut sim = Simulation::new(&config(1).with_drag_coefficient(100), Viewport::new(100, 100));
        sim.positions_mut()[0] = Vec2::new(10.0, 10.0);
        sim.velocities_mut()[0] = Vec2::new(-40.0, 25.0);
        sim.attraction_points_mut()[0] = Vec2::new(10.0, 50.0);
        sim.step();
        assert!((sim.velocities()[0] - Vec2::new(0.0, 1.0)).length() < 1e-5);
        assert!((sim.positions()[0] - Vec2::new(10.0, 11.0)).length() < 1e-5);
    }

    #[test]
    fn test_particle_on_top_of_point_gets_finite_kick() {
        let mut sim = Simulation::new(&config(1).with_drag_coefficient(0), Viewport::new(100, 100));
        sim.positions_mut()[0] = Vec2::new(30.0, 30.0);
        sim.attraction_points_mut()[0] = Vec2::new(30.0, 30.0);
        sim.step();
        let v = sim.velocities()[0];
        assert!(v.is_finite());
        assert!((v.length() - FlowConfig::default().attraction_strength()).abs() < 1e-4);
    }

    #[test]
    fn test_pseudo_random_in_unit_range() {
        for seed in [0, 1, 42, u32::MAX] {
            let r = pseudo_random(seed);
            assert!((0.0..=1.0).contains(&r));
        }
    }
}
