//! Simulation configuration.
//!
//! A [`FlowConfig`] is an immutable parameter set. Changing any value means
//! building a new config and handing it to
//! [`ParticleFlow::apply_config`](crate::ParticleFlow::apply_config), which
//! validates it and reinitializes every buffer.
//!
//! ```ignore
//! let config = FlowConfig::default()
//!     .with_particle_count(200_000)
//!     .with_attraction_points(3)
//!     .with_slow_color(Color::from_argb(0xFF20A0FF))
//!     .with_hue_direction(HueDirection::CounterClockwise);
//! config.validate()?;
//! ```

use std::ops::RangeInclusive;

use crate::color::Hsv;
use crate::error::ConfigError;

pub const DEFAULT_PARTICLE_COUNT: u32 = 50_000;
pub const MAX_PARTICLE_COUNT: u32 = 1_000_000;
pub const DEFAULT_PARTICLE_SIZE: u32 = 1;
pub const MAX_PARTICLE_SIZE: u32 = 50;
pub const DEFAULT_ATTRACTION_POINTS: u32 = 5;
pub const MAX_ATTRACTION_POINTS: u32 = 16;
pub const DEFAULT_ATTRACTION_COEFFICIENT: u32 = 100;
pub const MAX_ATTRACTION_COEFFICIENT: u32 = 1000;
pub const DEFAULT_DRAG_COEFFICIENT: u32 = 4;
/// At 100% nothing carries over: each step's velocity is that step's
/// acceleration alone.
pub const MAX_DRAG_COEFFICIENT: u32 = 100;

pub const DEFAULT_BACKGROUND_COLOR: Color = Color::from_argb(0xFF00_0000);
pub const DEFAULT_SLOW_COLOR: Color = Color::from_argb(0xFF4C_4CFF);
pub const DEFAULT_FAST_COLOR: Color = Color::from_argb(0xFFFF_4C4C);

/// Units of the integer attraction coefficient per unit of acceleration.
const ATTRACTION_SCALE: f32 = 100.0;

/// An 8-bit-per-channel color, packed as `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Unpack a `0xAARRGGBB` value.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Channels scaled to `[0, 1]`.
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    pub fn to_hsv(self) -> Hsv {
        let [r, g, b, _] = self.to_rgba_f32();
        Hsv::from_rgb(r, g, b)
    }

    pub fn alpha(self) -> f32 {
        self.a as f32 / 255.0
    }
}

/// Which way round the color wheel the hue travels from the slow color to
/// the fast color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HueDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl HueDirection {
    pub fn is_clockwise(self) -> bool {
        self == HueDirection::Clockwise
    }
}

/// Complete parameter set for one simulation generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig {
    pub particle_count: u32,
    /// Point sprite edge length in pixels.
    pub particle_size: u32,
    pub max_attraction_points: u32,
    /// Integer attraction strength, `0..=1000`.
    pub attraction_coefficient: u32,
    /// Per-step velocity loss in percent.
    pub drag_coefficient: u32,
    pub background_color: Color,
    pub slow_color: Color,
    pub fast_color: Color,
    pub hue_direction: HueDirection,
    /// Seed for the initial particle distribution. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            particle_size: DEFAULT_PARTICLE_SIZE,
            max_attraction_points: DEFAULT_ATTRACTION_POINTS,
            attraction_coefficient: DEFAULT_ATTRACTION_COEFFICIENT,
            drag_coefficient: DEFAULT_DRAG_COEFFICIENT,
            background_color: DEFAULT_BACKGROUND_COLOR,
            slow_color: DEFAULT_SLOW_COLOR,
            fast_color: DEFAULT_FAST_COLOR,
            hue_direction: HueDirection::Clockwise,
            seed: None,
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_particle_size(mut self, size: u32) -> Self {
        self.particle_size = size;
        self
    }

    pub fn with_attraction_points(mut self, count: u32) -> Self {
        self.max_attraction_points = count;
        self
    }

    pub fn with_attraction_coefficient(mut self, coefficient: u32) -> Self {
        self.attraction_coefficient = coefficient;
        self
    }

    pub fn with_drag_coefficient(mut self, coefficient: u32) -> Self {
        self.drag_coefficient = coefficient;
        self
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_slow_color(mut self, color: Color) -> Self {
        self.slow_color = color;
        self
    }

    pub fn with_fast_color(mut self, color: Color) -> Self {
        self.fast_color = color;
        self
    }

    pub fn with_hue_direction(mut self, direction: HueDirection) -> Self {
        self.hue_direction = direction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every field, reporting the first one out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(self.particle_count, 1..=MAX_PARTICLE_COUNT, |value, allowed| {
            ConfigError::ParticleCount { value, allowed }
        })?;
        check(self.particle_size, 1..=MAX_PARTICLE_SIZE, |value, allowed| {
            ConfigError::ParticleSize { value, allowed }
        })?;
        check(self.max_attraction_points, 1..=MAX_ATTRACTION_POINTS, |value, allowed| {
            ConfigError::AttractionPoints { value, allowed }
        })?;
        check(self.attraction_coefficient, 0..=MAX_ATTRACTION_COEFFICIENT, |value, allowed| {
            ConfigError::AttractionCoefficient { value, allowed }
        })?;
        check(self.drag_coefficient, 0..=MAX_DRAG_COEFFICIENT, |value, allowed| {
            ConfigError::DragCoefficient { value, allowed }
        })?;
        Ok(())
    }

    /// Fraction of velocity removed each step, in `[0, 1]`.
    pub fn drag_fraction(&self) -> f32 {
        self.drag_coefficient as f32 / 100.0
    }

    /// Fraction of velocity carried into the next step, in `[0, 1]`.
    ///
    /// Zero at a drag of 100, where velocity is the current acceleration only.
    pub fn velocity_retention(&self) -> f32 {
        1.0 - self.drag_fraction()
    }

    /// Acceleration contributed by one active attraction point, in pixels
    /// per step squared.
    ///
    /// The integer coefficient is divided by 100, so the default of 100 pulls
    /// with a unit vector and the maximum of 1000 with ten times that.
    pub fn attraction_strength(&self) -> f32 {
        self.attraction_coefficient as f32 / ATTRACTION_SCALE
    }
}

fn check(
    value: u32,
    allowed: RangeInclusive<u32>,
    err: impl FnOnce(u32, RangeInclusive<u32>) -> ConfigError,
) -> Result<(), ConfigError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(err(value, allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FlowConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_particles() {
        let err = FlowConfig::default().with_particle_count(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::ParticleCount { value: 0, .. }));
    }

    #[test]
    fn test_rejects_too_many_particles() {
        let config = FlowConfig::default().with_particle_count(MAX_PARTICLE_COUNT + 1);
        assert!(config.validate().is_err());
        let config = FlowConfig::default().with_particle_count(MAX_PARTICLE_COUNT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_attraction_point_limits() {
        assert!(FlowConfig::default().with_attraction_points(0).validate().is_err());
        assert!(FlowConfig::default().with_attraction_points(1).validate().is_ok());
        assert!(FlowConfig::default().with_attraction_points(16).validate().is_ok());
        assert!(FlowConfig::default().with_attraction_points(17).validate().is_err());
    }

    #[test]
    fn test_coefficient_limits() {
        assert!(FlowConfig::default().with_attraction_coefficient(1000).validate().is_ok());
        assert!(FlowConfig::default().with_attraction_coefficient(1001).validate().is_err());
        assert!(FlowConfig::default().with_drag_coefficient(0).validate().is_ok());
        assert!(FlowConfig::default().with_drag_coefficient(100).validate().is_ok());
        assert!(FlowConfig::default().with_drag_coefficient(101).validate().is_err());
        assert!(FlowConfig::default().with_particle_size(0).validate().is_err());
    }

    #[test]
    fn test_drag_fraction_and_retention() {
        assert!((FlowConfig::default().drag_fraction() - 0.04).abs() < 1e-6);
        assert!((FlowConfig::default().velocity_retention() - 0.96).abs() < 1e-6);

        let full = FlowConfig::default().with_drag_coefficient(MAX_DRAG_COEFFICIENT);
        assert_eq!(full.drag_fraction(), 1.0);
        assert_eq!(full.velocity_retention(), 0.0);
    }

    #[test]
    fn test_attraction_strength_scale() {
        assert_eq!(FlowConfig::default().attraction_strength(), 1.0);
        let config = FlowConfig::default().with_attraction_coefficient(MAX_ATTRACTION_COEFFICIENT);
        assert_eq!(config.attraction_strength(), 10.0);
        let config = FlowConfig::default().with_attraction_coefficient(0);
        assert_eq!(config.attraction_strength(), 0.0);
    }

    #[test]
    fn test_color_unpacks_argb() {
        let c = Color::from_argb(0x80FF_4C10);
        assert_eq!(c, Color { r: 0xFF, g: 0x4C, b: 0x10, a: 0x80 });
        assert_eq!(c.to_argb(), 0x80FF_4C10);
    }

    #[test]
    fn test_default_colors_hsv() {
        let slow = DEFAULT_SLOW_COLOR.to_hsv();
        assert!((slow.h - 240.0).abs() < 0.01);
        let fast = DEFAULT_FAST_COLOR.to_hsv();
        assert!(fast.h.abs() < 0.01);
        assert!((fast.v - 1.0).abs() < 1e-6);
    }
}
