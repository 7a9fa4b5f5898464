//! Speed-to-color mapping.
//!
//! Particles are colored by interpolating in HSV space between a "slow" and a
//! "fast" color. The interpolation parameter comes from the particle speed
//! through a saturating curve, so very fast particles approach the fast color
//! without ever passing it.
//!
//! [`hue_interpolate`] is the only hue blending routine in the crate. Both the
//! particle colors and [`gradient_preview`] go through it, so a preview of a
//! gradient always matches what the particles show.

use glam::Vec2;

use crate::config::{Color, HueDirection};

/// `ln(1 + |v|²)` is divided by this before saturation.
const SPEED_SCALE: f32 = 4.5;

/// A color in hue/saturation/value form.
///
/// `h` is in degrees, `[0, 360)`. `s` and `v` are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }

    /// Convert from RGB channels in `[0, 1]`.
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta <= 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let h = if h < 0.0 { h + 360.0 } else { h };
        let s = if max <= 0.0 { 0.0 } else { delta / max };

        Self { h, s, v: max }
    }

    /// Convert to RGB channels in `[0, 1]`.
    pub fn to_rgb(self) -> [f32; 3] {
        let c = self.v * self.s;
        let h6 = (self.h / 60.0).rem_euclid(6.0);
        let x = c * (1.0 - (h6 % 2.0 - 1.0).abs());
        let m = self.v - c;

        let (r, g, b) = match h6 as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        [r + m, g + m, b + m]
    }
}

/// Blend two hues following the requested winding direction.
///
/// `t` is in `[0, 1]`, `left` and `right` in `[0, 360)`. Clockwise travel from
/// a smaller to a larger hue goes down through 0, counter-clockwise travel
/// from a larger to a smaller hue goes up through 360. The result is in
/// `[0, 360)`.
pub fn hue_interpolate(t: f32, left: f32, right: f32, direction: HueDirection) -> f32 {
    let mut left = left;
    let mut right = right;
    if left < right && direction.is_clockwise() {
        left += 360.0;
    } else if left > right && !direction.is_clockwise() {
        right += 360.0;
    }
    let hue = (1.0 - t) * left + t * right;
    if hue >= 360.0 {
        hue - 360.0
    } else {
        hue
    }
}

/// Blend two HSV colors with the shared hue law and linear saturation/value.
pub fn hsv_interpolate(t: f32, slow: Hsv, fast: Hsv, direction: HueDirection) -> Hsv {
    Hsv {
        h: hue_interpolate(t, slow.h, fast.h, direction),
        s: (1.0 - t) * slow.s + t * fast.s,
        v: (1.0 - t) * slow.v + t * fast.v,
    }
}

/// Map a velocity to `[0, 1)`, `0` at rest and approaching `1` as speed grows.
///
/// Close to the origin this matches `ln(1 + |v|²) / 4.5`; `tanh` bends it
/// smoothly toward 1 instead of clipping.
pub fn speed_coefficient(velocity: Vec2) -> f32 {
    let t = ((velocity.length_squared() + 1.0).ln() / SPEED_SCALE).tanh();
    if t.is_nan() {
        1.0
    } else {
        t
    }
}

/// The color mapper: velocity in, RGBA out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedGradient {
    slow: Hsv,
    fast: Hsv,
    slow_alpha: f32,
    fast_alpha: f32,
    direction: HueDirection,
}

impl SpeedGradient {
    pub fn new(slow: Color, fast: Color, direction: HueDirection) -> Self {
        Self {
            slow: slow.to_hsv(),
            fast: fast.to_hsv(),
            slow_alpha: slow.alpha(),
            fast_alpha: fast.alpha(),
            direction,
        }
    }

    pub fn slow(&self) -> Hsv {
        self.slow
    }

    pub fn fast(&self) -> Hsv {
        self.fast
    }

    /// HSV color at gradient position `t`.
    pub fn hsv_at(&self, t: f32) -> Hsv {
        hsv_interpolate(t, self.slow, self.fast, self.direction)
    }

    /// RGBA color at gradient position `t`.
    pub fn rgba_at(&self, t: f32) -> [f32; 4] {
        let [r, g, b] = self.hsv_at(t).to_rgb();
        let a = (1.0 - t) * self.slow_alpha + t * self.fast_alpha;
        [r, g, b, a]
    }

    /// RGBA color of a particle moving with `velocity`.
    #[inline]
    pub fn color_for(&self, velocity: Vec2) -> [f32; 4] {
        self.rgba_at(speed_coefficient(velocity))
    }
}

/// Colors of a horizontal gradient bar `width` pixels wide, left to right.
///
/// Column `x` samples the gradient at `x / (width - 1)`.
pub fn gradient_preview(slow: Color, fast: Color, direction: HueDirection, width: usize) -> Vec<Color> {
    let gradient = SpeedGradient::new(slow, fast, direction);
    let last = width.saturating_sub(1).max(1) as f32;
    (0..width)
        .map(|x| {
            let [r, g, b, a] = gradient.rgba_at(x as f32 / last);
            Color {
                r: to_u8(r),
                g: to_u8(g),
                b: to_u8(b),
                a: to_u8(a),
            }
        })
        .collect()
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
