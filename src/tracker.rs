//! Attraction point tracking from multi-touch input.
//!
//! Each attraction slot `i` follows pointer id `i`. A sample lists every
//! pointer currently down; a slot whose pointer is missing from
//! [`DEACTIVATE_AFTER`] consecutive samples is switched off. Lifting several
//! fingers at once usually produces a few samples in which some of them are
//! still reported, and the debounce keeps those points steady until the
//! gesture settles.
//!
//! Positions arrive in screen space (origin top-left, y down) and are stored
//! in simulation space (origin bottom-left, y up).

use glam::Vec2;

use crate::simulation::Viewport;

/// Position written to a slot that exerts no force.
pub const INACTIVE: Vec2 = Vec2::new(-1.0, -1.0);

/// Consecutive samples a bound pointer may be missing before its slot is
/// deactivated.
pub const DEACTIVATE_AFTER: u32 = 3;

/// Whether an attraction buffer entry is live.
#[inline]
pub fn is_active(point: Vec2) -> bool {
    point.x >= 0.0
}

/// One pointer reported by a touch sample, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub pointer_id: u32,
    pub x: f32,
    pub y: f32,
}

impl TouchSample {
    pub fn new(pointer_id: u32, x: f32, y: f32) -> Self {
        Self { pointer_id, x, y }
    }
}

/// Debounced set of up to `K` attraction points.
#[derive(Debug, Clone)]
pub struct AttractionTracker {
    points: Vec<Vec2>,
    absent: Vec<u32>,
    viewport: Viewport,
    dirty: bool,
}

impl AttractionTracker {
    /// Create a tracker with `slots` points laid out on the default ring.
    pub fn new(slots: usize, viewport: Viewport) -> Self {
        let mut tracker = Self {
            points: Vec::new(),
            absent: Vec::new(),
            viewport,
            dirty: false,
        };
        tracker.resize(slots);
        tracker
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn absent_counts(&self) -> &[u32] {
        &self.absent
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Whether the points changed since the last [`sync`](Self::sync).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Change the number of slots. Counters and positions are reset.
    pub fn resize(&mut self, slots: usize) {
        self.points = vec![INACTIVE; slots];
        self.absent = vec![0; slots];
        self.reset();
    }

    /// Change the viewport used for the y flip and the default layout.
    /// Positions are left alone; call [`reset`](Self::reset) to re-layout.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Put every point back on the default ring and clear the counters.
    ///
    /// Point 0 sits above the centre at a radius of a third of the smaller
    /// viewport side (at the centre itself when there is a single slot). The
    /// others follow at `2π / K` steps around the same circle.
    pub fn reset(&mut self) {
        let slots = self.points.len();
        let center = self.viewport.center();
        let radius = if slots == 1 {
            0.0
        } else {
            self.viewport.width.min(self.viewport.height) as f32 / 3.0
        };

        for (i, point) in self.points.iter_mut().enumerate() {
            let angle = i as f32 * std::f32::consts::TAU / slots as f32;
            *point = center + radius * Vec2::new(angle.sin(), angle.cos());
        }
        self.absent.iter_mut().for_each(|count| *count = 0);
        self.dirty = true;
    }

    /// Apply one touch sample listing every pointer currently down.
    ///
    /// Pointers with an id beyond the last slot are ignored.
    pub fn update(&mut self, samples: &[TouchSample]) {
        let mut present = vec![false; self.points.len()];
        let height = self.viewport.height as f32;

        for sample in samples {
            let slot = sample.pointer_id as usize;
            if slot >= self.points.len() {
                continue;
            }
            if !is_active(self.points[slot]) {
                log::debug!("attraction point {} activated", slot);
            }
            present[slot] = true;
            self.absent[slot] = 0;
            self.points[slot] = Vec2::new(sample.x, height - sample.y);
            self.dirty = true;
        }

        for (slot, seen) in present.into_iter().enumerate() {
            if seen {
                continue;
            }
            self.absent[slot] = self.absent[slot].saturating_add(1);
            if self.absent[slot] >= DEACTIVATE_AFTER && self.points[slot] != INACTIVE {
                log::debug!("attraction point {} deactivated", slot);
                self.points[slot] = INACTIVE;
                self.dirty = true;
            }
        }
    }

    /// Copy the points into `target` if they changed, clearing the dirty flag.
    ///
    /// Returns whether a copy happened.
    pub fn sync(&mut self, target: &mut [Vec2]) -> bool {
        if !self.dirty {
            return false;
        }
        for (dst, src) in target.iter_mut().zip(&self.points) {
            *dst = *src;
        }
        self.dirty = false;
        true
    }
}
