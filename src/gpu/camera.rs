//! Fixed orthographic camera.

use glam::{Mat4, Vec3};

use crate::simulation::Viewport;

/// Distance from the eye to the particle plane.
const EYE_DISTANCE: f32 = 3.0;
const NEAR: f32 = 1.0;
const FAR: f32 = 7.0;

/// Looks straight down the z axis at the particle plane and maps
/// `[0, width] x [0, height]` onto the whole surface.
///
/// There is no rotation or zoom; the only input is the viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    viewport: Viewport,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, EYE_DISTANCE)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            0.0,
            self.viewport.width as f32,
            0.0,
            self.viewport.height as f32,
            NEAR,
            FAR,
        )
    }

    /// Model-view-projection matrix; the model transform is the identity.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
