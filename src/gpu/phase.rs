//! Render session state machine.
//!
//! ```text
//! Uninitialized --program ready--> ProgramReady --buffers allocated--> Initialized
//!                                       ^                                  |
//!                                       +-- new size / new particle count -+
//! ```
//!
//! Resizing to the current size and pause/resume keep `Initialized`.

use crate::simulation::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPhase {
    #[default]
    Uninitialized,
    /// Surface configured and pipeline built; no particle buffers.
    ProgramReady,
    /// Particle buffers sized for `particle_count` at `viewport`.
    Initialized { viewport: Viewport, particle_count: u32 },
}

impl RenderPhase {
    pub fn on_program_ready(&mut self) {
        if *self == RenderPhase::Uninitialized {
            *self = RenderPhase::ProgramReady;
        }
    }

    /// Surface size notification. Returns whether buffers must be
    /// (re)allocated before the next frame.
    pub fn on_surface_sized(&mut self, size: Viewport) -> bool {
        match *self {
            RenderPhase::Uninitialized => false,
            RenderPhase::ProgramReady => true,
            RenderPhase::Initialized { viewport, .. } if viewport == size => false,
            RenderPhase::Initialized { .. } => {
                *self = RenderPhase::ProgramReady;
                true
            }
        }
    }

    /// Configuration notification. Returns whether buffers must be
    /// reallocated for the new particle count.
    pub fn on_config_changed(&mut self, count: u32) -> bool {
        match *self {
            RenderPhase::Initialized { particle_count, .. } if particle_count != count => {
                *self = RenderPhase::ProgramReady;
                true
            }
            _ => false,
        }
    }

    pub fn on_buffers_allocated(&mut self, viewport: Viewport, particle_count: u32) {
        if *self != RenderPhase::Uninitialized {
            *self = RenderPhase::Initialized { viewport, particle_count };
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, RenderPhase::Initialized { .. })
    }
}
