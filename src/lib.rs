//! # particleflow
//!
//! A field of point particles flowing toward touch-driven attraction points,
//! colored by speed and drawn with wgpu.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particleflow::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     let config = FlowConfig::default()
//!         .with_particle_count(100_000)
//!         .with_attraction_points(3);
//!     particleflow::run(config, RunMode::Windowed)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### The flow
//!
//! [`ParticleFlow`] owns everything that changes from frame to frame. It is
//! driven by plain calls, with no event framework in between:
//!
//! ```ignore
//! let mut flow = ParticleFlow::new(FlowConfig::default())?;
//! flow.resize(1080, 1920)?;
//! flow.on_touch(&[TouchSample::new(0, 540.0, 960.0)]);
//! flow.step();
//!
//! let simulation = flow.simulation().unwrap();
//! let positions = simulation.positions();
//! let colors = simulation.colors();
//! ```
//!
//! ### Attraction points
//!
//! Each touch pointer id `i` below the configured number of points drives
//! attraction point `i`. A point whose pointer stops being reported is switched
//! off after three samples; until then it keeps its last position. When no one
//! touches the screen the points sit on a ring around the centre.
//!
//! ### Physics
//!
//! Every step each particle is pulled toward every active point with a unit
//! vector scaled by the attraction coefficient, loses a fixed fraction of its
//! velocity to drag, and moves by its velocity. Particles never interact and
//! are never clamped to the screen.
//!
//! ### Color
//!
//! Speed is mapped to `[0, 1)` and blended between a slow and a fast color in
//! HSV space. The hue goes the way round the color wheel selected by
//! [`HueDirection`], not necessarily the short way.
//!
//! ## Coordinates
//!
//! Touch samples use screen coordinates (origin top-left, y down). Everything
//! inside the simulation uses pixels with the origin bottom-left and y up.

pub mod app;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod simulation;
pub mod time;
pub mod tracker;

pub use app::{run, PointerRegistry, PointerSource, RunMode};
pub use color::{gradient_preview, hue_interpolate, speed_coefficient, Hsv, SpeedGradient};
pub use config::{Color, FlowConfig, HueDirection};
pub use engine::{ParticleFlow, Resize, TouchSender};
pub use error::{ConfigError, GpuError, RunError};
pub use glam::Vec2;
pub use gpu::{Camera, RenderPhase, Renderer};
pub use simulation::{Simulation, Viewport};
pub use time::FrameClock;
pub use tracker::{AttractionTracker, TouchSample};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use particleflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::{run, RunMode};
    pub use crate::config::{Color, FlowConfig, HueDirection};
    pub use crate::engine::ParticleFlow;
    pub use crate::error::{ConfigError, GpuError, RunError};
    pub use crate::simulation::Viewport;
    pub use crate::tracker::TouchSample;
    pub use crate::Vec2;
}
