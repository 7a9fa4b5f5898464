//! The simulation controller.
//!
//! [`ParticleFlow`] is the single owner of the configuration, the attraction
//! tracker and the current [`Simulation`]. Everything reaches the simulation
//! through plain method calls:
//!
//! ```ignore
//! let mut flow = ParticleFlow::new(FlowConfig::default())?;
//! flow.resize(1280, 720)?;
//!
//! // Any thread may push touch samples.
//! let touches = flow.touch_sender();
//! touches.send(vec![TouchSample::new(0, 640.0, 360.0)]);
//!
//! // Render thread, once per frame.
//! flow.step();
//! ```
//!
//! Touch samples are queued and only folded into the attraction buffer at the
//! start of [`step`](ParticleFlow::step), so a step never sees a half-updated
//! set of points.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::config::FlowConfig;
use crate::error::ConfigError;
use crate::simulation::{Simulation, Viewport};
use crate::tracker::{AttractionTracker, TouchSample};

/// Cloneable handle for delivering touch samples from another thread.
#[derive(Debug, Clone)]
pub struct TouchSender {
    tx: Sender<Vec<TouchSample>>,
}

impl TouchSender {
    /// Queue one sample. Returns `false` once the controller is gone.
    pub fn send(&self, samples: Vec<TouchSample>) -> bool {
        self.tx.send(samples).is_ok()
    }
}

/// Outcome of a viewport notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Same size as the running simulation; nothing was touched.
    Unchanged,
    /// Particles and attraction points were reset for the new size.
    Reinitialized,
    /// First size notification; buffers were allocated.
    Allocated,
}

/// Owns the config generation, the tracker and the particle buffers.
pub struct ParticleFlow {
    config: FlowConfig,
    tracker: AttractionTracker,
    simulation: Option<Simulation>,
    touch_tx: Sender<Vec<TouchSample>>,
    touch_rx: Receiver<Vec<TouchSample>>,
    paused: bool,
    generation: u64,
}

impl ParticleFlow {
    /// Create a controller. Buffers are allocated on the first
    /// [`resize`](Self::resize).
    pub fn new(config: FlowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (touch_tx, touch_rx) = mpsc::channel();
        let tracker = AttractionTracker::new(config.max_attraction_points as usize, Viewport::new(1, 1));
        Ok(Self {
            config,
            tracker,
            simulation: None,
            touch_tx,
            touch_rx,
            paused: false,
            generation: 0,
        })
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn simulation_mut(&mut self) -> Option<&mut Simulation> {
        self.simulation.as_mut()
    }

    pub fn tracker(&self) -> &AttractionTracker {
        &self.tracker
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.simulation.as_ref().map(Simulation::viewport)
    }

    /// Incremented every time a config is applied.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the configuration wholesale.
    ///
    /// An invalid config is rejected and the running one stays in effect.
    /// A valid one rebuilds every buffer from scratch and drops queued touch
    /// samples, which referred to the old slot layout.
    pub fn apply_config(&mut self, config: FlowConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            log::warn!("Rejected configuration: {}", e);
            return Err(e);
        }

        self.discard_queued_touches();

        self.tracker.resize(config.max_attraction_points as usize);
        if let Some(viewport) = self.viewport() {
            let mut simulation = Simulation::new(&config, viewport);
            self.tracker.sync(simulation.attraction_points_mut());
            self.simulation = Some(simulation);
        }
        self.config = config;
        self.generation += 1;
        log::info!(
            "Applied configuration: {} particles, {} attraction points",
            self.config.particle_count,
            self.config.max_attraction_points
        );
        Ok(())
    }

    /// Handle for queuing touch samples from any thread.
    pub fn touch_sender(&self) -> TouchSender {
        TouchSender {
            tx: self.touch_tx.clone(),
        }
    }

    /// Queue a touch sample; it takes effect at the next step.
    ///
    /// Samples arriving while paused are dropped.
    pub fn on_touch(&self, samples: &[TouchSample]) {
        if self.paused {
            return;
        }
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.touch_tx.send(samples.to_vec());
    }

    /// Viewport size notification.
    ///
    /// Repeating the current size is a no-op so pause/resume cycles do not
    /// restart the animation. Any other size scatters the particles again and
    /// puts the attraction points back on the default ring.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Resize, ConfigError> {
        let viewport = Viewport::new(width, height);
        if viewport.is_empty() {
            return Err(ConfigError::Viewport { width, height });
        }

        let outcome = if let Some(simulation) = self.simulation.as_mut() {
            if simulation.viewport() == viewport {
                return Ok(Resize::Unchanged);
            }
            simulation.reinitialize(viewport);
            Resize::Reinitialized
        } else {
            self.simulation = Some(Simulation::new(&self.config, viewport));
            Resize::Allocated
        };

        self.tracker.set_viewport(viewport);
        self.tracker.reset();
        if let Some(simulation) = self.simulation.as_mut() {
            self.tracker.sync(simulation.attraction_points_mut());
        }
        log::info!("Viewport {}x{}: {:?}", width, height, outcome);
        Ok(outcome)
    }

    /// Advance one frame: fold queued touches into the tracker, publish the
    /// attraction points and run the physics step.
    ///
    /// Returns `false` without doing anything while paused or before the
    /// first resize.
    pub fn step(&mut self) -> bool {
        if self.paused {
            return false;
        }
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };

        while let Ok(samples) = self.touch_rx.try_recv() {
            self.tracker.update(&samples);
        }
        self.tracker.sync(simulation.attraction_points_mut());
        simulation.step();
        true
    }

    /// Put the attraction points back on the default ring at the next step.
    pub fn reset_attraction_points(&mut self) {
        self.tracker.reset();
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.discard_queued_touches();
    }

    /// Resume stepping. Samples queued through a [`TouchSender`] during the
    /// pause are dropped rather than replayed.
    pub fn resume(&mut self) {
        self.paused = false;
        self.discard_queued_touches();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn discard_queued_touches(&mut self) {
        let dropped = self.touch_rx.try_iter().count();
        if dropped > 0 {
            log::debug!("Dropped {} queued touch samples", dropped);
        }
    }
}
