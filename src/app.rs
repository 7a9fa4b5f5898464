//! Windowed front end.
//!
//! Runs a [`ParticleFlow`] inside a winit window: pointer input becomes touch
//! samples, window visibility drives pause/resume, and every redraw steps the
//! simulation and hands its buffers to the [`Renderer`].
//!
//! | Input | Action |
//! |---|---|
//! | touch / left mouse drag | move attraction points |
//! | `Space` | pause / resume |
//! | `R` | reset attraction points |
//! | `D` | flip hue direction |
//! | `+` / `-` | double / halve particle count |
//! | `Esc` | quit |

use std::collections::BTreeMap;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::config::{FlowConfig, HueDirection, MAX_PARTICLE_COUNT};
use crate::engine::ParticleFlow;
use crate::error::{GpuError, RunError};
use crate::gpu::Renderer;
use crate::time::FrameClock;
use crate::tracker::TouchSample;

const TITLE: &str = "particleflow";

/// How the flow is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Regular resizable window.
    #[default]
    Windowed,
    /// Borderless fullscreen. Attraction points return to the default ring
    /// each time the surface becomes visible again.
    Wallpaper,
}

/// Where a pointer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    /// Platform touch identifier.
    Touch(u64),
}

#[derive(Debug, Clone, Copy)]
struct Pointer {
    source: PointerSource,
    x: f32,
    y: f32,
}

/// Maps platform pointers to small, reusable pointer ids.
///
/// A new pointer takes the smallest id not currently held, so the first
/// finger down (or the mouse, with no finger down) drives attraction point 0.
#[derive(Debug, Default)]
pub struct PointerRegistry {
    pointers: BTreeMap<u32, Pointer>,
}

impl PointerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn id_of(&self, source: PointerSource) -> Option<u32> {
        self.pointers
            .iter()
            .find(|(_, p)| p.source == source)
            .map(|(id, _)| *id)
    }

    /// Register a pointer going down and return its id. A pointer that is
    /// already down keeps its id and just moves.
    pub fn press(&mut self, source: PointerSource, x: f32, y: f32) -> u32 {
        if let Some(id) = self.id_of(source) {
            self.pointers.insert(id, Pointer { source, x, y });
            return id;
        }
        let id = (0..)
            .find(|id| !self.pointers.contains_key(id))
            .unwrap_or(u32::MAX);
        self.pointers.insert(id, Pointer { source, x, y });
        id
    }

    /// Move a pointer that is down. Returns `false` for unknown pointers.
    pub fn moved(&mut self, source: PointerSource, x: f32, y: f32) -> bool {
        match self.id_of(source).and_then(|id| self.pointers.get_mut(&id)) {
            Some(pointer) => {
                pointer.x = x;
                pointer.y = y;
                true
            }
            None => false,
        }
    }

    /// Forget a pointer, freeing its id.
    pub fn release(&mut self, source: PointerSource) -> Option<u32> {
        let id = self.id_of(source)?;
        self.pointers.remove(&id);
        Some(id)
    }

    pub fn clear(&mut self) {
        self.pointers.clear();
    }

    /// Every pointer currently down, in id order.
    pub fn samples(&self) -> Vec<TouchSample> {
        self.pointers
            .iter()
            .map(|(id, p)| TouchSample::new(*id, p.x, p.y))
            .collect()
    }
}

struct App {
    mode: RunMode,
    flow: ParticleFlow,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    pointers: PointerRegistry,
    cursor: Option<(f32, f32)>,
    clock: FrameClock,
    error: Option<RunError>,
}

impl App {
    fn new(flow: ParticleFlow, mode: RunMode) -> Self {
        Self {
            mode,
            flow,
            window: None,
            renderer: None,
            pointers: PointerRegistry::new(),
            cursor: None,
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let mut window_attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        if self.mode == RunMode::Wallpaper {
            window_attrs = window_attrs
                .with_decorations(false)
                .with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let mut renderer = pollster::block_on(Renderer::new(window.clone(), self.flow.config()))?;

        let size = window.inner_size();
        self.resize(&mut renderer, size.width, size.height)?;
        self.renderer = Some(renderer);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self, renderer: &mut Renderer, width: u32, height: u32) -> Result<(), GpuError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        renderer.resize(width, height)?;
        if let Err(e) = self.flow.resize(width, height) {
            log::warn!("{}", e);
        }
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        if paused {
            self.flow.pause();
            self.clock.pause();
        } else {
            self.flow.resume();
            self.clock.resume();
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    fn on_visibility(&mut self, visible: bool) {
        if !visible {
            self.set_paused(true);
            return;
        }
        if self.mode == RunMode::Wallpaper {
            self.flow.reset_attraction_points();
        }
        self.set_paused(false);
    }

    /// A rejected config is logged and ignored; a GPU failure while
    /// reallocating is returned.
    fn apply_config(&mut self, config: FlowConfig) -> Result<(), GpuError> {
        if self.flow.apply_config(config).is_err() {
            return Ok(());
        }
        self.pointers.clear();
        if let Some(renderer) = &mut self.renderer {
            renderer.reallocate(self.flow.config())?;
        }
        Ok(())
    }

    fn send_pointers(&self) {
        self.flow.on_touch(&self.pointers.samples());
    }

    fn on_touch(&mut self, touch: Touch) {
        let source = PointerSource::Touch(touch.id);
        let (x, y) = (touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => {
                self.pointers.press(source, x, y);
                self.send_pointers();
            }
            TouchPhase::Moved => {
                if self.pointers.moved(source, x, y) {
                    self.send_pointers();
                }
            }
            // A lifted pointer simply stops being reported.
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.pointers.release(source);
            }
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: &Key) {
        match key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Named(NamedKey::Space) => self.set_paused(!self.flow.is_paused()),
            Key::Character(c) => match c.as_str() {
                "r" | "R" => self.flow.reset_attraction_points(),
                "d" | "D" => {
                    let direction = match self.flow.config().hue_direction {
                        HueDirection::Clockwise => HueDirection::CounterClockwise,
                        HueDirection::CounterClockwise => HueDirection::Clockwise,
                    };
                    let config = self.flow.config().clone().with_hue_direction(direction);
                    if let Err(e) = self.apply_config(config) {
                        self.fail(event_loop, e.into());
                    }
                }
                "+" | "=" => {
                    let count = self.flow.config().particle_count.saturating_mul(2).min(MAX_PARTICLE_COUNT);
                    let config = self.flow.config().clone().with_particle_count(count);
                    if let Err(e) = self.apply_config(config) {
                        self.fail(event_loop, e.into());
                    }
                }
                "-" => {
                    let count = (self.flow.config().particle_count / 2).max(1);
                    let config = self.flow.config().clone().with_particle_count(count);
                    if let Err(e) = self.apply_config(config) {
                        self.fail(event_loop, e.into());
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        self.flow.step();

        let result = match (self.renderer.as_mut(), self.flow.simulation()) {
            (Some(renderer), Some(simulation)) => {
                renderer.draw_frame(simulation.positions(), simulation.colors())
            }
            _ => return,
        };

        match result {
            Ok(()) => {
                if self.clock.tick() {
                    log::debug!("{:.1} fps", self.clock.fps());
                    if let Some(window) = &self.window {
                        window.set_title(&format!("{} - {:.0} fps", TITLE, self.clock.fps()));
                    }
                }
            }
            Err(GpuError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface lost, reconfiguring");
                let reconfigured = match self.renderer.as_mut() {
                    Some(renderer) => renderer.reconfigure(),
                    None => Ok(()),
                };
                if let Err(e) = reconfigured {
                    self.fail(event_loop, e.into());
                }
            }
            Err(GpuError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Timed out waiting for a frame");
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        } else {
            self.on_visibility(true);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.set_paused(true);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(mut renderer) = self.renderer.take() {
                    let resized = self.resize(&mut renderer, physical_size.width, physical_size.height);
                    self.renderer = Some(renderer);
                    if let Err(e) = resized {
                        self.fail(event_loop, e.into());
                    }
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.on_visibility(!occluded);
            }
            WindowEvent::Touch(touch) => {
                self.on_touch(touch);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    match (state, self.cursor) {
                        (ElementState::Pressed, Some((x, y))) => {
                            self.pointers.press(PointerSource::Mouse, x, y);
                            self.send_pointers();
                        }
                        (ElementState::Released, _) => {
                            self.pointers.release(PointerSource::Mouse);
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = Some((x, y));
                if self.pointers.moved(PointerSource::Mouse, x, y) {
                    self.send_pointers();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    self.on_key(event_loop, &event.logical_key);
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
                if !self.flow.is_paused() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the flow until it is closed.
///
/// Blocks the calling thread. A fatal render error ends the loop and is
/// returned.
pub fn run(config: FlowConfig, mode: RunMode) -> Result<(), RunError> {
    let flow = ParticleFlow::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(flow, mode);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
