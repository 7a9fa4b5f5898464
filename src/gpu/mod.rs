//! GPU side of the particle flow.
//!
//! [`Renderer`] owns the surface, the point-sprite pipeline and the particle
//! vertex buffers. Every frame it uploads the simulation's position and color
//! buffers and draws all particles with a single instanced call: six vertices
//! per particle make a screen-aligned square `point_size` pixels wide.
//!
//! GPU objects are released when their owner drops. Particle buffers live in
//! a [`ParticleBuffers`] value that is replaced wholesale on reallocation, so
//! a failed or partial setup never leaves stale handles behind.

mod camera;
mod phase;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
pub use phase::RenderPhase;

use crate::config::FlowConfig;
use crate::error::GpuError;
use crate::simulation::Viewport;

/// WGSL source of the particle program.
pub const SHADER_SOURCE: &str = include_str!("particles.wgsl");

/// Vertices per particle quad.
const QUAD_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Uniforms {
    mvp: [[f32; 4]; 4],
    point_size: f32,
    _pad: f32,
    viewport: [f32; 2],
}

impl Uniforms {
    fn new(camera: &Camera, point_size: f32) -> Self {
        let viewport = camera.viewport();
        Self {
            mvp: camera.view_projection().to_cols_array_2d(),
            point_size,
            _pad: 0.0,
            viewport: [viewport.width as f32, viewport.height as f32],
        }
    }
}

/// Per-instance vertex buffers for one particle count.
struct ParticleBuffers {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    count: u32,
}

impl ParticleBuffers {
    fn new(device: &wgpu::Device, count: u32) -> Self {
        let positions = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Positions"),
            size: (count as usize * std::mem::size_of::<Vec2>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let colors = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Colors"),
            size: (count as usize * std::mem::size_of::<[f32; 4]>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            positions,
            colors,
            count,
        }
    }
}

/// Draws one simulation's particles into a window surface.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    buffers: Option<ParticleBuffers>,
    camera: Camera,
    clear_color: wgpu::Color,
    point_size: f32,
    particle_count: u32,
    phase: RenderPhase,
}

impl Renderer {
    /// Set up the device and build the particle program.
    ///
    /// Shader compilation and pipeline creation errors are returned, not
    /// logged and skipped.
    pub async fn new(window: Arc<Window>, config: &FlowConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("Uncaptured GPU error: {}", e);
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        // Colors are already sRGB encoded, so write them to a non-sRGB target.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| GpuError::Api {
                operation: "configure surface",
                message: "surface reports no supported formats".into(),
            })?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        scoped(&device, "configure surface", || surface.configure(&device, &surface_config))?;

        let camera = Camera::new(Viewport::new(surface_config.width, surface_config.height));
        let point_size = config.particle_size as f32;
        let uniforms = Uniforms::new(&camera, point_size);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });
        if let Some(e) = device.pop_error_scope().await {
            log::error!("Particle shader rejected: {}", e);
            return Err(GpuError::ShaderCompile(e.to_string()));
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vec2>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x4],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(e) = device.pop_error_scope().await {
            log::error!("Particle program rejected: {}", e);
            return Err(GpuError::PipelineLink(e.to_string()));
        }

        let mut phase = RenderPhase::default();
        phase.on_program_ready();
        log::info!("Particle program ready ({:?})", surface_config.format);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            buffers: None,
            camera,
            clear_color: clear_color(config),
            point_size,
            particle_count: config.particle_count,
            phase,
        })
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }

    /// Reconfigure the surface for a new size and allocate particle buffers
    /// if needed.
    ///
    /// A zero-sized surface is ignored. Returns whether the buffers were
    /// (re)allocated. A size the device rejects, such as one beyond its
    /// texture limits, is an error.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, GpuError> {
        if width == 0 || height == 0 {
            return Ok(false);
        }
        let viewport = Viewport::new(width, height);
        let allocate = self.phase.on_surface_sized(viewport);
        if self.camera.viewport() != viewport {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.reconfigure()?;
            self.camera.set_viewport(viewport);
            self.write_uniforms()?;
        }
        if allocate {
            self.allocate_buffers()?;
        }
        Ok(allocate)
    }

    /// Configure the surface again at its current size, after it was lost
    /// or went out of date.
    pub fn reconfigure(&mut self) -> Result<(), GpuError> {
        scoped(&self.device, "configure surface", || {
            self.surface.configure(&self.device, &self.surface_config)
        })
    }

    /// Adopt a new configuration. Buffers are rebuilt only when the particle
    /// count changed.
    pub fn reallocate(&mut self, config: &FlowConfig) -> Result<(), GpuError> {
        self.clear_color = clear_color(config);
        self.point_size = config.particle_size as f32;
        self.particle_count = config.particle_count;
        self.write_uniforms()?;
        if self.phase.on_config_changed(config.particle_count) {
            self.allocate_buffers()?;
        }
        Ok(())
    }

    /// Upload the particle buffers and draw one frame.
    pub fn draw_frame(&mut self, positions: &[Vec2], colors: &[[f32; 4]]) -> Result<(), GpuError> {
        let Some(buffers) = &self.buffers else {
            return Err(GpuError::Api {
                operation: "draw_frame",
                message: "particle buffers are not allocated".into(),
            });
        };
        if positions.len() != buffers.count as usize || colors.len() != buffers.count as usize {
            return Err(GpuError::Api {
                operation: "draw_frame",
                message: format!(
                    "expected {} particles, got {} positions and {} colors",
                    buffers.count,
                    positions.len(),
                    colors.len()
                ),
            });
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.queue
            .write_buffer(&buffers.positions, 0, bytemuck::cast_slice(positions));
        self.queue
            .write_buffer(&buffers.colors, 0, bytemuck::cast_slice(colors));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, buffers.positions.slice(..));
            render_pass.set_vertex_buffer(1, buffers.colors.slice(..));
            render_pass.draw(0..QUAD_VERTICES, 0..buffers.count);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        scope_result("draw_frame", validation, out_of_memory)?;

        output.present();
        Ok(())
    }

    fn allocate_buffers(&mut self) -> Result<(), GpuError> {
        // The old buffers are released before the new ones are created.
        self.buffers = None;
        let buffers = scoped(&self.device, "allocate particle buffers", || {
            ParticleBuffers::new(&self.device, self.particle_count)
        })?;
        self.buffers = Some(buffers);
        self.phase
            .on_buffers_allocated(self.camera.viewport(), self.particle_count);
        log::info!(
            "Allocated particle buffers for {} particles at {}x{}",
            self.particle_count,
            self.surface_config.width,
            self.surface_config.height
        );
        Ok(())
    }

    fn write_uniforms(&self) -> Result<(), GpuError> {
        let uniforms = Uniforms::new(&self.camera, self.point_size);
        scoped(&self.device, "write uniforms", || {
            self.queue
                .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms))
        })
    }
}

/// Run `f` inside validation and out-of-memory error scopes, so a rejected
/// call fails here instead of reaching the uncaptured error handler.
fn scoped<T>(
    device: &wgpu::Device,
    operation: &'static str,
    f: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    scope_result(operation, validation, out_of_memory)?;
    Ok(value)
}

/// Turn the errors caught by a validation and an out-of-memory scope into a
/// result. Validation errors win when both fired.
fn scope_result(
    operation: &'static str,
    validation: Option<wgpu::Error>,
    out_of_memory: Option<wgpu::Error>,
) -> Result<(), GpuError> {
    match validation.or(out_of_memory) {
        None => Ok(()),
        Some(e) => {
            log::error!("GPU rejected {}: {}", operation, e);
            Err(GpuError::Api {
                operation,
                message: e.to_string(),
            })
        }
    }
}

fn clear_color(config: &FlowConfig) -> wgpu::Color {
    let [r, g, b, a] = config.background_color.to_rgba_f32();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}
