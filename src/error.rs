//! Error types for particleflow.
//!
//! Configuration errors are recoverable: the rejected value is reported and
//! the previous configuration stays in effect. GPU errors end the render
//! session and leave teardown to the caller.

use std::fmt;
use std::ops::RangeInclusive;

/// A configuration value outside its permitted range.
///
/// Returned by [`FlowConfig::validate`](crate::FlowConfig::validate) and by
/// [`ParticleFlow::apply_config`](crate::ParticleFlow::apply_config), which
/// never applies a config partially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Particle count is zero or above the supported maximum.
    ParticleCount { value: u32, allowed: RangeInclusive<u32> },
    /// Particle size in pixels is zero or too large.
    ParticleSize { value: u32, allowed: RangeInclusive<u32> },
    /// Number of attraction points outside `1..=16`.
    AttractionPoints { value: u32, allowed: RangeInclusive<u32> },
    /// Attraction coefficient outside `0..=1000`.
    AttractionCoefficient { value: u32, allowed: RangeInclusive<u32> },
    /// Drag coefficient outside `0..=100` percent.
    DragCoefficient { value: u32, allowed: RangeInclusive<u32> },
    /// Viewport with a zero dimension.
    Viewport { width: u32, height: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParticleCount { value, allowed } => write!(
                f,
                "Invalid particle count {}: must be within {}..={}",
                value,
                allowed.start(),
                allowed.end()
            ),
            ConfigError::ParticleSize { value, allowed } => write!(
                f,
                "Invalid particle size {}: must be within {}..={}",
                value,
                allowed.start(),
                allowed.end()
            ),
            ConfigError::AttractionPoints { value, allowed } => write!(
                f,
                "Invalid number of attraction points {}: must be within {}..={}",
                value,
                allowed.start(),
                allowed.end()
            ),
            ConfigError::AttractionCoefficient { value, allowed } => write!(
                f,
                "Invalid attraction coefficient {}: must be within {}..={}",
                value,
                allowed.start(),
                allowed.end()
            ),
            ConfigError::DragCoefficient { value, allowed } => write!(
                f,
                "Invalid drag coefficient {}: must be within {}..={}",
                value,
                allowed.start(),
                allowed.end()
            ),
            ConfigError::Viewport { width, height } => {
                write!(f, "Invalid viewport {}x{}: both dimensions must be positive", width, height)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised by the render session.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The particle shader failed to compile.
    ShaderCompile(String),
    /// The render pipeline could not be built from the compiled shader.
    PipelineLink(String),
    /// A graphics call was rejected by the device.
    Api { operation: &'static str, message: String },
    /// The surface could not provide a frame.
    Surface(wgpu::SurfaceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::ShaderCompile(msg) => write!(f, "Could not compile particle shader: {}", msg),
            GpuError::PipelineLink(msg) => write!(f, "Could not link particle program: {}", msg),
            GpuError::Api { operation, message } => write!(f, "{}: {}", operation, message),
            GpuError::Surface(e) => write!(f, "Surface error: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::Surface(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

impl From<wgpu::SurfaceError> for GpuError {
    fn from(e: wgpu::SurfaceError) -> Self {
        GpuError::Surface(e)
    }
}

/// Errors that can occur when running the windowed application.
#[derive(Debug)]
pub enum RunError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// The render session failed.
    Gpu(GpuError),
    /// The initial configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            RunError::Window(e) => write!(f, "Failed to create window: {}", e),
            RunError::Gpu(e) => write!(f, "GPU error: {}", e),
            RunError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::EventLoop(e) => Some(e),
            RunError::Window(e) => Some(e),
            RunError::Gpu(e) => Some(e),
            RunError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for RunError {
    fn from(e: winit::error::EventLoopError) -> Self {
        RunError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for RunError {
    fn from(e: winit::error::OsError) -> Self {
        RunError::Window(e)
    }
}

impl From<GpuError> for RunError {
    fn from(e: GpuError) -> Self {
        RunError::Gpu(e)
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}
