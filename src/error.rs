//! Error types for Sphere Drift.
//!
//! This module provides error types for configuration, GPU initialization,
//! pipeline construction, the frame driver and running a simulation window.

use thiserror::Error;

/// Errors that can occur during GPU initialization or while running passes.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// Failed to map buffer for reading.
    #[error("Failed to map GPU buffer: {0}")]
    BufferMapping(String),
    /// Failed to acquire or present a surface texture.
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    /// The device reported an error (validation, out of memory) for
    /// commands recorded or submitted during `stage`.
    #[error("GPU error during {stage}: {source}")]
    Device {
        /// Work that was running when the error was raised.
        stage: &'static str,
        /// Error reported by the device.
        #[source]
        source: wgpu::Error,
    },
}

/// Which of the three simulation pipelines an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Seeds the first state texture.
    Init,
    /// Advances particle positions into the next state texture.
    Update,
    /// Draws particles to the screen.
    Render,
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineKind::Init => "init",
            PipelineKind::Update => "update",
            PipelineKind::Render => "render",
        };
        f.write_str(name)
    }
}

/// Errors raised while building a pipeline.
///
/// Both variants are fatal: a pipeline that fails to build is never handed
/// out, so nothing can draw with it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The WGSL source failed to parse or validate.
    #[error("An error occurred compiling the {pipeline} shader:\n{log}")]
    Compile {
        /// Pipeline whose shader failed.
        pipeline: PipelineKind,
        /// Diagnostic text, including source spans.
        log: String,
    },
    /// The device rejected the shader module or pipeline layout.
    #[error("Can not link {pipeline} pipeline: {log}")]
    Link {
        /// Pipeline that failed to link.
        pipeline: PipelineKind,
        /// Validation message reported by the device.
        log: String,
    },
}

impl PipelineError {
    /// Pipeline the error belongs to.
    pub fn pipeline(&self) -> PipelineKind {
        match self {
            PipelineError::Compile { pipeline, .. } | PipelineError::Link { pipeline, .. } => {
                *pipeline
            }
        }
    }
}

/// Invalid [`SimConfig`](crate::SimConfig) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// At least one particle is required.
    #[error("Particle count must be greater than zero")]
    NoParticles,
    /// Point size must be finite and positive.
    #[error("Point size must be positive, got {0}")]
    PointSize(f32),
    /// Speed range upper bound must be finite and non-negative.
    #[error("Maximum speed must be finite and non-negative, got {0}")]
    MaxSpeed(f32),
    /// Canvas fraction must lie in `(0, 1]`.
    #[error("Canvas fraction must be in (0, 1], got {0}")]
    CanvasFraction(f32),
    /// State textures need at least one texel.
    #[error("State texture must be at least 1x1, got {width}x{height}")]
    StateSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// Errors reported by the [`FrameDriver`](crate::FrameDriver).
#[derive(Debug, Error)]
pub enum DriverError<E: std::error::Error + 'static> {
    /// `frame()` was called before `initialize()`.
    #[error("Simulation has not been initialized")]
    Uninitialized,
    /// `initialize()` was called on a driver that already ran it.
    #[error("Simulation is already initialized")]
    AlreadyInitialized,
    /// An earlier frame failed; the loop does not run again.
    #[error("Simulation loop halted after a failed frame")]
    Halted,
    /// The backend failed during initialization or a frame.
    #[error(transparent)]
    Backend(E),
}

/// Errors that can occur when running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// A pipeline failed to build.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    /// The frame loop stopped on an error.
    #[error("Frame loop failed: {0}")]
    Frame(String),
}

impl From<DriverError<GpuError>> for SimulationError {
    fn from(err: DriverError<GpuError>) -> Self {
        match err {
            DriverError::Backend(e) => SimulationError::Gpu(e),
            other => SimulationError::Frame(other.to_string()),
        }
    }
}
