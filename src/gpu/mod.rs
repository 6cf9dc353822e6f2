mod pipeline;
mod state_gpu;
mod targets;

use std::sync::Arc;

use winit::window::Window;

pub use pipeline::{validate_wgsl, Pipelines, ShaderSet};
pub use state_gpu::GpuSimulation;
pub use targets::{StateFormat, StateTarget};

use crate::config::SimConfig;
use crate::driver::FrameBackend;
use crate::error::{GpuError, SimulationError};
use crate::spawn::ParticleAttributes;
use crate::state::StateSize;

/// Request a device with the features and limits the simulation needs.
///
/// Adapter-specific format features are enabled when offered, so the
/// device can render to every format [`StateFormat::for_adapter`] reports.
pub async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    let required_features =
        adapter.features() & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        })
        .await?;
    Ok((device, queue))
}

/// Run `work` inside validation and out-of-memory error scopes.
///
/// Errors the device raises for commands issued by `work` come back as
/// [`GpuError::Device`] instead of reaching the uncaptured error handler.
pub fn capture_errors<T>(
    device: &wgpu::Device,
    stage: &'static str,
    work: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = work();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(source) => Err(GpuError::Device { stage, source }),
        None => Ok(value),
    }
}

/// Windowed GPU backend: a [`GpuSimulation`] presenting to a surface.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
    simulation: GpuSimulation,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, sim_config: &SimConfig) -> Result<Self, SimulationError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window).map_err(GpuError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(GpuError::from)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let state_format = StateFormat::for_adapter(&adapter);
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // State textures match the canvas and never resize.
        let max_side = device.limits().max_texture_dimension_2d;
        let state_size = StateSize::new(config.width.min(max_side), config.height.min(max_side))?;

        let attributes = ParticleAttributes::spawn(sim_config);
        let simulation = GpuSimulation::new(
            device,
            queue,
            &attributes,
            state_size,
            state_format,
            surface_format,
            (config.width, config.height),
            sim_config,
            &ShaderSet::default(),
        )
        .await?;

        let [r, g, b, a] = sim_config.clear_color;

        Ok(Self {
            surface,
            config,
            clear_color: wgpu::Color { r, g, b, a },
            simulation,
        })
    }

    /// The simulation presented by this state.
    pub fn simulation(&self) -> &GpuSimulation {
        &self.simulation
    }

    /// Reconfigure the surface. State textures keep their size.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(self.simulation.device(), &self.config);
            self.simulation.set_viewport(new_size.width, new_size.height);
        }
    }

    fn reconfigure(&mut self) {
        self.surface.configure(self.simulation.device(), &self.config);
    }
}

impl FrameBackend for GpuState {
    type Error = GpuError;

    fn initialize(&mut self) -> Result<(), GpuError> {
        self.simulation.seed()
    }

    fn update(&mut self) -> Result<(), GpuError> {
        self.simulation.update()
    }

    fn render(&mut self) -> Result<(), GpuError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquire timed out, skipping present");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let simulation = &self.simulation;
        let device = simulation.device();
        capture_errors(device, "Render Encoder", || {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
            simulation.encode_render(&mut encoder, &view, self.clear_color);
            simulation.queue().submit(std::iter::once(encoder.finish()));
        })?;
        output.present();

        Ok(())
    }

    fn swap(&mut self) {
        self.simulation.swap();
    }
}
