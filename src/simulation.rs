//! Simulation runner.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::config::{SimConfig, FALLBACK_CANVAS_SIDE};
use crate::driver::FrameDriver;
use crate::error::SimulationError;
use crate::gpu::GpuState;

/// A windowed particle simulation.
///
/// Build from a [`SimConfig`], then call `.run()` to start.
pub struct Simulation {
    config: SimConfig,
}

impl Simulation {
    /// Create a simulation with the given configuration.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// The configuration this simulation runs with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run the simulation. This blocks until the window is closed or a
    /// frame fails.
    pub fn run(self) -> Result<(), SimulationError> {
        self.config.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.config);
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

struct App {
    window: Option<Arc<Window>>,
    driver: Option<FrameDriver<GpuState>>,
    config: SimConfig,
    error: Option<SimulationError>,
}

impl App {
    fn new(config: SimConfig) -> Self {
        Self {
            window: None,
            driver: None,
            config,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let side = match event_loop.primary_monitor() {
            Some(monitor) => self.config.canvas_side(monitor.size().height),
            None => {
                log::warn!(
                    "primary monitor unknown, using a {}px canvas",
                    FALLBACK_CANVAS_SIDE
                );
                FALLBACK_CANVAS_SIDE
            }
        };

        let window_attrs = Window::default_attributes()
            .with_title("Sphere Drift")
            .with_inner_size(winit::dpi::PhysicalSize::new(side, side))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        log::info!("created {}x{} canvas", side, side);

        let gpu_state = pollster::block_on(GpuState::new(window.clone(), &self.config))?;
        let mut driver = FrameDriver::new(gpu_state);
        driver.initialize()?;

        window.request_redraw();
        self.window = Some(window);
        self.driver = Some(driver);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SimulationError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(driver) = &mut self.driver {
                    driver.backend_mut().resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(driver) = &mut self.driver else {
                    return;
                };
                if let Err(e) = driver.frame() {
                    self.fail(event_loop, e.into());
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
