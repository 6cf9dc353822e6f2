//! # Sphere Drift - ping-pong particle advection
//!
//! Particles drift around the unit sphere, each rotating about its own fixed
//! axis at its own fixed speed. Their current positions never leave the GPU:
//! they live as texels of a floating-point state texture, addressed by the
//! particle's initial position, and are advanced every frame by a render
//! pass that reads one state texture and writes the other.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sphere_drift::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new(SimConfig::default().with_particle_count(2_000)).run()
//! }
//! ```
//!
//! ## Frame loop
//!
//! ```text
//! init:   keys ──────────────▶ T0
//! frame:  T_cur ──update──▶ T_next ──render──▶ screen ; swap
//! ```
//!
//! - Every particle's texel is fixed for its lifetime; only the stored
//!   position changes.
//! - Exactly one state texture is read and the other written in any pass.
//! - Two particles that share a texel overwrite each other; which one wins
//!   is unspecified.
//!
//! ## Backends
//!
//! | Backend | Storage | Update |
//! |---------|---------|--------|
//! | [`gpu::GpuSimulation`] | two `Rgba32Float` (or `Rgba16Float`) render targets | point-list render pass |
//! | [`CpuSimulation`] | two in-memory [`StateTexture`]s | rayon parallel loop |
//!
//! Both are stepped by the same [`FrameDriver`].

pub mod advect;
mod config;
pub mod cpu;
pub mod driver;
pub mod error;
pub mod gpu;
pub mod ping_pong;
mod simulation;
pub mod spawn;
pub mod state;

pub use glam::{Vec2, Vec3, Vec4};

pub use config::{
    SimConfig, DEFAULT_CANVAS_FRACTION, DEFAULT_MAX_SPEED, DEFAULT_PARTICLE_COUNT,
    DEFAULT_POINT_SIZE, FALLBACK_CANVAS_SIDE,
};
pub use cpu::CpuSimulation;
pub use driver::{DriverState, FrameBackend, FrameDriver, Phase};
pub use error::{ConfigError, DriverError, GpuError, PipelineError, PipelineKind, SimulationError};
pub use ping_pong::PingPong;
pub use simulation::Simulation;
pub use spawn::ParticleAttributes;
pub use state::{texel_address, StateSize, StateTexture};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use sphere_drift::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cpu::CpuSimulation;
    pub use crate::driver::{FrameBackend, FrameDriver};
    pub use crate::error::SimulationError;
    pub use crate::simulation::Simulation;
    pub use crate::spawn::ParticleAttributes;
    pub use crate::state::{StateSize, StateTexture};
    pub use crate::SimConfig;
    pub use crate::{Vec2, Vec3, Vec4};
}
