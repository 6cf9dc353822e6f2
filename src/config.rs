//! Simulation configuration.
//!
//! Defaults reproduce the classic demo: a thousand particles on a square
//! canvas 60% of the screen tall, drawn as two-pixel black points.

use crate::error::ConfigError;

/// Default number of particles.
pub const DEFAULT_PARTICLE_COUNT: u32 = 1000;
/// Default canvas side as a fraction of the primary monitor height.
pub const DEFAULT_CANVAS_FRACTION: f32 = 0.6;
/// Default point size in device pixels.
pub const DEFAULT_POINT_SIZE: f32 = 2.0;
/// Default exclusive upper bound of per-particle angular speed.
pub const DEFAULT_MAX_SPEED: f32 = 0.1;
/// Canvas side used when the monitor size cannot be queried.
pub const FALLBACK_CANVAS_SIDE: u32 = 600;

/// Configuration for a [`Simulation`](crate::Simulation).
///
/// Use method chaining to override defaults:
///
/// ```
/// use sphere_drift::SimConfig;
///
/// let config = SimConfig::default()
///     .with_particle_count(5_000)
///     .with_point_size(3.0)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of particles.
    pub particle_count: u32,
    /// Canvas side as a fraction of the primary monitor height.
    pub canvas_fraction: f32,
    /// Point size in device pixels.
    pub point_size: f32,
    /// Speeds are sampled from `[0, max_speed)`.
    pub max_speed: f32,
    /// RNG seed for reproducible initial conditions. `None` uses entropy.
    pub seed: Option<u64>,
    /// RGBA color of every drawn point.
    pub point_color: [f32; 4],
    /// RGBA color the screen is cleared to each frame.
    pub clear_color: [f64; 4],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            canvas_fraction: DEFAULT_CANVAS_FRACTION,
            point_size: DEFAULT_POINT_SIZE,
            max_speed: DEFAULT_MAX_SPEED,
            seed: None,
            point_color: [0.0, 0.0, 0.0, 1.0],
            clear_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl SimConfig {
    /// Set the number of particles.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the canvas side as a fraction of the monitor height.
    pub fn with_canvas_fraction(mut self, fraction: f32) -> Self {
        self.canvas_fraction = fraction;
        self
    }

    /// Set the drawn point size in device pixels.
    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }

    /// Set the exclusive upper bound of per-particle speed.
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Seed the initial-condition RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the point color (RGBA, 0.0-1.0).
    pub fn with_point_color(mut self, color: [f32; 4]) -> Self {
        self.point_color = color;
        self
    }

    /// Set the background clear color (RGBA, 0.0-1.0).
    pub fn with_clear_color(mut self, color: [f64; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(ConfigError::PointSize(self.point_size));
        }
        if !(self.max_speed.is_finite() && self.max_speed >= 0.0) {
            return Err(ConfigError::MaxSpeed(self.max_speed));
        }
        if !(self.canvas_fraction > 0.0 && self.canvas_fraction <= 1.0) {
            return Err(ConfigError::CanvasFraction(self.canvas_fraction));
        }
        Ok(())
    }

    /// Square canvas side in pixels for a monitor of the given height.
    ///
    /// Never returns less than one pixel.
    pub fn canvas_side(&self, monitor_height: u32) -> u32 {
        ((monitor_height as f32 * self.canvas_fraction) as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo_constants() {
        let config = SimConfig::default();
        assert_eq!(config.particle_count, 1000);
        assert_eq!(config.point_size, 2.0);
        assert!((config.max_speed - 0.1).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_canvas_side() {
        let config = SimConfig::default();
        assert_eq!(config.canvas_side(1000), 600);
        assert_eq!(config.canvas_side(1080), 648);
        assert_eq!(config.canvas_side(0), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            SimConfig::default().with_particle_count(0).validate(),
            Err(ConfigError::NoParticles)
        );
        assert_eq!(
            SimConfig::default().with_point_size(0.0).validate(),
            Err(ConfigError::PointSize(0.0))
        );
        assert_eq!(
            SimConfig::default().with_max_speed(-1.0).validate(),
            Err(ConfigError::MaxSpeed(-1.0))
        );
        assert_eq!(
            SimConfig::default().with_canvas_fraction(1.5).validate(),
            Err(ConfigError::CanvasFraction(1.5))
        );
        assert!(SimConfig::default().with_max_speed(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_zero_speed_is_valid() {
        assert!(SimConfig::default().with_max_speed(0.0).validate().is_ok());
    }
}
