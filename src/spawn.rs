//! Initial conditions for the particle set.
//!
//! Every particle gets a random unit `position` (also its state texture
//! key), a random unit rotation `axis`, and a random angular `speed`.
//! All three are fixed for the lifetime of a simulation.

use crate::config::SimConfig;
use crate::state::{texel_address, StateSize};
use crate::Vec3;
use glam::UVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Immutable per-particle attributes, stored as parallel arrays.
///
/// The arrays are uploaded as three separate vertex buffers on the GPU and
/// read in place by the CPU backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleAttributes {
    positions: Vec<Vec3>,
    axes: Vec<Vec3>,
    speeds: Vec<f32>,
}

impl ParticleAttributes {
    /// Sample `config.particle_count` particles.
    ///
    /// Uses `config.seed` when set, so the same config always produces the
    /// same particles.
    pub fn spawn(config: &SimConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::spawn_with(&mut rng, config.particle_count, config.max_speed)
    }

    /// Sample `count` particles from the given RNG.
    pub fn spawn_with<R: Rng>(rng: &mut R, count: u32, max_speed: f32) -> Self {
        let mut positions = Vec::with_capacity(count as usize);
        let mut axes = Vec::with_capacity(count as usize);
        let mut speeds = Vec::with_capacity(count as usize);

        for _ in 0..count {
            positions.push(random_unit_vector(rng));
            axes.push(random_unit_vector(rng));
            speeds.push(random_speed(rng, max_speed));
        }

        log::debug!("spawned {} particles (max speed {})", count, max_speed);

        Self {
            positions,
            axes,
            speeds,
        }
    }

    /// Build attributes from explicit arrays.
    ///
    /// # Panics
    ///
    /// Panics if the three arrays differ in length.
    pub fn from_parts(positions: Vec<Vec3>, axes: Vec<Vec3>, speeds: Vec<f32>) -> Self {
        assert_eq!(positions.len(), axes.len(), "position/axis count mismatch");
        assert_eq!(positions.len(), speeds.len(), "position/speed count mismatch");
        Self {
            positions,
            axes,
            speeds,
        }
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// `true` if there are no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Initial positions; also the stable state texture keys.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Rotation axes.
    pub fn axes(&self) -> &[Vec3] {
        &self.axes
    }

    /// Angular speeds.
    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    /// State texture address of every particle.
    ///
    /// Depends only on the immutable keys, so it is the same every frame.
    pub fn addresses(&self, size: StateSize) -> Vec<UVec2> {
        self.positions
            .iter()
            .map(|&key| texel_address(key, size))
            .collect()
    }
}

/// Uniform sample in the `[-1, 1]` cube, normalized onto the unit sphere.
///
/// Samples too close to the origin to normalize are drawn again.
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if let Some(unit) = v.try_normalize() {
            return unit;
        }
    }
}

fn random_speed<R: Rng>(rng: &mut R, max_speed: f32) -> f32 {
    if max_speed > 0.0 {
        rng.gen_range(0.0..max_speed)
    } else {
        0.0
    }
}
