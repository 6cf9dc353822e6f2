//! CPU reference backend.
//!
//! Holds the two state textures in memory and runs the same init, update
//! and render passes as the GPU backend. The update step evaluates every
//! particle in parallel with rayon, reading only the current slot, then
//! writes results into the next slot in particle order (later particles
//! win texel collisions).

use std::convert::Infallible;

use glam::UVec2;
use rayon::prelude::*;

use crate::advect::advance;
use crate::driver::FrameBackend;
use crate::ping_pong::PingPong;
use crate::spawn::ParticleAttributes;
use crate::state::{StateSize, StateTexture};
use crate::Vec3;

/// In-memory ping-pong particle simulation.
pub struct CpuSimulation {
    attributes: ParticleAttributes,
    addresses: Vec<UVec2>,
    state: PingPong<StateTexture>,
    advanced: Vec<Vec3>,
    visible: Vec<Vec3>,
}

impl CpuSimulation {
    /// Allocate both state textures for `attributes`.
    pub fn new(attributes: ParticleAttributes, size: StateSize) -> Self {
        let addresses = attributes.addresses(size);
        Self {
            attributes,
            addresses,
            state: PingPong::new(StateTexture::new(size), StateTexture::new(size)),
            advanced: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Particle attributes.
    pub fn attributes(&self) -> &ParticleAttributes {
        &self.attributes
    }

    /// Texel address of every particle. Fixed for the simulation's lifetime.
    pub fn addresses(&self) -> &[UVec2] {
        &self.addresses
    }

    /// The ping-pong pair of state textures.
    pub fn state(&self) -> &PingPong<StateTexture> {
        &self.state
    }

    /// Texture read by the next update.
    pub fn current(&self) -> &StateTexture {
        self.state.current()
    }

    /// Current position of every particle, read from the current slot.
    pub fn positions(&self) -> Vec<Vec3> {
        let current = self.state.current();
        self.addresses.iter().map(|&a| current.position(a)).collect()
    }

    /// Clip-space points drawn by the last render.
    pub fn visible_points(&self) -> &[Vec3] {
        &self.visible
    }

    /// Write every key into the current slot.
    pub fn seed(&mut self) {
        let target = self.state.current_mut();
        target.clear();
        for (&key, &texel) in self.attributes.positions().iter().zip(&self.addresses) {
            target.store(texel, key);
        }
    }

    /// Advance every particle from the current slot into the next slot.
    pub fn step(&mut self) {
        let attributes = &self.attributes;
        let addresses = &self.addresses;
        let (read, write) = self.state.split();

        (0..addresses.len())
            .into_par_iter()
            .map(|i| {
                let pos = read.position(addresses[i]);
                advance(pos, attributes.axes()[i], attributes.speeds()[i])
            })
            .collect_into_vec(&mut self.advanced);

        write.clear();
        for (&texel, &pos) in addresses.iter().zip(&self.advanced) {
            write.store(texel, pos);
        }
    }

    /// Make the slot written by the last step current.
    pub fn swap(&mut self) {
        self.state.swap();
    }

    /// Collect the points the render pass draws from the next slot.
    pub fn draw(&mut self) {
        let source = self.state.next();
        self.visible.clear();
        self.visible.extend(
            self.addresses
                .iter()
                .map(|&a| source.position(a))
                .filter(|&p| is_visible(p)),
        );
    }
}

/// Clip-space position inside the visible `[-1, 1]³` cube.
#[inline]
pub fn is_visible(clip: Vec3) -> bool {
    clip.abs().cmple(Vec3::ONE).all()
}

impl FrameBackend for CpuSimulation {
    type Error = Infallible;

    fn initialize(&mut self) -> Result<(), Infallible> {
        self.seed();
        Ok(())
    }

    fn update(&mut self) -> Result<(), Infallible> {
        self.step();
        Ok(())
    }

    fn render(&mut self) -> Result<(), Infallible> {
        self.draw();
        Ok(())
    }

    fn swap(&mut self) {
        CpuSimulation::swap(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(position: Vec3, axis: Vec3, speed: f32) -> CpuSimulation {
        let attrs = ParticleAttributes::from_parts(vec![position], vec![axis], vec![speed]);
        CpuSimulation::new(attrs, StateSize::new(32, 32).unwrap())
    }

    #[test]
    fn test_seed_writes_keys() {
        let mut sim = single(Vec3::X, Vec3::Z, 0.1);
        sim.seed();
        assert_eq!(sim.positions(), vec![Vec3::X]);
        assert_eq!(sim.current().written_count(), 1);
    }

    #[test]
    fn test_step_writes_next_slot_only() {
        let mut sim = single(Vec3::X, Vec3::Z, 0.1);
        sim.seed();
        sim.step();
        // Current slot untouched until swap.
        assert_eq!(sim.positions(), vec![Vec3::X]);
        let texel = sim.addresses()[0];
        let next = sim.state().next().position(texel);
        assert!((next - Vec3::new(1.0, 0.1, 0.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn test_repeated_steps_reuse_scratch() {
        let mut sim = single(Vec3::X, Vec3::Z, 0.1);
        sim.seed();
        sim.step();
        let capacity = sim.advanced.capacity();
        let buffer = sim.advanced.as_ptr();
        for _ in 0..10 {
            sim.swap();
            sim.step();
        }
        assert_eq!(sim.advanced.len(), 1);
        assert_eq!(sim.advanced.capacity(), capacity);
        assert_eq!(sim.advanced.as_ptr(), buffer);
    }

    #[test]
    fn test_draw_reads_next_slot() {
        let mut sim = single(Vec3::X, Vec3::Z, 0.1);
        sim.seed();
        sim.step();
        sim.draw();
        assert_eq!(sim.visible_points().len(), 1);
        assert!(sim.visible_points()[0].y > 0.09);
    }

    #[test]
    fn test_collision_last_particle_wins() {
        let a = Vec3::new(0.0, 0.0, 1.0);
        let b = Vec3::new(0.001, 0.001, -1.0).normalize();
        let attrs = ParticleAttributes::from_parts(vec![a, b], vec![Vec3::X; 2], vec![0.0; 2]);
        let mut sim = CpuSimulation::new(attrs, StateSize::new(4, 4).unwrap());
        assert_eq!(sim.addresses()[0], sim.addresses()[1]);
        sim.seed();
        assert_eq!(sim.current().written_count(), 1);
        assert!((sim.current().position(sim.addresses()[0]) - b).length() < 1e-6);
    }

    #[test]
    fn test_visibility_cube() {
        assert!(is_visible(Vec3::new(1.0, -1.0, 0.0)));
        assert!(!is_visible(Vec3::new(1.01, 0.0, 0.0)));
        assert!(!is_visible(Vec3::new(0.0, 0.0, -1.5)));
    }
}
