//! Integration tests for the ping-pong frame loop.
//!
//! These drive the CPU backend through the public `FrameDriver`, so they
//! exercise the same lifecycle the windowed GPU backend runs.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sphere_drift::{
    CpuSimulation, DriverError, DriverState, FrameDriver, ParticleAttributes, SimConfig,
    StateSize, Vec3,
};

const EPS: f32 = 1e-5;

fn cpu_driver(attrs: ParticleAttributes, width: u32, height: u32) -> FrameDriver<CpuSimulation> {
    let size = StateSize::new(width, height).unwrap();
    FrameDriver::new(CpuSimulation::new(attrs, size))
}

fn random_sim(count: u32, max_speed: f32, size: u32) -> FrameDriver<CpuSimulation> {
    let mut rng = StdRng::seed_from_u64(1234);
    let attrs = ParticleAttributes::spawn_with(&mut rng, count, max_speed);
    let mut driver = cpu_driver(attrs, size, size);
    driver.initialize().unwrap();
    driver
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_single_particle_one_step() {
    let attrs = ParticleAttributes::from_parts(vec![Vec3::X], vec![Vec3::Z], vec![0.1]);
    let mut driver = cpu_driver(attrs, 64, 64);
    driver.initialize().unwrap();
    driver.frame().unwrap();

    let pos = driver.backend().positions()[0];
    assert!((pos.x - 0.995).abs() < 1e-3);
    assert!((pos.y - 0.0995).abs() < 1e-3);
    assert!(pos.z.abs() < EPS);
    assert!((pos - Vec3::new(1.0, 0.1, 0.0).normalize()).length() < EPS);
}

#[test]
fn test_zero_speed_state_is_frozen() {
    let mut driver = random_sim(1000, 0.0, 128);
    let initial = driver.backend().current().clone();

    for _ in 0..25 {
        driver.frame().unwrap();
    }

    let current = driver.backend().current();
    for (a, b) in initial.texels().iter().zip(current.texels()) {
        assert!((*a - *b).length() < EPS);
    }
}

#[test]
fn test_generated_attributes_are_unit() {
    let config = SimConfig::default().with_seed(99);
    let attrs = ParticleAttributes::spawn(&config);
    assert_eq!(attrs.len(), 1000);
    for (p, a) in attrs.positions().iter().zip(attrs.axes()) {
        assert!((p.length() - 1.0).abs() < EPS);
        assert!((a.length() - 1.0).abs() < EPS);
    }
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_positions_stay_on_unit_sphere() {
    let mut driver = random_sim(500, 0.1, 256);
    for _ in 0..100 {
        driver.frame().unwrap();
    }
    let sim = driver.backend();
    let current = sim.current();
    for &texel in sim.addresses() {
        let pos = current.position(texel);
        assert!((pos.length() - 1.0).abs() < 1e-4, "drifted off sphere: {pos:?}");
    }
}

#[test]
fn test_addresses_are_stable() {
    let mut driver = random_sim(300, 0.1, 200);
    let size = driver.backend().current().size();
    let before = driver.backend().attributes().addresses(size);
    assert_eq!(before, driver.backend().addresses());

    for _ in 0..10 {
        driver.frame().unwrap();
        assert_eq!(driver.backend().attributes().addresses(size), before);
    }

    // Both slots are written at exactly the same texels.
    let state = driver.backend().state();
    for (a, b) in state.slot(0).texels().iter().zip(state.slot(1).texels()) {
        assert_eq!(a.w, b.w);
    }
}

#[test]
fn test_read_slot_is_previous_write_slot() {
    let mut driver = random_sim(50, 0.05, 32);
    for _ in 0..8 {
        let read_before = driver.backend().state().current_index();
        let written = driver.backend().state().next_index();
        assert_ne!(read_before, written);

        driver.frame().unwrap();

        let read_after = driver.backend().state().current_index();
        assert_eq!(read_after, written);
        assert_ne!(read_after, read_before);
    }
    assert_eq!(driver.backend().state().swaps(), 8);
}

#[test]
fn test_render_draws_updated_positions() {
    let attrs = ParticleAttributes::from_parts(
        vec![Vec3::X, Vec3::Y],
        vec![Vec3::Z, Vec3::X],
        vec![0.1, 0.0],
    );
    let mut driver = cpu_driver(attrs, 16, 16);
    driver.initialize().unwrap();
    driver.frame().unwrap();

    let drawn = driver.backend().visible_points();
    assert_eq!(drawn.len(), 2);
    assert!(drawn.contains(&driver.backend().positions()[0]));
    assert!(drawn[0].y > 0.0);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_driver_lifecycle() {
    let attrs = ParticleAttributes::from_parts(vec![Vec3::Z], vec![Vec3::X], vec![0.01]);
    let mut driver = cpu_driver(attrs, 8, 8);
    assert_eq!(driver.state(), DriverState::Uninitialized);
    assert!(matches!(driver.frame(), Err(DriverError::Uninitialized)));

    driver.initialize().unwrap();
    assert_eq!(driver.state(), DriverState::Ready);
    for _ in 0..3 {
        driver.frame().unwrap();
    }
    assert_eq!(driver.frames(), 3);
    assert_eq!(driver.state(), DriverState::Ready);
}
