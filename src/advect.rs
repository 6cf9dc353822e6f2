//! Particle motion on the unit sphere.

use crate::Vec3;

/// Advance `pos` one step around `axis` at angular `speed`.
///
/// First-order incremental rotation: step along `axis × pos`, then project
/// back onto the unit sphere so error does not accumulate in the radius.
/// A zero result (only reachable from a zero `pos`) stays at the origin.
#[inline]
pub fn advance(pos: Vec3, axis: Vec3, speed: f32) -> Vec3 {
    (pos + speed * axis.cross(pos)).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_single_step_scenario() {
        let next = advance(Vec3::X, Vec3::Z, 0.1);
        let expected = Vec3::new(1.0, 0.1, 0.0).normalize();
        assert!((next - expected).length() < EPS);
        assert!((next.x - 0.995).abs() < 1e-3);
        assert!((next.y - 0.0995).abs() < 1e-3);
        assert!(next.z.abs() < EPS);
    }

    #[test]
    fn test_zero_speed_is_identity() {
        let pos = Vec3::new(0.48, -0.6, 0.64);
        assert!((advance(pos, Vec3::Y, 0.0) - pos).length() < EPS);
    }

    #[test]
    fn test_preserves_unit_norm() {
        let axes = [Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 1.0).normalize()];
        let positions = [Vec3::Z, Vec3::new(-0.6, 0.0, 0.8), Vec3::new(0.0, -1.0, 0.0)];
        for &axis in &axes {
            for &pos in &positions {
                for speed in [0.0, 0.01, 0.05, 0.099] {
                    let next = advance(pos, axis, speed);
                    assert!((next.length() - 1.0).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn test_position_on_axis_does_not_move() {
        let axis = Vec3::new(0.0, 0.6, 0.8);
        assert!((advance(axis, axis, 0.09) - axis).length() < EPS);
    }

    #[test]
    fn test_zero_position_stays_zero() {
        assert_eq!(advance(Vec3::ZERO, Vec3::X, 0.05), Vec3::ZERO);
    }
}
