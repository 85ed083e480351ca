// Flat (u,v) ↔ spherical surface mapping.
// See docs/research/spherical-navigation.md for the addressing scheme.
//
// Everything else in the engine addresses the sphere two ways: legacy flat
// (u,v) coordinates, and true Cartesian positions of length `radius`. These
// conversions are the only place the two meet, so pole handling lives here
// and nowhere else.

use glam::{DVec2, DVec3};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Half-width of the clamped band around each pole, in v units.
/// v is clamped into [V_EPSILON, 1 - V_EPSILON] so longitude never becomes
/// undefined. Positions whose true v falls inside the band lose that much
/// latitude on conversion; this is documented lossy behavior.
pub const V_EPSILON: f64 = 0.002;

/// Positions shorter than `radius * DEGENERATE_LENGTH` have no usable
/// direction and map to the sanitized origin instead.
const DEGENERATE_LENGTH: f64 = 1e-9;

// ============================================================================
// SANITIZATION
// ============================================================================

/// Wrap u into [0,1) and clamp v into [V_EPSILON, 1 - V_EPSILON].
///
/// Idempotent and total: finite inputs never produce NaN, and non-finite
/// inputs collapse to the deterministic defaults (u = 0, v = equator)
/// rather than letting a NaN spread through the frame.
pub fn sanitize_uv(u: f64, v: f64) -> DVec2 {
    let u = if u.is_finite() { u.rem_euclid(1.0) } else { 0.0 };
    let v = if v.is_finite() {
        v.clamp(V_EPSILON, 1.0 - V_EPSILON)
    } else {
        0.5
    };
    DVec2::new(u, v)
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Convert flat (u,v) to a Cartesian position of length `radius`.
///
/// u is the longitude fraction of 2π, v the polar-angle fraction of π
/// measured from the +Y pole (Y-up). Inputs are sanitized first, so v = 0
/// lands just inside the pole band, not on the singular axis itself.
pub fn uv_to_cartesian(u: f64, v: f64, radius: f64) -> DVec3 {
    let radius = if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        1.0
    };
    let uv = sanitize_uv(u, v);
    let theta = uv.x * std::f64::consts::TAU;
    let phi = uv.y * std::f64::consts::PI;
    DVec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Inverse of `uv_to_cartesian`: recover the flat (u,v) of a Cartesian
/// position. The input is normalized first, so callers may pass positions
/// that have drifted slightly off the sphere.
///
/// `radius` only scales the degeneracy guard — near-zero (or non-finite)
/// positions have no direction and map to the sanitized origin (0, equator).
pub fn cartesian_to_uv(position: DVec3, radius: f64) -> DVec2 {
    let scale = if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        1.0
    };
    let len = position.length();
    if !len.is_finite() || len < scale * DEGENERATE_LENGTH {
        return sanitize_uv(0.0, 0.5);
    }
    let dir = position / len;
    let v = (dir.y.clamp(-1.0, 1.0)).acos() / std::f64::consts::PI;
    let u = dir.z.atan2(dir.x) / std::f64::consts::TAU;
    sanitize_uv(u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_length_matches_radius() {
        for &radius in &[0.5, 1.0, 3.7, 1000.0] {
            for iu in 0..8 {
                for iv in 0..=8 {
                    let u = iu as f64 / 8.0;
                    let v = iv as f64 / 8.0;
                    let p = uv_to_cartesian(u, v, radius);
                    assert!(
                        (p.length() - radius).abs() < 1e-6,
                        "length drift at uv=({u},{v}) r={radius}: {}",
                        p.length()
                    );
                }
            }
        }
    }

    #[test]
    fn test_round_trip_away_from_poles() {
        for iu in 0..16 {
            for iv in 1..16 {
                let u = iu as f64 / 16.0;
                let v = iv as f64 / 16.0;
                let uv = cartesian_to_uv(uv_to_cartesian(u, v, 2.5), 2.5);
                assert!((uv.x - u).abs() < 1e-9, "u drift: {} vs {u}", uv.x);
                assert!((uv.y - v).abs() < 1e-9, "v drift: {} vs {v}", uv.y);
            }
        }
    }

    #[test]
    fn test_pole_band_is_clamped_not_nan() {
        // Inside the band the round trip is lossy by design: v comes back
        // clamped, u stays defined.
        let uv = cartesian_to_uv(uv_to_cartesian(0.3, 0.0, 1.0), 1.0);
        assert!(uv.x.is_finite() && uv.y.is_finite());
        assert!((uv.y - V_EPSILON).abs() < 1e-9);
    }

    #[test]
    fn test_sanitize_wraps_and_clamps() {
        let uv = sanitize_uv(-0.25, 1.5);
        assert!((uv.x - 0.75).abs() < 1e-12);
        assert!((uv.y - (1.0 - V_EPSILON)).abs() < 1e-12);

        // Idempotent.
        let again = sanitize_uv(uv.x, uv.y);
        assert_eq!(uv, again);
    }

    #[test]
    fn test_non_finite_inputs_degrade() {
        let uv = sanitize_uv(f64::NAN, f64::INFINITY);
        assert_eq!(uv, DVec2::new(0.0, 0.5));

        let origin = cartesian_to_uv(DVec3::ZERO, 1.0);
        assert_eq!(origin, DVec2::new(0.0, 0.5));

        let junk = cartesian_to_uv(DVec3::new(f64::NAN, 1.0, 0.0), 1.0);
        assert!(junk.x.is_finite() && junk.y.is_finite());
    }

    #[test]
    fn test_north_pole_maps_up() {
        let p = uv_to_cartesian(0.0, 0.0, 1.0);
        // v is clamped to the band edge, so the result sits just off +Y.
        assert!(p.y > 0.999);
    }
}
