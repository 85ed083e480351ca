// Projectile steering on the sphere's surface.
// See docs/research/spherical-navigation.md §"Projectiles".
//
// Two modes:
//   Flat   — the projectile's intent lives in legacy (u,v) space and the
//            flat delta becomes a tangent-plane displacement. Deliberately
//            NOT true geodesic integration (kept for behavioral parity with
//            flat-space gameplay tuning); near the clamped pole bands the
//            displacement compresses the same way the flat addressing does.
//   Homing — the heading is re-aimed at the target every tick through a
//            fixed-rate blend and the projectile travels by tangent
//            displacement, renormalized back onto the sphere.

use glam::{DVec2, DVec3};

use super::coords::{cartesian_to_uv, sanitize_uv, uv_to_cartesian};
use super::motion::{REFERENCE_FRAME_MS, compute_tangent_direction};

/// Squared-length floor below which a vector has no usable direction.
const DEGENERATE_SQ: f64 = 1e-12;

// ============================================================================
// FLAT-DELTA MODE
// ============================================================================

/// Advance a flat-space projectile one frame.
///
/// `intended` is the projectile's flat position, advanced by `delta`
/// (scaled to the frame length); the Cartesian displacement between the old
/// and new intended positions is added to `position`, which is then
/// renormalized onto the sphere. Returns the resulting flat coordinates.
///
/// Non-finite inputs or a non-positive `delta_ms` are a no-op.
pub fn step_flat(
    position: &mut DVec3,
    intended: &mut DVec2,
    delta: DVec2,
    radius: f64,
    delta_ms: f64,
) -> DVec2 {
    let usable = delta_ms.is_finite()
        && delta_ms > 0.0
        && radius.is_finite()
        && radius > 0.0
        && delta.is_finite()
        && intended.is_finite()
        && position.is_finite();
    if !usable {
        return cartesian_to_uv(*position, radius);
    }

    let old_uv = sanitize_uv(intended.x, intended.y);
    let new_uv = sanitize_uv(
        old_uv.x + delta.x * (delta_ms / REFERENCE_FRAME_MS),
        old_uv.y + delta.y * (delta_ms / REFERENCE_FRAME_MS),
    );
    *intended = new_uv;

    let old_cartesian = uv_to_cartesian(old_uv.x, old_uv.y, radius);
    let new_cartesian = uv_to_cartesian(new_uv.x, new_uv.y, radius);
    let moved = *position + (new_cartesian - old_cartesian);

    // A displacement that cancels the position outright leaves no direction
    // to renormalize along; jump to the intended point instead.
    *position = if moved.length_squared() < DEGENERATE_SQ {
        new_cartesian
    } else {
        moved.normalize() * radius
    };
    cartesian_to_uv(*position, radius)
}

// ============================================================================
// HOMING MODE
// ============================================================================

/// Advance a homing projectile one frame.
///
/// The great-circle tangent toward `target` is blended into `heading` at
/// `turn_rate` (fraction per reference frame, clamped to [0,1] after frame
/// scaling), the projectile is displaced by `heading · speed · dt`, the
/// position renormalized, and the heading re-projected onto the tangent
/// plane at the new position so it never tilts off the surface.
///
/// `speed` is in world units per second. Non-finite inputs and non-positive
/// `speed`/`delta_ms` are a no-op.
pub fn steer_homing(
    position: &mut DVec3,
    heading: &mut DVec3,
    target: DVec3,
    speed: f64,
    turn_rate: f64,
    radius: f64,
    delta_ms: f64,
) -> DVec2 {
    let usable = delta_ms.is_finite()
        && delta_ms > 0.0
        && speed.is_finite()
        && speed > 0.0
        && turn_rate.is_finite()
        && radius.is_finite()
        && radius > 0.0
        && position.is_finite()
        && heading.is_finite()
        && target.is_finite()
        && position.length_squared() >= DEGENERATE_SQ;
    if !usable {
        return cartesian_to_uv(*position, radius);
    }

    let blend = (turn_rate * delta_ms / REFERENCE_FRAME_MS).clamp(0.0, 1.0);
    let desired = compute_tangent_direction(*position, target);
    let steered = if desired == DVec3::ZERO {
        *heading
    } else {
        heading.lerp(desired, blend)
    };
    let steered = if steered.length_squared() < DEGENERATE_SQ {
        desired
    } else {
        steered.normalize()
    };

    let moved = *position + steered * speed * (delta_ms / 1000.0);
    if moved.length_squared() >= DEGENERATE_SQ {
        *position = moved.normalize() * radius;
    }

    // Keep the heading in the tangent plane of wherever we ended up.
    let normal = *position / radius;
    let projected = steered - normal * steered.dot(normal);
    *heading = if projected.length_squared() < DEGENERATE_SQ {
        compute_tangent_direction(*position, target)
    } else {
        projected.normalize()
    };

    cartesian_to_uv(*position, radius)
}
