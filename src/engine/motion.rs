// Great-circle motion integration.
// See docs/research/spherical-navigation.md §"Motion" for the constants.
//
// Positions are advanced by rotating about the axis perpendicular to
// (position, target), never by adding a straight-line velocity: the step can
// therefore never leave the surface, and an explicit renormalize on every
// call eats whatever floating-point drift the rotation introduces.

use glam::{DQuat, DVec2, DVec3};

use super::coords::cartesian_to_uv;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Fraction of the remaining arc covered per reference frame at speed
/// scale 1. Exponential ease-in: the step is proportional to the remaining
/// angular distance, so motion decelerates smoothly into the target.
pub const BASE_ANGULAR_SPEED: f64 = 0.06;

/// Frame the speed constants are calibrated against (62.5 Hz).
pub const REFERENCE_FRAME_MS: f64 = 16.0;

/// Angular distances below this snap straight onto the target, ending the
/// approach instead of asymptoting through ever-smaller micro-steps.
pub const SNAP_ANGLE: f64 = 1e-5;

/// Squared-length floor below which a vector has no usable direction.
const DEGENERATE_SQ: f64 = 1e-12;

// ============================================================================
// TANGENT DIRECTION
// ============================================================================

/// Unit tangent at `from` pointing along the great circle toward `to`.
///
/// Degenerate inputs resolve deterministically instead of producing NaN:
/// near-zero vectors return zero; parallel/antiparallel pairs (no unique
/// great circle — poles, antipodes) fall back to world-up × from, then
/// world-right × from.
pub fn compute_tangent_direction(from: DVec3, to: DVec3) -> DVec3 {
    if !from.is_finite()
        || !to.is_finite()
        || from.length_squared() < DEGENERATE_SQ
        || to.length_squared() < DEGENERATE_SQ
    {
        return DVec3::ZERO;
    }
    let n_from = from.normalize();
    let n_to = to.normalize();

    let axis = n_from.cross(n_to);
    if axis.length_squared() < DEGENERATE_SQ {
        let mut fallback = DVec3::Y.cross(n_from);
        if fallback.length_squared() < DEGENERATE_SQ {
            fallback = DVec3::X.cross(n_from);
        }
        return fallback.normalize();
    }
    axis.cross(n_from).normalize()
}

/// Rotation axis for stepping `n_pos` toward `n_tgt`, with the same fallback
/// ladder as `compute_tangent_direction` for the antipodal case.
#[inline]
fn rotation_axis(n_pos: DVec3, n_tgt: DVec3) -> DVec3 {
    let axis = n_pos.cross(n_tgt);
    if axis.length_squared() >= DEGENERATE_SQ {
        return axis.normalize();
    }
    let fallback = DVec3::Y.cross(n_pos);
    if fallback.length_squared() >= DEGENERATE_SQ {
        fallback.normalize()
    } else {
        DVec3::X.cross(n_pos).normalize()
    }
}

// ============================================================================
// FRAME STEP
// ============================================================================

/// Advance `position` one frame along the great circle toward `target`,
/// mutating it in place, and return the resulting flat (u,v) for callers
/// still addressing entities in flat space.
///
/// No-ops (position untouched, current flat coordinates returned) when
/// `delta_ms`, `speed_scale` or `radius` is non-positive or non-finite, or
/// when either vector is non-finite or has no direction. Within `SNAP_ANGLE`
/// of the target the position snaps onto the target's direction at `radius`.
/// Every successful step renormalizes to exactly `radius`.
pub fn move_towards(
    position: &mut DVec3,
    target: DVec3,
    speed_scale: f64,
    radius: f64,
    delta_ms: f64,
) -> DVec2 {
    let usable = delta_ms.is_finite()
        && delta_ms > 0.0
        && speed_scale.is_finite()
        && speed_scale > 0.0
        && radius.is_finite()
        && radius > 0.0
        && position.is_finite()
        && target.is_finite()
        && position.length_squared() >= DEGENERATE_SQ
        && target.length_squared() >= DEGENERATE_SQ;
    if !usable {
        return cartesian_to_uv(*position, radius);
    }

    let n_pos = position.normalize();
    let n_tgt = target.normalize();
    let angular_distance = n_pos.dot(n_tgt).clamp(-1.0, 1.0).acos();

    if angular_distance < SNAP_ANGLE {
        *position = n_tgt * radius;
        return cartesian_to_uv(*position, radius);
    }

    // Step is a fraction of the remaining arc, capped so the target is never
    // overshot regardless of frame spikes.
    let fraction = BASE_ANGULAR_SPEED * speed_scale * delta_ms / REFERENCE_FRAME_MS;
    let step = angular_distance.min(angular_distance * fraction);

    let axis = rotation_axis(n_pos, n_tgt);
    *position = DQuat::from_axis_angle(axis, step) * *position;
    *position = position.normalize() * radius;
    cartesian_to_uv(*position, radius)
}
