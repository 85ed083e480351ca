// Core ECS components for the engine
// These are reusable across any game whose agents live on the sphere

use bevy_ecs::prelude::*;
use glam::{DVec2, DVec3};

use super::coords::uv_to_cartesian;

/// Position of an entity in 3D space
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_position(position: DVec3) -> Self {
        Self { position }
    }

    /// Place an entity by its legacy flat address.
    pub fn from_uv(u: f64, v: f64, radius: f64) -> Self {
        Self {
            position: uv_to_cartesian(u, v, radius),
        }
    }
}

/// Movement tuning for an agent steered along the surface.
/// `speed_scale` multiplies the engine's base angular speed.
#[derive(Component, Debug, Clone, Copy)]
pub struct SurfaceAgent {
    pub speed_scale: f64,
}

impl Default for SurfaceAgent {
    fn default() -> Self {
        Self { speed_scale: 1.0 }
    }
}

/// Cached route and follow state.
///
/// Owned by the agent entity and discarded with it; the engine never keeps
/// path state of its own. `last_replan_ms` lets the seek system decide when
/// the cache has gone stale.
#[derive(Component, Debug, Clone, Default)]
pub struct AgentPath {
    pub waypoints: Vec<DVec2>,
    pub cursor: usize,
    pub last_replan_ms: f64,
}

impl AgentPath {
    /// Replace the cached route. The first waypoint is the agent's own
    /// (sanitized) position, so the cursor starts on the one after it.
    pub fn reset(&mut self, waypoints: Vec<DVec2>, now_ms: f64) {
        self.cursor = if waypoints.len() > 1 { 1 } else { 0 };
        self.waypoints = waypoints;
        self.last_replan_ms = now_ms;
    }

    pub fn current_waypoint(&self) -> Option<DVec2> {
        self.waypoints.get(self.cursor).copied()
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// True once every waypoint has been consumed (or nothing was cached).
    pub fn exhausted(&self) -> bool {
        self.cursor >= self.waypoints.len()
    }
}

/// What an agent is doing this tick.
///
/// Tagged variants instead of an update/die class hierarchy: each variant is
/// its own little state machine and the systems layer dispatches on the tag.
#[derive(Component, Debug, Clone, Copy)]
pub enum AgentBehavior {
    /// Route toward a flat-space goal through the navigator, replanning when
    /// the cached path goes stale or runs out.
    Seek { goal: DVec2 },
    /// Hold position. Still ticks lifetime/death bookkeeping.
    Hold,
}

/// Projectile steering state.
#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile {
    pub motion: ProjectileMotion,
}

/// How a projectile moves.
#[derive(Debug, Clone, Copy)]
pub enum ProjectileMotion {
    /// Legacy flat-space velocity, applied as a tangent-plane displacement.
    Flat { intended: DVec2, delta: DVec2 },
    /// Homing: heading re-aimed at `target` every tick at `turn_rate`,
    /// travelling at `speed` world units per second.
    Homing {
        heading: DVec3,
        target: DVec3,
        speed: f64,
        turn_rate: f64,
    },
}

/// Remaining lifetime in milliseconds; the lifetime system despawns the
/// entity when it runs out and reports it for death effects.
#[derive(Component, Debug, Clone, Copy)]
pub struct Lifetime {
    pub remaining_ms: f64,
}
