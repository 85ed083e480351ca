// Per-tick systems for agents and projectiles.
// The frame owner calls these in tick order: obstacles are registered first,
// then the movement systems run, then positions are read back for rendering.
// Everything is synchronous; a call either completes or no-ops.

use bevy_ecs::prelude::*;
use glam::DVec2;

use super::components::{
    AgentBehavior, AgentPath, Lifetime, Projectile, ProjectileMotion, SurfaceAgent, Transform,
};
use super::coords::{cartesian_to_uv, uv_to_cartesian};
use super::motion::move_towards;
use super::navigation::Navigator;
use super::projectile::{steer_homing, step_flat};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Cached paths older than this are recomputed even if waypoints remain —
/// the world (obstacles, moving goals) changes under the path.
pub const REPLAN_INTERVAL_MS: f64 = 1500.0;

/// Angular slack (radians) within which a waypoint counts as reached.
pub const WAYPOINT_ANGLE: f64 = 0.02;

// ============================================================================
// AGENT SEEK
// ============================================================================

/// Drive every `Seek` agent one frame along its cached route, replanning
/// through the navigator when the cache is empty, exhausted, or stale.
pub fn agent_seek_system(
    world: &mut World,
    navigator: &mut Navigator,
    now_ms: f64,
    delta_ms: f64,
) {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return;
    }
    let radius = navigator.sphere_radius();

    let mut query =
        world.query::<(&mut Transform, &mut AgentPath, &SurfaceAgent, &AgentBehavior)>();
    for (mut transform, mut path, agent, behavior) in query.iter_mut(world) {
        let goal = match behavior {
            AgentBehavior::Seek { goal } => *goal,
            AgentBehavior::Hold => continue,
        };

        let current_uv = cartesian_to_uv(transform.position, radius);
        let stale = now_ms - path.last_replan_ms >= REPLAN_INTERVAL_MS;
        if path.waypoints.is_empty() || path.exhausted() || stale {
            let waypoints = navigator.find_path(current_uv, goal);
            path.reset(waypoints, now_ms);
        }

        if let Some(waypoint) = path.current_waypoint() {
            let target = uv_to_cartesian(waypoint.x, waypoint.y, radius);
            move_towards(
                &mut transform.position,
                target,
                agent.speed_scale,
                radius,
                delta_ms,
            );
            // Small-angle chord: close enough counts as arrived.
            if transform.position.distance(target) <= radius * WAYPOINT_ANGLE {
                path.advance();
            }
        }
    }
}

// ============================================================================
// PROJECTILES
// ============================================================================

/// Step every projectile one frame in its steering mode.
pub fn projectile_system(world: &mut World, navigator: &Navigator, delta_ms: f64) {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return;
    }
    let radius = navigator.sphere_radius();

    let mut query = world.query::<(&mut Transform, &mut Projectile)>();
    for (mut transform, mut projectile) in query.iter_mut(world) {
        match &mut projectile.motion {
            ProjectileMotion::Flat { intended, delta } => {
                let delta: DVec2 = *delta;
                step_flat(&mut transform.position, intended, delta, radius, delta_ms);
            }
            ProjectileMotion::Homing {
                heading,
                target,
                speed,
                turn_rate,
            } => {
                steer_homing(
                    &mut transform.position,
                    heading,
                    *target,
                    *speed,
                    *turn_rate,
                    radius,
                    delta_ms,
                );
            }
        }
    }
}

// ============================================================================
// LIFETIME
// ============================================================================

/// Count down lifetimes and despawn whatever expired. The expired entities
/// come back to the caller, which runs its own death effects (scoring,
/// spawn-on-death, event scheduling) against them.
pub fn lifetime_system(world: &mut World, delta_ms: f64) -> Vec<Entity> {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return Vec::new();
    }

    let mut expired = Vec::new();
    let mut query = world.query::<(Entity, &mut Lifetime)>();
    for (entity, mut lifetime) in query.iter_mut(world) {
        lifetime.remaining_ms -= delta_ms;
        if lifetime.remaining_ms <= 0.0 {
            expired.push(entity);
        }
    }
    for &entity in &expired {
        world.despawn(entity);
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_seek_agent_walks_to_goal() {
        let mut world = World::new();
        let mut navigator = Navigator::new();
        navigator.build_mesh(3, 1.0);

        let goal = DVec2::new(0.25, 0.5);
        let entity = world
            .spawn((
                Transform::from_uv(0.0, 0.5, 1.0),
                AgentPath::default(),
                SurfaceAgent { speed_scale: 2.0 },
                AgentBehavior::Seek { goal },
            ))
            .id();

        let mut now = 0.0;
        for _ in 0..2000 {
            agent_seek_system(&mut world, &mut navigator, now, 16.0);
            now += 16.0;
        }

        let transform = world.get::<Transform>(entity).unwrap();
        let goal_cartesian = uv_to_cartesian(goal.x, goal.y, 1.0);
        assert!((transform.position.length() - 1.0).abs() < 1e-6);
        assert!(
            transform.position.distance(goal_cartesian) < 0.05,
            "agent ended {:?}, wanted near {:?}",
            transform.position,
            goal_cartesian
        );
    }

    #[test]
    fn test_seek_replans_when_stale() {
        let mut world = World::new();
        let mut navigator = Navigator::new();

        let entity = world
            .spawn((
                Transform::from_uv(0.0, 0.5, 1.0),
                AgentPath::default(),
                SurfaceAgent::default(),
                AgentBehavior::Seek {
                    goal: DVec2::new(0.5, 0.5),
                },
            ))
            .id();

        agent_seek_system(&mut world, &mut navigator, 0.0, 16.0);
        assert_eq!(world.get::<AgentPath>(entity).unwrap().last_replan_ms, 0.0);

        // Inside the interval: no replan.
        agent_seek_system(&mut world, &mut navigator, 500.0, 16.0);
        assert_eq!(world.get::<AgentPath>(entity).unwrap().last_replan_ms, 0.0);

        // Past the interval: fresh plan stamped with the new clock.
        agent_seek_system(&mut world, &mut navigator, 2000.0, 16.0);
        assert_eq!(
            world.get::<AgentPath>(entity).unwrap().last_replan_ms,
            2000.0
        );
    }

    #[test]
    fn test_hold_agents_stay_put() {
        let mut world = World::new();
        let mut navigator = Navigator::new();

        let entity = world
            .spawn((
                Transform::from_uv(0.1, 0.4, 1.0),
                AgentPath::default(),
                SurfaceAgent::default(),
                AgentBehavior::Hold,
            ))
            .id();
        let before = world.get::<Transform>(entity).unwrap().position;

        for _ in 0..10 {
            agent_seek_system(&mut world, &mut navigator, 0.0, 16.0);
        }
        assert_eq!(world.get::<Transform>(entity).unwrap().position, before);
    }

    #[test]
    fn test_projectile_system_steps_both_modes() {
        let mut world = World::new();
        let navigator = Navigator::new();
        let radius = navigator.sphere_radius();

        let flat = world
            .spawn((
                Transform::from_uv(0.0, 0.5, radius),
                Projectile {
                    motion: ProjectileMotion::Flat {
                        intended: DVec2::new(0.0, 0.5),
                        delta: DVec2::new(0.01, 0.0),
                    },
                },
            ))
            .id();
        let homing = world
            .spawn((
                Transform::from_uv(0.5, 0.5, radius),
                Projectile {
                    motion: ProjectileMotion::Homing {
                        heading: DVec3::Y,
                        target: uv_to_cartesian(0.5, 0.2, radius),
                        speed: 0.5,
                        turn_rate: 0.3,
                    },
                },
            ))
            .id();

        let flat_before = world.get::<Transform>(flat).unwrap().position;
        let homing_before = world.get::<Transform>(homing).unwrap().position;

        projectile_system(&mut world, &navigator, 16.0);

        let flat_after = world.get::<Transform>(flat).unwrap().position;
        let homing_after = world.get::<Transform>(homing).unwrap().position;
        assert_ne!(flat_after, flat_before);
        assert_ne!(homing_after, homing_before);
        assert!((flat_after.length() - radius).abs() < 1e-6);
        assert!((homing_after.length() - radius).abs() < 1e-6);
    }

    #[test]
    fn test_lifetime_system_despawns_and_reports() {
        let mut world = World::new();
        let short = world.spawn(Lifetime { remaining_ms: 20.0 }).id();
        let long = world.spawn(Lifetime { remaining_ms: 500.0 }).id();

        assert!(lifetime_system(&mut world, 16.0).is_empty());
        let expired = lifetime_system(&mut world, 16.0);
        assert_eq!(expired, vec![short]);
        assert!(world.get::<Lifetime>(short).is_none());
        assert!(world.get::<Lifetime>(long).is_some());
    }
}
