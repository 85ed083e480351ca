// Obstacle-aware pathfinding over the geodesic mesh.
// See docs/research/spherical-navigation.md for architecture decisions.
//
// Layer 1: ObstacleRegistry — per-tick circular exclusion zones in (u,v).
// Layer 2: A* over the mesh node graph (point-to-point, chord-cost).
// Layer 3: Navigator — the engine context that owns mesh + obstacles +
//          config, passed by reference into every call. No module globals,
//          so independent simulations never share state.

use bevy_ecs::prelude::Resource;
use glam::{DVec2, DVec3};
use log::debug;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::coords::{cartesian_to_uv, sanitize_uv, uv_to_cartesian};
use super::mesh::GeodesicMesh;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Subdivision level of the lazily built default mesh (642 nodes).
pub const DEFAULT_SUBDIVISION_LEVEL: u32 = 3;
/// Radius of the lazily built default mesh.
pub const DEFAULT_SPHERE_RADIUS: f64 = 1.0;

// ============================================================================
// OBSTACLE REGISTRY
// ============================================================================

/// A circular exclusion zone. `center` is flat (u,v); `radius` is in flat
/// units on the v scale, so a radius of 0.5 spans a quarter of the sphere
/// whatever the latitude.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleCircle {
    pub center: DVec2,
    pub radius: f64,
}

/// The active obstacle set for the current tick.
///
/// Lifetime is owned entirely by the caller: there is no TTL and nothing is
/// garbage-collected by time. A persistent obstacle must be re-inserted
/// every tick; `clear` is the only way entries leave the set.
#[derive(Debug, Default)]
pub struct ObstacleRegistry {
    obstacles: Vec<ObstacleCircle>,
}

impl ObstacleRegistry {
    /// Append an obstacle. The center is sanitized on insert; a non-finite
    /// or non-positive radius inserts nothing.
    pub fn add(&mut self, u: f64, v: f64, radius: f64) {
        if !radius.is_finite() || radius <= 0.0 {
            debug!("ignoring obstacle with unusable radius {radius}");
            return;
        }
        self.obstacles.push(ObstacleCircle {
            center: sanitize_uv(u, v),
            radius,
        });
    }

    /// Empty the active set.
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// True if `position` (a Cartesian point on a sphere of `sphere_radius`)
    /// lies within any obstacle.
    ///
    /// Centers are stored flat but compared in 3-D: each center converts to
    /// its Cartesian position and the obstacle's flat radius becomes an
    /// angular radius (× π, the v scale), compared as chord length. Flat
    /// Euclidean distance would stretch obstacles near the poles.
    pub fn is_blocked(&self, position: DVec3, sphere_radius: f64) -> bool {
        self.obstacles.iter().any(|obstacle| {
            let center = uv_to_cartesian(obstacle.center.x, obstacle.center.y, sphere_radius);
            let angular = (obstacle.radius * std::f64::consts::PI).min(std::f64::consts::PI);
            let chord = 2.0 * sphere_radius * (angular * 0.5).sin();
            position.distance(center) <= chord
        })
    }
}

// ============================================================================
// A* SEARCH
// ============================================================================

/// Open-set entry. Ordered so the binary heap pops the lowest f-cost first,
/// with insertion sequence as the tie-break — equal-cost candidates expand
/// in the order they were discovered, keeping the search stable.
struct OpenEntry {
    f_cost: f64,
    seq: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// A* from `start_uv` to `end_uv` over the mesh graph. Both endpoints must
/// already be sanitized (the `Navigator` front door does this).
///
/// Edge cost and heuristic are both Euclidean chord distance between node
/// positions. The heuristic is not provably admissible for true geodesic
/// distance under every obstacle layout — it is a gameplay-grade bound, and
/// the path it yields is "good enough", not certified shortest.
///
/// Never fails: if the open set drains without reaching the goal, the
/// two-point fallback `[start, end]` comes back so callers always have a
/// direction to steer toward.
fn find_path_on_mesh(
    mesh: &GeodesicMesh,
    obstacles: &ObstacleRegistry,
    start_uv: DVec2,
    end_uv: DVec2,
) -> Vec<DVec2> {
    let start_node = mesh.nearest_node(uv_to_cartesian(start_uv.x, start_uv.y, mesh.radius));
    let goal_node = mesh.nearest_node(uv_to_cartesian(end_uv.x, end_uv.y, mesh.radius));
    let goal_pos = mesh.position(goal_node);

    // Blocked set for this query. The endpoints are exempt so a path attempt
    // is always made even when an agent stands inside an obstacle.
    let mut blocked: Vec<bool> = mesh
        .positions
        .iter()
        .map(|p| obstacles.is_blocked(*p, mesh.radius))
        .collect();
    blocked[start_node] = false;
    blocked[goal_node] = false;

    let n = mesh.node_count();
    let mut g_cost = vec![f64::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    g_cost[start_node] = 0.0;
    open.push(OpenEntry {
        f_cost: mesh.position(start_node).distance(goal_pos),
        seq,
        node: start_node,
    });

    let mut reached = false;
    while let Some(OpenEntry { node, .. }) = open.pop() {
        if node == goal_node {
            reached = true;
            break;
        }
        if closed[node] {
            continue;
        }
        closed[node] = true;

        for &neighbor in mesh.neighbors(node) {
            if blocked[neighbor] || closed[neighbor] {
                continue;
            }
            let tentative = g_cost[node] + mesh.position(node).distance(mesh.position(neighbor));
            if tentative < g_cost[neighbor] {
                g_cost[neighbor] = tentative;
                came_from[neighbor] = node;
                seq += 1;
                open.push(OpenEntry {
                    f_cost: tentative + mesh.position(neighbor).distance(goal_pos),
                    seq,
                    node: neighbor,
                });
            }
        }
    }

    if !reached {
        debug!("no route {start_node}->{goal_node}; returning two-point fallback");
        return vec![start_uv, end_uv];
    }

    // Walk the predecessor chain back to the start node.
    let mut chain = vec![goal_node];
    let mut cursor = goal_node;
    while cursor != start_node {
        cursor = came_from[cursor];
        chain.push(cursor);
    }
    chain.reverse();

    // Interior nodes convert back to flat coordinates; the ends are the
    // caller's own sanitized start and goal, not the snapped node positions.
    let mut waypoints = Vec::with_capacity(chain.len().max(2));
    waypoints.push(start_uv);
    for &node in &chain[1..chain.len().saturating_sub(1)] {
        waypoints.push(cartesian_to_uv(mesh.position(node), mesh.radius));
    }
    waypoints.push(end_uv);
    waypoints
}

// ============================================================================
// NAVIGATOR — ENGINE CONTEXT
// ============================================================================

/// Mesh parameters for the `Navigator`.
#[derive(Debug, Clone, Copy)]
pub struct NavConfig {
    pub subdivision_level: u32,
    pub radius: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            subdivision_level: DEFAULT_SUBDIVISION_LEVEL,
            radius: DEFAULT_SPHERE_RADIUS,
        }
    }
}

/// The navigation context: mesh cache, obstacle set, and configuration,
/// owned together so independent simulations (parallel worlds, tests) never
/// contaminate each other.
///
/// Everything runs single-threaded inside one simulation tick; obstacles are
/// registered before the movement phase reads them, and no call yields
/// mid-search.
#[derive(Resource, Default)]
pub struct Navigator {
    mesh: Option<GeodesicMesh>,
    obstacles: ObstacleRegistry,
    config: NavConfig,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NavConfig) -> Self {
        Self {
            mesh: None,
            obstacles: ObstacleRegistry::default(),
            config,
        }
    }

    /// Build (or fully replace) the cached mesh. Startup-cost only: never
    /// call per-entity per-frame.
    pub fn build_mesh(&mut self, subdivision_level: u32, radius: f64) {
        let mesh = GeodesicMesh::build(subdivision_level, radius);
        self.config = NavConfig {
            subdivision_level: mesh.subdivision_level,
            radius: mesh.radius,
        };
        self.mesh = Some(mesh);
    }

    pub fn mesh(&self) -> Option<&GeodesicMesh> {
        self.mesh.as_ref()
    }

    /// Radius of the sphere agents live on.
    pub fn sphere_radius(&self) -> f64 {
        self.mesh.as_ref().map(|m| m.radius).unwrap_or(self.config.radius)
    }

    /// Register an obstacle for this tick's queries.
    pub fn add_obstacle(&mut self, u: f64, v: f64, radius: f64) {
        self.obstacles.add(u, v, radius);
    }

    /// Drop all registered obstacles. Callers do this once per tick before
    /// re-registering whatever is still solid.
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    pub fn obstacles(&self) -> &ObstacleRegistry {
        &self.obstacles
    }

    /// Obstacle-aware route from `start_uv` to `end_uv`.
    ///
    /// Both endpoints are sanitized first; the first and last waypoints of
    /// the result are exactly those sanitized values, and the result always
    /// has at least two entries. Builds the default mesh lazily if
    /// `build_mesh` was never called.
    pub fn find_path(&mut self, start_uv: DVec2, end_uv: DVec2) -> Vec<DVec2> {
        let start = sanitize_uv(start_uv.x, start_uv.y);
        let end = sanitize_uv(end_uv.x, end_uv.y);
        if self.mesh.is_none() {
            self.build_mesh(self.config.subdivision_level, self.config.radius);
        }
        let mesh = self.mesh.as_ref().expect("mesh built above");
        find_path_on_mesh(mesh, &self.obstacles, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::coords::V_EPSILON;

    #[test]
    fn test_same_point_path_has_two_waypoints() {
        let mut nav = Navigator::new();
        let p = DVec2::new(0.3, 0.4);
        let path = nav.find_path(p, p);
        assert!(path.len() >= 2);
        assert_eq!(path[0], p);
        assert_eq!(path[path.len() - 1], p);
    }

    #[test]
    fn test_endpoints_are_sanitized_start_and_goal() {
        let mut nav = Navigator::new();
        let path = nav.find_path(DVec2::new(-0.25, 1.4), DVec2::new(1.75, -3.0));
        let first = path[0];
        let last = path[path.len() - 1];
        assert!((first.x - 0.75).abs() < 1e-12);
        assert!((first.y - (1.0 - V_EPSILON)).abs() < 1e-12);
        assert!((last.x - 0.75).abs() < 1e-12);
        assert!((last.y - V_EPSILON).abs() < 1e-12);
    }

    #[test]
    fn test_lazy_default_mesh() {
        let mut nav = Navigator::new();
        assert!(nav.mesh().is_none());
        nav.find_path(DVec2::new(0.0, 0.5), DVec2::new(0.5, 0.5));
        assert_eq!(nav.mesh().unwrap().node_count(), 642);
    }

    #[test]
    fn test_obstacle_forces_detour() {
        let mut nav = Navigator::new();
        nav.build_mesh(2, 1.0);
        let start = DVec2::new(0.0, 0.0);
        let goal = DVec2::new(0.5, 0.5);

        let baseline = nav.find_path(start, goal);
        assert!(baseline.len() > 2, "route should cross several nodes");

        let midpoint = baseline[baseline.len() / 2];
        nav.add_obstacle(midpoint.x, midpoint.y, 0.2);
        let detour = nav.find_path(start, goal);

        assert!(
            detour.len() > baseline.len(),
            "detour {} should be longer than baseline {}",
            detour.len(),
            baseline.len()
        );
    }

    #[test]
    fn test_unreachable_goal_falls_back_to_two_points() {
        let mut nav = Navigator::new();
        nav.build_mesh(2, 1.0);
        // Radius 1.0 → angular radius π → the whole sphere is blocked; only
        // the exempt endpoints survive, and they are not adjacent.
        nav.add_obstacle(0.0, 0.5, 1.0);
        let start = DVec2::new(0.0, 0.5);
        let goal = DVec2::new(0.5, 0.5);
        let path = nav.find_path(start, goal);
        assert_eq!(path, vec![start, goal]);
    }

    #[test]
    fn test_is_blocked_uses_chordal_distance() {
        let mut registry = ObstacleRegistry::default();
        registry.add(0.25, 0.5, 0.05);
        let inside = uv_to_cartesian(0.25, 0.5, 1.0);
        let antipode = uv_to_cartesian(0.75, 0.5, 1.0);
        assert!(registry.is_blocked(inside, 1.0));
        assert!(!registry.is_blocked(antipode, 1.0));
    }

    #[test]
    fn test_bad_obstacle_radius_is_ignored() {
        let mut registry = ObstacleRegistry::default();
        registry.add(0.5, 0.5, f64::NAN);
        registry.add(0.5, 0.5, -1.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_navigators_do_not_share_state() {
        let mut a = Navigator::new();
        let mut b = Navigator::new();
        a.build_mesh(2, 1.0);
        b.build_mesh(2, 1.0);
        let start = DVec2::new(0.0, 0.0);
        let goal = DVec2::new(0.5, 0.5);

        let baseline = b.find_path(start, goal);
        let midpoint = baseline[baseline.len() / 2];
        a.add_obstacle(midpoint.x, midpoint.y, 0.2);

        // b's registry is untouched by a's obstacle.
        assert_eq!(b.find_path(start, goal).len(), baseline.len());
    }
}
