// Geodesic sphere mesh — surface node graph for pathfinding.
// See docs/research/spherical-navigation.md for algorithm decisions.
//
// Each subdivision level splits every icosahedron triangle into 4, with the
// new midpoints pushed back out to the sphere. Welding shared corners gives
// the closed-mesh vertex count 10·4^level + 2:
//   Level 0:    12 nodes,   20 faces
//   Level 1:    42 nodes,   80 faces
//   Level 2:   162 nodes,  320 faces
//   Level 3:   642 nodes, 1280 faces  ← default pathfinding mesh
//
// Built at startup (or on explicit reconfiguration) and never per-frame.

use glam::DVec3;
use log::debug;
use std::collections::HashMap;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Hard cap on subdivision depth. Level 6 is 40k nodes, already far more
/// than the A* layer wants to search per frame; anything deeper is clamped
/// rather than allowed to stall startup.
pub const MAX_SUBDIVISION_LEVEL: u32 = 6;

/// Weld threshold for corners shared across faces, in unit-sphere units.
/// Neighboring nodes are never closer than ~0.01 even at the deepest level,
/// so 1e-6 merges only true duplicates.
const WELD_EPSILON: f64 = 1e-6;

// ============================================================================
// GEODESIC MESH
// ============================================================================

/// Node graph on the sphere's surface.
///
/// Storage is struct-of-arrays: `positions[i]` is node i's Cartesian position
/// (length = `radius`), `neighbors[i]` its adjacent node indices, sorted
/// ascending. The graph is undirected and connected for every mesh this
/// builder produces.
pub struct GeodesicMesh {
    pub positions: Vec<DVec3>,
    pub neighbors: Vec<Vec<usize>>,
    pub subdivision_level: u32,
    pub radius: f64,
}

impl GeodesicMesh {
    /// Build a geodesic mesh by subdividing an icosahedron `subdivision_level`
    /// times. Identical inputs always produce identical node ordering and
    /// adjacency — the builder has no randomness and welds in face-traversal
    /// order.
    ///
    /// A non-finite or non-positive `radius` degrades to 1.0.
    pub fn build(subdivision_level: u32, radius: f64) -> Self {
        let level = subdivision_level.min(MAX_SUBDIVISION_LEVEL);
        let radius = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            1.0
        };

        // ---- Phase 0: icosahedron faces as unit-sphere triangles -----------
        let (base_positions, base_faces) = icosahedron();
        let mut triangles: Vec<[DVec3; 3]> = base_faces
            .iter()
            .map(|&[a, b, c]| [base_positions[a], base_positions[b], base_positions[c]])
            .collect();

        // ---- Phase 1: midpoint subdivision ---------------------------------
        // Midpoints of a shared edge are computed from the same two endpoint
        // values on both sides, so they come out bit-identical and the weld
        // pass below merges them exactly.
        for _ in 0..level {
            let mut next = Vec::with_capacity(triangles.len() * 4);
            for [a, b, c] in &triangles {
                let ab = midpoint_on_sphere(*a, *b);
                let bc = midpoint_on_sphere(*b, *c);
                let ca = midpoint_on_sphere(*c, *a);
                next.push([*a, ab, ca]);
                next.push([ab, *b, bc]);
                next.push([ca, bc, *c]);
                next.push([ab, bc, ca]);
            }
            triangles = next;
        }

        // ---- Phase 2: weld shared corners ----------------------------------
        // Quantized-position map: corners within WELD_EPSILON collapse to the
        // first index that claimed the cell.
        let mut index_of: HashMap<[i64; 3], usize> = HashMap::new();
        let mut positions: Vec<DVec3> = Vec::new();
        let mut faces: Vec<[usize; 3]> = Vec::with_capacity(triangles.len());
        for tri in &triangles {
            let mut face = [0usize; 3];
            for (slot, corner) in tri.iter().enumerate() {
                let key = quantize(*corner);
                let idx = *index_of.entry(key).or_insert_with(|| {
                    positions.push(*corner);
                    positions.len() - 1
                });
                face[slot] = idx;
            }
            faces.push(face);
        }

        // ---- Phase 3: undirected adjacency from face edges -----------------
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
        for &[a, b, c] in &faces {
            for (i, j) in [(a, b), (b, c), (c, a)] {
                if !neighbors[i].contains(&j) {
                    neighbors[i].push(j);
                }
                if !neighbors[j].contains(&i) {
                    neighbors[j].push(i);
                }
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }

        // ---- Phase 4: scale out to the requested radius --------------------
        for p in &mut positions {
            *p *= radius;
        }

        debug!(
            "geodesic mesh built: level={} nodes={} radius={}",
            level,
            positions.len(),
            radius
        );

        Self {
            positions,
            neighbors,
            subdivision_level: level,
            radius,
        }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn position(&self, node: usize) -> DVec3 {
        self.positions[node]
    }

    #[inline]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }

    /// Index of the node closest (Euclidean) to `position`.
    ///
    /// Strict `<` keeps the lowest index on exact ties, so the result is
    /// deterministic for deterministic input. A non-finite query compares
    /// false against everything and lands on node 0.
    pub fn nearest_node(&self, position: DVec3) -> usize {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, p) in self.positions.iter().enumerate() {
            let d = p.distance_squared(position);
            if d < best_dist {
                best_dist = d;
                best = idx;
            }
        }
        best
    }
}

// ============================================================================
// ICOSAHEDRON + MIDPOINT HELPERS
// ============================================================================

/// The 12 vertices / 20 faces of a unit icosahedron.
/// Vertex and face order is fixed — node ordering of every built mesh
/// derives from it.
fn icosahedron() -> (Vec<DVec3>, Vec<[usize; 3]>) {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let raw = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ];
    let positions = raw
        .iter()
        .map(|&(x, y, z)| DVec3::new(x, y, z).normalize())
        .collect();
    let faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (positions, faces)
}

/// Midpoint of two unit-sphere points, pushed back onto the sphere.
#[inline]
fn midpoint_on_sphere(a: DVec3, b: DVec3) -> DVec3 {
    ((a + b) * 0.5).normalize()
}

/// Quantize a unit-sphere position to a weld cell.
#[inline]
fn quantize(p: DVec3) -> [i64; 3] {
    [
        (p.x / WELD_EPSILON).round() as i64,
        (p.y / WELD_EPSILON).round() as i64,
        (p.z / WELD_EPSILON).round() as i64,
    ]
}
