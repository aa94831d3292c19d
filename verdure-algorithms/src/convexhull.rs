//! Incremental convex hull construction.
//!
//! The hull is grown point by point: faces visible from the new point are removed, the
//! horizon edges left behind are fanned to the new point. Construction starts from a
//! tetrahedron of extreme points, so degenerate inputs (coincident, collinear or coplanar
//! point sets) never reach the incremental loop and take explicit fallback paths instead.
//! A coplanar input yields a single-sided triangle fan over the planar hull, which is
//! deliberately not watertight so the volume stage reports it as such.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use verdure_core::mesh::TriangleMesh;
use verdure_core::nalgebra::Vector3;

/// Tolerance below which visibility and degeneracy predicates treat a value as zero
const EPSILON: f64 = 1e-10;

/// Strategy interface for convex hull construction, so the volume stage can swap hull
/// implementations without touching the rest of the pipeline
pub trait HullBuilder {
    /// Builds the convex hull of the given positions as a triangle mesh
    fn build_hull(&self, positions: &[Vector3<f64>]) -> TriangleMesh;
}

/// The default incremental hull construction
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalHull;

impl HullBuilder for IncrementalHull {
    fn build_hull(&self, positions: &[Vector3<f64>]) -> TriangleMesh {
        convex_hull_mesh(positions)
    }
}

#[derive(Clone, Copy)]
struct Triangle {
    a: usize,
    b: usize,
    c: usize,
    normal: Vector3<f64>,
}

#[derive(Eq, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b || self.a == other.b && self.b == other.a
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.a * self.b).hash(state);
    }
}

/// Computes the convex hull of the given positions as a triangle mesh
///
/// Hull faces are wound counter-clockwise seen from outside. Inputs that span no volume
/// produce degenerate meshes: a single vertex for coincident points, the two extreme
/// vertices for collinear points, and an open triangle fan for coplanar points. Only a
/// full-dimensional input produces a closed (watertight) mesh.
pub fn convex_hull_mesh(positions: &[Vector3<f64>]) -> TriangleMesh {
    if positions.is_empty() {
        return TriangleMesh::default();
    }

    let (lo, hi) = extreme_pair(positions);
    if (positions[hi] - positions[lo]).magnitude_squared() <= EPSILON * EPSILON {
        // all points coincide
        return TriangleMesh::from_vertices(vec![positions[0]]);
    }
    let line_origin = positions[lo];
    let line_dir = (positions[hi] - positions[lo]).normalize();

    let (line_apex, line_dist) = farthest_from_line(positions, line_origin, line_dir);
    if line_dist <= EPSILON {
        // collinear input, the two extreme points span the hull
        return TriangleMesh::from_vertices(vec![positions[lo], positions[hi]]);
    }

    let plane_normal =
        calc_normal(positions[lo], positions[hi], positions[line_apex]).normalize();
    let (plane_apex, plane_dist) = farthest_from_plane(positions, line_origin, plane_normal);
    if plane_dist.abs() <= EPSILON {
        // coplanar input, fan out the planar hull polygon
        return planar_fan_mesh(positions, line_origin, line_dir, plane_normal.cross(&line_dir));
    }

    let mut faces = seed_tetrahedron(positions, lo, hi, line_apex, plane_apex, plane_dist);
    for point_id in 0..positions.len() {
        if point_id == lo || point_id == hi || point_id == line_apex || point_id == plane_apex {
            continue;
        }
        grow_hull(positions, &mut faces, point_id);
    }
    mesh_from_triangles(positions, &faces)
}

/// Extends the hull by one point. Faces visible from the point are removed and the horizon
/// edges left behind are fanned to the point. For a point inside the hull no face is
/// visible and the hull stays as it is.
fn grow_hull(positions: &[Vector3<f64>], faces: &mut Vec<Triangle>, point_id: usize) {
    let point = positions[point_id];
    let mut outer_edges = HashSet::new();
    let mut inner_edges = HashSet::new();

    faces.retain(|tri| {
        let to_point = point - positions[tri.a];
        if to_point.dot(&tri.normal) > EPSILON {
            add_edge_to_outer_or_inner_edges(tri.a, tri.b, &mut outer_edges, &mut inner_edges);
            add_edge_to_outer_or_inner_edges(tri.b, tri.c, &mut outer_edges, &mut inner_edges);
            add_edge_to_outer_or_inner_edges(tri.c, tri.a, &mut outer_edges, &mut inner_edges);
            return false;
        }
        true
    });

    // horizon edges keep the winding of their removed face, so fanning them to the new
    // point preserves the outward orientation of the whole hull
    let mut horizon: Vec<Edge> = outer_edges.into_iter().collect();
    // fixed fan order keeps the face order independent of hash set iteration
    horizon.sort_unstable_by_key(|edge| (edge.a, edge.b));
    for edge in horizon {
        faces.push(Triangle {
            a: edge.a,
            b: edge.b,
            c: point_id,
            normal: calc_normal(positions[edge.a], positions[edge.b], point),
        });
    }
}

/// Builds the initial tetrahedron over the four extreme points. `plane_dist` is the signed
/// distance of the apex from the base plane and decides the base winding
fn seed_tetrahedron(
    positions: &[Vector3<f64>],
    a: usize,
    b: usize,
    c: usize,
    apex: usize,
    plane_dist: f64,
) -> Vec<Triangle> {
    // wind the base so its normal faces away from the apex
    let base = if plane_dist > 0.0 {
        Triangle {
            a,
            b: c,
            c: b,
            normal: calc_normal(positions[a], positions[c], positions[b]),
        }
    } else {
        Triangle {
            a,
            b,
            c,
            normal: calc_normal(positions[a], positions[b], positions[c]),
        }
    };
    // each side shares one base edge in reverse direction, keeping the winding consistent
    vec![
        base,
        Triangle {
            a: base.a,
            b: apex,
            c: base.b,
            normal: calc_normal(positions[base.a], positions[apex], positions[base.b]),
        },
        Triangle {
            a: base.b,
            b: apex,
            c: base.c,
            normal: calc_normal(positions[base.b], positions[apex], positions[base.c]),
        },
        Triangle {
            a: base.c,
            b: apex,
            c: base.a,
            normal: calc_normal(positions[base.c], positions[apex], positions[base.a]),
        },
    ]
}

/// Converts hull triangles over input indices into a compact mesh that only stores the
/// vertices actually on the hull
fn mesh_from_triangles(positions: &[Vector3<f64>], triangles: &[Triangle]) -> TriangleMesh {
    let mut used: Vec<usize> = triangles
        .iter()
        .flat_map(|tri| [tri.a, tri.b, tri.c])
        .collect();
    used.sort_unstable();
    used.dedup();

    let remap: HashMap<usize, usize> = used
        .iter()
        .enumerate()
        .map(|(new_id, &old_id)| (old_id, new_id))
        .collect();
    let vertices: Vec<Vector3<f64>> = used.iter().map(|&id| positions[id]).collect();
    let faces: Vec<Vector3<usize>> = triangles
        .iter()
        .map(|tri| Vector3::new(remap[&tri.a], remap[&tri.b], remap[&tri.c]))
        .collect();
    TriangleMesh::new(vertices, faces).expect("hull construction produced an invalid mesh")
}

/// Triangulates the hull of a coplanar point set as a fan over its boundary polygon.
/// The sheet is single sided on purpose: its boundary edges have no partner face, so the
/// watertightness check rejects it instead of mistaking a flat hull for a solid
fn planar_fan_mesh(
    positions: &[Vector3<f64>],
    origin: Vector3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
) -> TriangleMesh {
    let mut projected: Vec<(f64, f64, usize)> = positions
        .iter()
        .enumerate()
        .map(|(id, position)| {
            let offset = position - origin;
            (offset.dot(&u), offset.dot(&v), id)
        })
        .collect();
    projected.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0).then(lhs.1.total_cmp(&rhs.1)));
    projected.dedup_by(|lhs, rhs| lhs.0 == rhs.0 && lhs.1 == rhs.1);

    let ring = monotone_chain(&projected);
    let vertices: Vec<Vector3<f64>> = ring.iter().map(|&id| positions[id]).collect();
    if ring.len() < 3 {
        return TriangleMesh::from_vertices(vertices);
    }
    let faces: Vec<Vector3<usize>> = (1..ring.len() - 1)
        .map(|i| Vector3::new(0, i, i + 1))
        .collect();
    TriangleMesh::new(vertices, faces).expect("planar hull produced an invalid mesh")
}

/// Andrew's monotone chain over pre-sorted 2D points. Returns the hull polygon as a
/// counter-clockwise ring of input indices, with collinear boundary points dropped
fn monotone_chain(projected: &[(f64, f64, usize)]) -> Vec<usize> {
    fn cross(o: &(f64, f64, usize), a: &(f64, f64, usize), b: &(f64, f64, usize)) -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    }

    let mut lower: Vec<&(f64, f64, usize)> = Vec::new();
    for point in projected {
        while lower.len() >= 2
            && cross(lower[lower.len() - 2], lower[lower.len() - 1], point) <= EPSILON
        {
            lower.pop();
        }
        lower.push(point);
    }
    let mut upper: Vec<&(f64, f64, usize)> = Vec::new();
    for point in projected.iter().rev() {
        while upper.len() >= 2
            && cross(upper[upper.len() - 2], upper[upper.len() - 1], point) <= EPSILON
        {
            upper.pop();
        }
        upper.push(point);
    }

    // the chain endpoints appear in both halves
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower.into_iter().map(|point| point.2).collect()
}

/// Returns the index pair with the largest coordinate spread over all three axes
fn extreme_pair(positions: &[Vector3<f64>]) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_extent = -1.0;
    for axis in 0..3 {
        let mut lo = 0;
        let mut hi = 0;
        for (id, position) in positions.iter().enumerate() {
            if position[axis] < positions[lo][axis] {
                lo = id;
            }
            if position[axis] > positions[hi][axis] {
                hi = id;
            }
        }
        let extent = positions[hi][axis] - positions[lo][axis];
        if extent > best_extent {
            best_extent = extent;
            best = (lo, hi);
        }
    }
    best
}

fn farthest_from_line(
    positions: &[Vector3<f64>],
    origin: Vector3<f64>,
    dir: Vector3<f64>,
) -> (usize, f64) {
    let mut best = (0, 0.0);
    for (id, position) in positions.iter().enumerate() {
        let dist = (position - origin).cross(&dir).magnitude();
        if dist > best.1 {
            best = (id, dist);
        }
    }
    best
}

/// Returns the index with the largest absolute plane distance together with its signed
/// distance. The sign tells on which side of the plane the point lies
fn farthest_from_plane(
    positions: &[Vector3<f64>],
    origin: Vector3<f64>,
    unit_normal: Vector3<f64>,
) -> (usize, f64) {
    let mut best: (usize, f64) = (0, 0.0);
    for (id, position) in positions.iter().enumerate() {
        let dist = (position - origin).dot(&unit_normal);
        if dist.abs() > best.1.abs() {
            best = (id, dist);
        }
    }
    best
}

/// Adds the given edge to the set of outer edges. If the given edge is already contained
/// in the set of outer edges it is removed and added to the set of inner edges
fn add_edge_to_outer_or_inner_edges(
    a: usize,
    b: usize,
    outer_edges: &mut HashSet<Edge>,
    inner_edges: &mut HashSet<Edge>,
) {
    let e = Edge { a, b };
    if !outer_edges.insert(e) {
        outer_edges.remove(&e);
        inner_edges.insert(e);
    }
}

/// Calculates the normal of a triangle formed by three points
fn calc_normal(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Vector3<f64> {
    let ab: Vector3<f64> = b - a;
    let ac: Vector3<f64> = c - a;
    ab.cross(&ac)
}
