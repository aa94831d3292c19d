use std::collections::HashSet;

use anyhow::{anyhow, Result};
use nalgebra::Vector3;

/// Indexed triangle mesh
///
/// Vertices are positions in the same coordinate frame as the point cloud they were built
/// from, faces are triples of 0-based vertex indices. Hull construction produces meshes whose
/// faces are wound counter-clockwise when seen from outside, so face normals point away from
/// the enclosed region. Degenerate hulls (a single point, a segment, a flat patch) are still
/// representable, either without faces or as an open triangle sheet.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    vertices: Vec<Vector3<f64>>,
    faces: Vec<Vector3<usize>>,
}

impl TriangleMesh {
    /// Creates a mesh from the given vertices and faces. Returns an error if a face references
    /// a vertex index out of bounds or references the same vertex more than once
    pub fn new(vertices: Vec<Vector3<f64>>, faces: Vec<Vector3<usize>>) -> Result<Self> {
        for (index, face) in faces.iter().enumerate() {
            if face.x >= vertices.len() || face.y >= vertices.len() || face.z >= vertices.len() {
                return Err(anyhow!(
                    "Face {} references a vertex index out of bounds (mesh has {} vertices)",
                    index,
                    vertices.len()
                ));
            }
            if face.x == face.y || face.y == face.z || face.z == face.x {
                return Err(anyhow!(
                    "Face {} references the same vertex more than once",
                    index
                ));
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Creates a mesh that consists only of vertices, without any faces. Used for hulls of
    /// inputs that span no area (a single point, collinear points)
    pub fn from_vertices(vertices: Vec<Vector3<f64>>) -> Self {
        Self {
            vertices,
            faces: Vec::new(),
        }
    }

    /// Returns the vertices of this mesh
    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    /// Returns the faces of this mesh as triples of vertex indices
    pub fn faces(&self) -> &[Vector3<usize>] {
        &self.faces
    }

    /// Returns the number of vertices in this mesh
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of faces in this mesh
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if this mesh has neither vertices nor faces
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// Checks whether this mesh is a closed, consistently wound surface
    ///
    /// The check is purely combinatorial: every directed edge must occur exactly once and its
    /// reverse edge must occur as well. This holds exactly when every undirected edge is shared
    /// by two faces with opposite winding, so the surface has no boundary, no fold and no
    /// inconsistently oriented face. A mesh without faces is never watertight.
    pub fn is_watertight(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }
        let mut directed_edges: HashSet<(usize, usize)> =
            HashSet::with_capacity(self.faces.len() * 3);
        for face in &self.faces {
            for &edge in &[(face.x, face.y), (face.y, face.z), (face.z, face.x)] {
                if !directed_edges.insert(edge) {
                    // the same directed edge twice means a fold or inconsistent winding
                    return false;
                }
            }
        }
        directed_edges
            .iter()
            .all(|&(from, to)| directed_edges.contains(&(to, from)))
    }

    /// Computes the volume enclosed by this mesh as the sum of signed tetrahedron volumes
    /// spanned by each face and the vertex centroid
    ///
    /// The result is only meaningful for closed, consistently wound meshes; callers should gate
    /// on [is_watertight](TriangleMesh::is_watertight) first. Summing about the centroid keeps
    /// the individual tetrahedra small, so the result does not degrade for meshes far from the
    /// origin. Returns 0.0 for meshes without faces.
    pub fn enclosed_volume(&self) -> f64 {
        let centroid = match self.vertex_centroid() {
            Some(centroid) => centroid,
            None => return 0.0,
        };
        let signed_sum: f64 = self
            .faces
            .iter()
            .map(|face| {
                let a = self.vertices[face.x] - centroid;
                let b = self.vertices[face.y] - centroid;
                let c = self.vertices[face.z] - centroid;
                a.dot(&b.cross(&c))
            })
            .sum();
        signed_sum.abs() / 6.0
    }

    /// Computes the total area of all faces of this mesh
    pub fn surface_area(&self) -> f64 {
        self.faces
            .iter()
            .map(|face| {
                let ab = self.vertices[face.y] - self.vertices[face.x];
                let ac = self.vertices[face.z] - self.vertices[face.x];
                ab.cross(&ac).norm() * 0.5
            })
            .sum()
    }

    fn vertex_centroid(&self) -> Option<Vector3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, vertex| acc + vertex);
        Some(sum / self.vertices.len() as f64)
    }
}
