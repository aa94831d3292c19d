use nalgebra::Vector3;

use crate::math::AABB;

/// In-memory point cloud with an optional uniform display color
///
/// All processing stages operate on this container. Positions are stored in insertion order,
/// which filters are required to preserve. The color is a single RGB triple in `[0, 1]` that
/// applies to every point, mirroring how scanned vegetation is usually displayed as one tint.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    positions: Vec<Vector3<f64>>,
    color: Option<Vector3<f64>>,
}

impl PointCloud {
    /// Creates an empty point cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty point cloud with space for `capacity` points
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            color: None,
        }
    }

    /// Creates a point cloud from the given positions, keeping their order
    pub fn from_positions(positions: Vec<Vector3<f64>>) -> Self {
        Self {
            positions,
            color: None,
        }
    }

    /// Appends a single point to the end of this cloud
    pub fn push(&mut self, position: Vector3<f64>) {
        self.positions.push(position);
    }

    /// Returns the number of points in this cloud
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if this cloud contains no points
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the positions of this cloud as a slice, in insertion order
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    /// Returns an iterator over the positions of this cloud
    pub fn iter(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.positions.iter().copied()
    }

    /// Consumes this cloud and returns the raw positions
    pub fn into_positions(self) -> Vec<Vector3<f64>> {
        self.positions
    }

    /// Returns the uniform display color of this cloud, if one was set
    pub fn color(&self) -> Option<Vector3<f64>> {
        self.color
    }

    /// Sets a uniform RGB display color for all points. Components are expected in `[0, 1]`
    pub fn set_uniform_color(&mut self, color: Vector3<f64>) {
        self.color = Some(color);
    }

    /// Computes the centroid (mean position) of this cloud. Returns `None` if the cloud is empty
    /// ```
    /// # use verdure_core::cloud::PointCloud;
    /// # use verdure_core::nalgebra::Vector3;
    /// let cloud = PointCloud::from_positions(vec![
    ///     Vector3::new(0.0, 0.0, 0.0),
    ///     Vector3::new(2.0, 4.0, 6.0),
    /// ]);
    /// assert_eq!(cloud.centroid(), Some(Vector3::new(1.0, 2.0, 3.0)));
    /// ```
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self
            .positions
            .iter()
            .fold(Vector3::zeros(), |acc, position| acc + position);
        Some(sum / self.positions.len() as f64)
    }

    /// Computes the tight axis-aligned bounding box of this cloud. Returns `None` if the cloud
    /// is empty
    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(self.iter())
    }
}

impl std::iter::FromIterator<Vector3<f64>> for PointCloud {
    fn from_iter<T: IntoIterator<Item = Vector3<f64>>>(iter: T) -> Self {
        Self::from_positions(iter.into_iter().collect())
    }
}
