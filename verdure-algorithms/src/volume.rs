//! Hull volume estimation.
//!
//! The enclosed volume of the convex hull around the filtered cloud serves as a cheap
//! proxy for plant biomass. A volume is only reported when the hull is watertight;
//! degenerate hulls (flat, linear or pointlike clouds) yield a volume of zero and are
//! flagged so callers do not mistake the zero for a measurement.

use log::warn;
use verdure_core::cloud::PointCloud;
use verdure_core::mesh::TriangleMesh;

use crate::convexhull::{HullBuilder, IncrementalHull};

/// Result of the hull and volume stage
#[derive(Debug, Clone)]
pub struct VolumeEstimate {
    /// Enclosed hull volume in cubic cloud units, 0.0 if the hull is not watertight
    pub volume: f64,
    /// True if the hull mesh is a closed, consistently wound surface
    pub watertight: bool,
    /// The hull mesh itself, also returned for degenerate hulls so it can be displayed
    pub mesh: TriangleMesh,
}

/// Estimates the hull volume of the given cloud with the default incremental hull
pub fn estimate_volume(cloud: &PointCloud) -> VolumeEstimate {
    estimate_volume_with(&IncrementalHull, cloud)
}

/// Estimates the hull volume of the given cloud with a caller-provided hull construction
pub fn estimate_volume_with<H: HullBuilder>(builder: &H, cloud: &PointCloud) -> VolumeEstimate {
    let mesh = builder.build_hull(cloud.positions());
    let watertight = mesh.is_watertight();
    let volume = if watertight {
        mesh.enclosed_volume()
    } else {
        warn!(
            "convex hull over {} points is not watertight ({} vertices, {} faces), reporting zero volume",
            cloud.len(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        0.0
    };
    VolumeEstimate {
        volume,
        watertight,
        mesh,
    }
}
