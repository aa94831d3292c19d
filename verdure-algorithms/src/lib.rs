#![warn(clippy::all)]
//! Algorithms for estimating the volume of a plant canopy from point cloud data.
//!
//! Verdure composes three independent stages into a proof-of-concept biomass pipeline:
//! synthesize a bush-like test cloud, remove scanner noise with a statistical outlier
//! filter, then bound the remaining crown with a convex hull and report the enclosed
//! volume as a biomass proxy.

// Synthesize bush-like point clouds from Gaussian foliage clusters plus uniform noise.
pub mod synthesis;
// Remove sparse outliers based on the distribution of mean nearest-neighbor distances.
pub mod outlier;
// Incremental convex hull construction over 3D point sets.
pub mod convexhull;
// Gate hull meshes on watertightness and compute the enclosed volume.
pub mod volume;
// Wire all stages together into a single configurable run.
pub mod pipeline;
