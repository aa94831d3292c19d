#![warn(clippy::all)]

//! Core data structures for estimating vegetation volume from point cloud data
//!
//! Verdure works on unstructured 3D point clouds of plant canopies. This crate provides
//! the in-memory containers shared by all processing stages: the [PointCloud](crate::cloud::PointCloud)
//! container, the [TriangleMesh](crate::mesh::TriangleMesh) produced by hull construction,
//! and a small set of mathematical tools in the [math](crate::math) module.

pub extern crate nalgebra;

/// In-memory point cloud container
pub mod cloud;
/// Useful mathematical tools when working with point cloud data
pub mod math;
/// Indexed triangle meshes and the queries the volume stage needs
pub mod mesh;
