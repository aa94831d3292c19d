//! Renderer boundary.
//!
//! The pipeline itself never draws anything. Display happens behind the [Renderer] trait:
//! a backend receives a fully assembled [Scene] and decides how to put it on screen. The
//! only backend shipped here is the [HeadlessRenderer], which reports what it would draw
//! to the log and returns. A windowed backend can be plugged in without touching the
//! pipeline stages.

use anyhow::Result;
use log::info;
use verdure_core::cloud::PointCloud;
use verdure_core::mesh::TriangleMesh;
use verdure_core::nalgebra::Vector3;

/// Window settings a display backend is asked to apply
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub window_title: String,
    pub width: u32,
    pub height: u32,
    /// Top left corner of the window on screen
    pub position: (i32, i32),
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: String::from("verdure"),
            width: 1280,
            height: 720,
            position: (50, 50),
        }
    }
}

/// A point cloud to draw. The color overrides the color stored in the cloud, if any
pub struct PointDrawable<'a> {
    pub cloud: &'a PointCloud,
    pub color: Option<Vector3<f64>>,
}

impl<'a> PointDrawable<'a> {
    /// Returns the color this drawable should be displayed with
    pub fn effective_color(&self) -> Option<Vector3<f64>> {
        self.color.or_else(|| self.cloud.color())
    }
}

/// Everything a backend needs to draw one view: point clouds, an optional hull mesh and
/// the window settings
pub struct Scene<'a> {
    pub points: Vec<PointDrawable<'a>>,
    pub mesh: Option<&'a TriangleMesh>,
    pub display: DisplayConfig,
}

/// A display backend. Backends only draw, all geometry is computed before they run
pub trait Renderer {
    fn render(&mut self, scene: &Scene<'_>) -> Result<()>;
}

/// Backend for environments without a display. Logs the scene contents instead of drawing
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessRenderer;

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &Scene<'_>) -> Result<()> {
        info!(
            "headless render of scene '{}' ({}x{} at {}, {})",
            scene.display.window_title,
            scene.display.width,
            scene.display.height,
            scene.display.position.0,
            scene.display.position.1
        );
        for drawable in &scene.points {
            match drawable.effective_color() {
                Some(color) => info!(
                    "  {} points, color ({:.2}, {:.2}, {:.2})",
                    drawable.cloud.len(),
                    color.x,
                    color.y,
                    color.z
                ),
                None => info!("  {} points, no color", drawable.cloud.len()),
            }
        }
        if let Some(mesh) = scene.mesh {
            info!(
                "  hull mesh with {} vertices and {} faces",
                mesh.vertex_count(),
                mesh.face_count()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_renderer_accepts_any_scene() {
        let cloud = PointCloud::from_positions(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        ]);
        let mesh = TriangleMesh::from_vertices(vec![Vector3::new(0.0, 0.0, 0.0)]);
        let scene = Scene {
            points: vec![PointDrawable {
                cloud: &cloud,
                color: None,
            }],
            mesh: Some(&mesh),
            display: DisplayConfig::default(),
        };
        assert!(HeadlessRenderer.render(&scene).is_ok());

        let empty = Scene {
            points: Vec::new(),
            mesh: None,
            display: DisplayConfig::default(),
        };
        assert!(HeadlessRenderer.render(&empty).is_ok());
    }

    #[test]
    fn test_drawable_color_overrides_cloud_color() {
        let mut cloud = PointCloud::from_positions(vec![Vector3::new(0.0, 0.0, 0.0)]);
        cloud.set_uniform_color(Vector3::new(0.0, 0.4, 0.0));

        let from_cloud = PointDrawable {
            cloud: &cloud,
            color: None,
        };
        assert_eq!(
            from_cloud.effective_color(),
            Some(Vector3::new(0.0, 0.4, 0.0))
        );

        let overridden = PointDrawable {
            cloud: &cloud,
            color: Some(Vector3::new(1.0, 0.0, 0.0)),
        };
        assert_eq!(
            overridden.effective_color(),
            Some(Vector3::new(1.0, 0.0, 0.0))
        );
    }
}
