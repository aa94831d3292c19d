//! The full estimation pipeline.
//!
//! Synthesize, filter, estimate: the three stages only communicate through the point
//! cloud, so each can be used on its own. This module wires them together behind a single
//! configuration struct and reports the intermediate counts alongside the final estimate.

use anyhow::{anyhow, Result};
use log::info;
use rand::Rng;
use verdure_core::cloud::PointCloud;

use crate::outlier::remove_statistical_outliers;
use crate::synthesis::{synthesize_bush, SynthesisConfig};
use crate::volume::{estimate_volume, VolumeEstimate};

/// Configuration of a full pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Settings of the synthetic bush generator
    pub synthesis: SynthesisConfig,
    /// Number of nearest neighbors considered by the outlier filter
    pub neighbor_count: usize,
    /// Threshold width of the outlier filter in standard deviations
    pub std_ratio: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            synthesis: SynthesisConfig::default(),
            neighbor_count: 20,
            std_ratio: 2.0,
        }
    }
}

impl PipelineConfig {
    /// Checks all stage parameters up front, so a run fails before any work is done
    pub fn validate(&self) -> Result<()> {
        self.synthesis.validate()?;
        if self.neighbor_count < 1 {
            return Err(anyhow!("The neighbor count needs to be >= 1"));
        }
        if !self.std_ratio.is_finite() || self.std_ratio <= 0.0 {
            return Err(anyhow!(
                "The standard deviation ratio needs to be positive and finite, got {}",
                self.std_ratio
            ));
        }
        Ok(())
    }
}

/// Outputs of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Number of points the generator produced
    pub input_points: usize,
    /// Number of points the outlier filter removed
    pub removed_outliers: usize,
    /// The filtered cloud the estimate is based on
    pub cloud: PointCloud,
    /// Hull mesh, watertightness and enclosed volume
    pub estimate: VolumeEstimate,
}

/// Runs the full pipeline: synthesize a bush, remove outliers, estimate the hull volume
///
/// The run is deterministic in the passed RNG, the same seed yields the same estimate.
///
/// # Examples
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use verdure_algorithms::pipeline::{self, PipelineConfig};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let run = pipeline::run(&PipelineConfig::default(), &mut rng).unwrap();
/// assert_eq!(run.input_points, 2050);
/// assert_eq!(run.cloud.len() + run.removed_outliers, run.input_points);
/// assert!(run.estimate.watertight);
/// ```
pub fn run<R: Rng + ?Sized>(config: &PipelineConfig, rng: &mut R) -> Result<PipelineRun> {
    config.validate()?;

    let raw = synthesize_bush(&config.synthesis, rng)?;
    let input_points = raw.len();
    info!("synthesized bush cloud with {} points", input_points);

    let (cloud, removed_outliers) =
        remove_statistical_outliers(raw, config.neighbor_count, config.std_ratio)?;
    info!(
        "outlier filter removed {} points, {} points remain",
        removed_outliers,
        cloud.len()
    );

    let estimate = estimate_volume(&cloud);
    info!(
        "hull has {} vertices and {} faces, watertight: {}, volume: {}",
        estimate.mesh.vertex_count(),
        estimate.mesh.face_count(),
        estimate.watertight,
        estimate.volume
    );

    Ok(PipelineRun {
        input_points,
        removed_outliers,
        cloud,
        estimate,
    })
}
