//! Synthetic test clouds for the biomass pipeline.
//!
//! Real canopy scans are expensive to produce, so the pipeline ships a generator that
//! mimics one: a handful of overlapping Gaussian foliage clusters form the crown of a
//! bush, and a sprinkle of uniformly distributed points stands in for scanner noise.

use anyhow::{anyhow, Result};
use rand::{distributions::Uniform, Rng};
use rand_distr::StandardNormal;
use verdure_core::cloud::PointCloud;
use verdure_core::nalgebra::Vector3;

/// A single Gaussian foliage cluster
///
/// Points are drawn per axis from a normal distribution centered on `center` with the
/// standard deviation given by the matching component of `spread`. `fraction` is the share
/// of the total cluster point count this cluster receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSpec {
    pub center: Vector3<f64>,
    pub spread: Vector3<f64>,
    pub fraction: f64,
}

impl ClusterSpec {
    /// Creates a cluster with the same standard deviation on all three axes
    pub fn isotropic(center: Vector3<f64>, spread: f64, fraction: f64) -> Self {
        Self {
            center,
            spread: Vector3::new(spread, spread, spread),
            fraction,
        }
    }
}

/// Configuration of the synthetic bush generator
///
/// The defaults reproduce the reference bush: three overlapping clusters that together
/// receive `n_points` points, 50 noise points spread uniformly over `[-1, 1)` on each axis,
/// and a dark green display color.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    /// Total number of cluster points, distributed over the clusters by their fractions
    pub n_points: usize,
    /// The foliage clusters making up the crown. An empty list yields a noise-only cloud
    pub clusters: Vec<ClusterSpec>,
    /// Number of uniformly distributed noise points appended after the cluster points
    pub noise_count: usize,
    /// Half-open sampling interval applied to all three axes of every noise point
    pub noise_bounds: (f64, f64),
    /// Uniform display color attached to the generated cloud
    pub color: Option<Vector3<f64>>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            n_points: 2000,
            clusters: vec![
                ClusterSpec::isotropic(Vector3::new(0.0, 0.0, 0.0), 0.15, 0.5),
                ClusterSpec::isotropic(Vector3::new(-0.2, 0.1, 0.1), 0.10, 0.25),
                ClusterSpec::isotropic(Vector3::new(0.2, 0.15, -0.1), 0.10, 0.25),
            ],
            noise_count: 50,
            noise_bounds: (-1.0, 1.0),
            color: Some(Vector3::new(0.0, 0.4, 0.0)),
        }
    }
}

impl SynthesisConfig {
    /// Checks this configuration for values the generator cannot work with
    ///
    /// Cluster fractions must be positive and sum to at most 1, spreads must be finite and
    /// non-negative, centers finite, and the noise interval must be non-empty and finite.
    pub fn validate(&self) -> Result<()> {
        let mut fraction_sum = 0.0;
        for (index, cluster) in self.clusters.iter().enumerate() {
            if !cluster.fraction.is_finite() || cluster.fraction <= 0.0 {
                return Err(anyhow!(
                    "Cluster {} has invalid fraction {}, must be in (0, 1]",
                    index,
                    cluster.fraction
                ));
            }
            fraction_sum += cluster.fraction;
            for axis in 0..3 {
                if !cluster.center[axis].is_finite() {
                    return Err(anyhow!("Cluster {} has a non-finite center", index));
                }
                if !cluster.spread[axis].is_finite() || cluster.spread[axis] < 0.0 {
                    return Err(anyhow!(
                        "Cluster {} has invalid spread {}, must be finite and >= 0",
                        index,
                        cluster.spread[axis]
                    ));
                }
            }
        }
        if fraction_sum > 1.0 + 1e-9 {
            return Err(anyhow!(
                "Cluster fractions sum to {}, must not exceed 1",
                fraction_sum
            ));
        }
        let (low, high) = self.noise_bounds;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(anyhow!(
                "Noise bounds ({}, {}) do not form a non-empty interval",
                low,
                high
            ));
        }
        Ok(())
    }
}

/// Generates a bush-like point cloud from the given configuration
///
/// Cluster points come first in cluster order, noise points last, so callers can tell the
/// two populations apart by index. Each cluster receives `floor(fraction * n_points)`
/// points. The same seed always produces the same cloud for a given RNG type.
///
/// # Examples
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use verdure_algorithms::synthesis::{synthesize_bush, SynthesisConfig};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let cloud = synthesize_bush(&SynthesisConfig::default(), &mut rng).unwrap();
/// // 1000 + 500 + 500 cluster points plus 50 noise points
/// assert_eq!(cloud.len(), 2050);
/// ```
pub fn synthesize_bush<R: Rng + ?Sized>(
    config: &SynthesisConfig,
    rng: &mut R,
) -> Result<PointCloud> {
    config.validate()?;

    let mut cloud = PointCloud::with_capacity(config.n_points + config.noise_count);
    for cluster in &config.clusters {
        let count = (cluster.fraction * config.n_points as f64) as usize;
        for _ in 0..count {
            cloud.push(sample_cluster_point(rng, cluster));
        }
    }

    let (low, high) = config.noise_bounds;
    let noise = Uniform::new(low, high);
    for _ in 0..config.noise_count {
        cloud.push(Vector3::new(
            rng.sample(noise),
            rng.sample(noise),
            rng.sample(noise),
        ));
    }

    if let Some(color) = config.color {
        cloud.set_uniform_color(color);
    }
    Ok(cloud)
}

fn sample_cluster_point<R: Rng + ?Sized>(rng: &mut R, cluster: &ClusterSpec) -> Vector3<f64> {
    let unit = Vector3::new(
        rng.sample::<f64, _>(StandardNormal),
        rng.sample::<f64, _>(StandardNormal),
        rng.sample::<f64, _>(StandardNormal),
    );
    cluster.center + unit.component_mul(&cluster.spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_config_point_counts() {
        let mut rng = StdRng::seed_from_u64(42);
        let cloud = synthesize_bush(&SynthesisConfig::default(), &mut rng).unwrap();
        assert_eq!(cloud.len(), 2050);
    }

    #[test]
    fn test_cluster_counts_use_floored_fractions() {
        let config = SynthesisConfig {
            n_points: 7,
            noise_count: 3,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = synthesize_bush(&config, &mut rng).unwrap();
        // floor(3.5) + floor(1.75) + floor(1.75) cluster points plus 3 noise points
        assert_eq!(cloud.len(), 3 + 1 + 1 + 3);

        // a single point floors every cluster allocation to zero
        let config = SynthesisConfig {
            n_points: 1,
            noise_count: 3,
            ..Default::default()
        };
        let cloud = synthesize_bush(&config, &mut rng).unwrap();
        assert_eq!(cloud.len(), 3);
    }

    #[test]
    fn test_cluster_points_stay_near_their_center() {
        let config = SynthesisConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let cloud = synthesize_bush(&config, &mut rng).unwrap();

        // the first 1000 points belong to the cluster at the origin with spread 0.15
        let cluster = &config.clusters[0];
        let radius = 5.0 * cluster.spread.x;
        let within = cloud
            .positions()
            .iter()
            .take(1000)
            .filter(|position| (*position - cluster.center).norm() <= radius)
            .count();
        assert!(within >= 990, "only {} of 1000 points within 5 sigma", within);
    }

    #[test]
    fn test_noise_points_stay_inside_bounds() {
        let config = SynthesisConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let cloud = synthesize_bush(&config, &mut rng).unwrap();

        let (low, high) = config.noise_bounds;
        let noise_start = cloud.len() - config.noise_count;
        for position in &cloud.positions()[noise_start..] {
            for axis in 0..3 {
                assert!(position[axis] >= low && position[axis] < high);
            }
        }
    }

    #[test]
    fn test_zero_cluster_points_yields_noise_only() {
        let config = SynthesisConfig {
            n_points: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let cloud = synthesize_bush(&config, &mut rng).unwrap();
        assert_eq!(cloud.len(), config.noise_count);
    }

    #[test]
    fn test_empty_config_yields_empty_cloud() {
        let config = SynthesisConfig {
            n_points: 0,
            clusters: Vec::new(),
            noise_count: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let cloud = synthesize_bush(&config, &mut rng).unwrap();
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_display_color_is_attached() {
        let mut rng = StdRng::seed_from_u64(11);
        let cloud = synthesize_bush(&SynthesisConfig::default(), &mut rng).unwrap();
        assert_eq!(cloud.color(), Some(Vector3::new(0.0, 0.4, 0.0)));
    }

    #[test]
    fn test_same_seed_reproduces_cloud() {
        let config = SynthesisConfig::default();
        let mut first_rng = StdRng::seed_from_u64(1234);
        let mut second_rng = StdRng::seed_from_u64(1234);
        let first = synthesize_bush(&config, &mut first_rng).unwrap();
        let second = synthesize_bush(&config, &mut second_rng).unwrap();
        assert_eq!(first.positions(), second.positions());
    }

    #[test]
    fn test_negative_spread_is_rejected() {
        let mut config = SynthesisConfig::default();
        config.clusters[0].spread.y = -0.1;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(synthesize_bush(&config, &mut rng).is_err());
    }

    #[test]
    fn test_fraction_sum_above_one_is_rejected() {
        let config = SynthesisConfig {
            clusters: vec![
                ClusterSpec::isotropic(Vector3::new(0.0, 0.0, 0.0), 0.1, 0.9),
                ClusterSpec::isotropic(Vector3::new(1.0, 0.0, 0.0), 0.1, 0.2),
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_fraction_is_rejected() {
        let config = SynthesisConfig {
            clusters: vec![ClusterSpec::isotropic(Vector3::new(0.0, 0.0, 0.0), 0.1, 0.0)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_noise_bounds_are_rejected() {
        let config = SynthesisConfig {
            noise_bounds: (1.0, -1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_center_is_rejected() {
        let config = SynthesisConfig {
            clusters: vec![ClusterSpec::isotropic(
                Vector3::new(f64::NAN, 0.0, 0.0),
                0.1,
                0.5,
            )],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
