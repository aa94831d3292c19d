//! Statistical outlier removal.
//!
//! Scanner artifacts show up as sparse points far away from any surface. For every point
//! the filter computes the mean distance to its k nearest neighbors, then drops all points
//! whose mean distance exceeds `mean + std_ratio * sigma` of that distribution. Dense
//! foliage regions have small mean distances and survive, isolated noise does not.

use anyhow::{anyhow, Result};
use kd_tree::KdTree;
use log::debug;
use verdure_core::cloud::PointCloud;
use verdure_core::nalgebra::Vector3;

/// Removes sparse outliers from the given cloud
///
/// Returns the filtered cloud and the number of removed points. Surviving points keep
/// their relative order and the display color carries over. `neighbor_count` is clamped
/// to the number of other points if the cloud is smaller than the requested neighborhood;
/// clouds with fewer than two points pass through unchanged.
///
/// # Examples
/// ```
/// use verdure_algorithms::outlier::remove_statistical_outliers;
/// use verdure_core::cloud::PointCloud;
/// use verdure_core::nalgebra::Vector3;
///
/// // a tight 3x3x3 block of points and one far away artifact
/// let mut cloud = PointCloud::new();
/// for x in 0..3 {
///     for y in 0..3 {
///         for z in 0..3 {
///             cloud.push(Vector3::new(x as f64, y as f64, z as f64));
///         }
///     }
/// }
/// cloud.push(Vector3::new(100.0, 100.0, 100.0));
///
/// let (filtered, removed) = remove_statistical_outliers(cloud, 5, 1.0).unwrap();
/// assert_eq!(removed, 1);
/// assert_eq!(filtered.len(), 27);
/// ```
pub fn remove_statistical_outliers(
    cloud: PointCloud,
    neighbor_count: usize,
    std_ratio: f64,
) -> Result<(PointCloud, usize)> {
    if neighbor_count < 1 {
        return Err(anyhow!("The neighbor count needs to be >= 1"));
    }
    if !std_ratio.is_finite() || std_ratio <= 0.0 {
        return Err(anyhow!(
            "The standard deviation ratio needs to be positive and finite, got {}",
            std_ratio
        ));
    }
    if cloud.len() < 2 {
        return Ok((cloud, 0));
    }

    let mean_distances = mean_neighbor_distances(&cloud, neighbor_count);

    let mean = mean_distances.iter().sum::<f64>() / mean_distances.len() as f64;
    let variance = mean_distances
        .iter()
        .map(|distance| (distance - mean) * (distance - mean))
        .sum::<f64>()
        / mean_distances.len() as f64;
    let threshold = mean + std_ratio * variance.sqrt();

    let mut kept: Vec<Vector3<f64>> = Vec::with_capacity(cloud.len());
    for (position, mean_distance) in cloud.iter().zip(&mean_distances) {
        if *mean_distance <= threshold {
            kept.push(position);
        }
    }

    let removed = cloud.len() - kept.len();
    debug!(
        "statistical outlier removal kept {} of {} points (threshold {})",
        kept.len(),
        cloud.len(),
        threshold
    );

    let mut filtered = PointCloud::from_positions(kept);
    if let Some(color) = cloud.color() {
        filtered.set_uniform_color(color);
    }
    Ok((filtered, removed))
}

/// Computes for every point the mean distance to its `neighbor_count` nearest neighbors,
/// not counting the point itself
fn mean_neighbor_distances(cloud: &PointCloud, neighbor_count: usize) -> Vec<f64> {
    let k = neighbor_count.min(cloud.len() - 1);

    // transform point cloud in vector of points
    let mut points: Vec<[f64; 3]> = vec![];
    for position in cloud.positions() {
        points.push(*position.as_ref());
    }

    // construct kd tree over the vector of points.
    let cloud_as_kd_tree = KdTree::build_by_ordered_float(points);

    let mut mean_distances = Vec::with_capacity(cloud.len());
    for position in cloud.positions() {
        let r: &[f64; 3] = position.as_ref();
        // query one more neighbor than needed, the query point is its own nearest neighbor
        let nearest_points = cloud_as_kd_tree.nearests(r, k + 1);

        let mut sum = 0.0;
        let mut count = 0;
        let mut skipped_self = false;
        for neighbor in &nearest_points {
            if !skipped_self && neighbor.squared_distance == 0.0 {
                skipped_self = true;
                continue;
            }
            sum += neighbor.squared_distance.sqrt();
            count += 1;
        }
        if count > 0 {
            mean_distances.push(sum / count as f64);
        } else {
            mean_distances.push(0.0);
        }
    }
    mean_distances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_cloud() -> PointCloud {
        let mut cloud = PointCloud::new();
        for x in 0..5 {
            for y in 0..5 {
                for z in 0..4 {
                    cloud.push(Vector3::new(x as f64, y as f64, z as f64));
                }
            }
        }
        cloud
    }

    #[test]
    fn test_planted_outliers_are_removed() {
        let mut cloud = grid_cloud();
        let dense_count = cloud.len();
        cloud.push(Vector3::new(1000.0, 1000.0, 1000.0));
        cloud.push(Vector3::new(-1000.0, 500.0, 800.0));
        cloud.push(Vector3::new(900.0, -1000.0, -700.0));

        let (filtered, removed) = remove_statistical_outliers(cloud, 20, 2.0).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(filtered.len(), dense_count);
        for position in filtered.positions() {
            assert!(position.norm() < 100.0);
        }
    }

    #[test]
    fn test_surviving_points_keep_their_order() {
        let mut cloud = grid_cloud();
        // plant the outlier in the middle of the cloud, not at the end
        let mut positions = cloud.into_positions();
        positions.insert(42, Vector3::new(500.0, 500.0, 500.0));
        cloud = PointCloud::from_positions(positions);

        let expected = grid_cloud();
        let (filtered, removed) = remove_statistical_outliers(cloud, 10, 2.0).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(filtered.positions(), expected.positions());
    }

    #[test]
    fn test_kept_plus_removed_matches_input() {
        let mut cloud = grid_cloud();
        cloud.push(Vector3::new(200.0, 0.0, 0.0));
        let input_len = cloud.len();
        let (filtered, removed) = remove_statistical_outliers(cloud, 15, 1.5).unwrap();
        assert_eq!(filtered.len() + removed, input_len);
    }

    #[test]
    fn test_larger_std_ratio_removes_no_more_points() {
        let mut cloud = grid_cloud();
        cloud.push(Vector3::new(30.0, 30.0, 30.0));
        cloud.push(Vector3::new(-25.0, 10.0, 40.0));

        let (_, removed_strict) = remove_statistical_outliers(cloud.clone(), 10, 1.0).unwrap();
        let (_, removed_loose) = remove_statistical_outliers(cloud, 10, 3.0).unwrap();
        assert!(removed_loose <= removed_strict);
    }

    #[test]
    fn test_refiltering_a_symmetric_set_removes_nothing() {
        // the eight cube corners all have mean neighbor distance exactly 1.0 for k = 3,
        // so after the planted outlier is gone the threshold equals the mean and the
        // second pass keeps every point
        let mut cloud = PointCloud::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    cloud.push(Vector3::new(x as f64, y as f64, z as f64));
                }
            }
        }
        cloud.push(Vector3::new(10.0, 10.0, 10.0));

        let (filtered, removed) = remove_statistical_outliers(cloud, 3, 2.0).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(filtered.len(), 8);

        let (refiltered, removed_again) = remove_statistical_outliers(filtered, 3, 2.0).unwrap();
        assert_eq!(removed_again, 0);
        assert_eq!(refiltered.len(), 8);
    }

    #[test]
    fn test_refiltering_a_bush_cloud_is_statistically_stable() {
        use crate::synthesis::{synthesize_bush, SynthesisConfig};
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(42);
        let cloud = synthesize_bush(&SynthesisConfig::default(), &mut rng).unwrap();

        let (filtered, _) = remove_statistical_outliers(cloud, 20, 2.0).unwrap();
        let survivors = filtered.len();
        let (_, removed_again) = remove_statistical_outliers(filtered, 20, 2.0).unwrap();
        assert!(
            removed_again <= survivors / 20,
            "second filter pass removed {} of {} points",
            removed_again,
            survivors
        );
    }

    #[test]
    fn test_neighbor_count_is_clamped_to_cloud_size() {
        let cloud = PointCloud::from_positions(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ]);
        // neighbor count far above the point count must not fail
        let (filtered, removed) = remove_statistical_outliers(cloud, 50, 2.0).unwrap();
        assert_eq!(filtered.len() + removed, 4);
    }

    #[test]
    fn test_tiny_clouds_pass_through() {
        let empty = PointCloud::new();
        let (filtered, removed) = remove_statistical_outliers(empty, 20, 2.0).unwrap();
        assert!(filtered.is_empty());
        assert_eq!(removed, 0);

        let single = PointCloud::from_positions(vec![Vector3::new(1.0, 2.0, 3.0)]);
        let (filtered, removed) = remove_statistical_outliers(single, 20, 2.0).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_duplicate_points_count_as_neighbors() {
        // ten copies of the same position have mean neighbor distance zero
        let mut cloud = PointCloud::new();
        for _ in 0..10 {
            cloud.push(Vector3::new(1.0, 1.0, 1.0));
        }
        let (filtered, removed) = remove_statistical_outliers(cloud, 5, 2.0).unwrap();
        assert_eq!(filtered.len(), 10);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_color_carries_over() {
        let mut cloud = grid_cloud();
        cloud.set_uniform_color(Vector3::new(0.0, 0.4, 0.0));
        let (filtered, _) = remove_statistical_outliers(cloud, 10, 2.0).unwrap();
        assert_eq!(filtered.color(), Some(Vector3::new(0.0, 0.4, 0.0)));
    }

    #[test]
    fn test_zero_neighbor_count_is_rejected() {
        assert!(remove_statistical_outliers(grid_cloud(), 0, 2.0).is_err());
    }

    #[test]
    fn test_non_positive_std_ratio_is_rejected() {
        assert!(remove_statistical_outliers(grid_cloud(), 10, 0.0).is_err());
        assert!(remove_statistical_outliers(grid_cloud(), 10, -1.0).is_err());
        assert!(remove_statistical_outliers(grid_cloud(), 10, f64::NAN).is_err());
    }
}
