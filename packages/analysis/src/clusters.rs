//! Fixed-radius density-based clustering (DBSCAN) and cluster summaries.

use std::collections::BTreeMap;

use coastal_hazard_models::{Cluster, HazardPoint, NOISE_CLUSTER_ID};
use coastal_hazard_spatial::PointIndex;
use coastal_hazard_spatial::geometry::convex_boundary;
use coastal_hazard_spatial::projection::to_geographic;
use geo::Coord;

/// Labels every indexed point with a cluster id, or [`NOISE_CLUSTER_ID`].
///
/// A point is a core point when at least `min_samples` points (itself
/// included) lie within `eps`. Clusters grow depth-first from core points
/// in index order, so labels are stable for a given input. Border points
/// join the first cluster that reaches them.
#[must_use]
pub fn dbscan(index: &PointIndex, eps: f64, min_samples: usize) -> Vec<i32> {
    let n = index.len();
    let neighborhoods: Vec<Vec<usize>> = (0..n).map(|i| index.within_radius(i, eps)).collect();
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|hood| hood.len() >= min_samples)
        .collect();

    let mut labels = vec![NOISE_CLUSTER_ID; n];
    let mut next_label = 0;
    let mut stack = Vec::new();

    for seed in 0..n {
        if labels[seed] != NOISE_CLUSTER_ID || !is_core[seed] {
            continue;
        }

        stack.push(seed);
        while let Some(i) = stack.pop() {
            if labels[i] != NOISE_CLUSTER_ID {
                continue;
            }
            labels[i] = next_label;
            if is_core[i] {
                stack.extend(
                    neighborhoods[i]
                        .iter()
                        .copied()
                        .filter(|&j| labels[j] == NOISE_CLUSTER_ID),
                );
            }
        }
        next_label += 1;
    }

    log::info!(
        "DBSCAN (eps={eps} m, min_samples={min_samples}): {next_label} clusters, {} noise points",
        labels.iter().filter(|&&l| l == NOISE_CLUSTER_ID).count()
    );
    labels
}

/// Builds one [`Cluster`] per non-noise label, ordered by cluster id.
///
/// Boundaries are derived from the projected coordinates and reprojected
/// to WGS84.
#[must_use]
pub fn summarize_clusters(
    points: &[HazardPoint],
    projected: &[Coord<f64>],
    labels: &[i32],
) -> Vec<Cluster> {
    let mut members: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE_CLUSTER_ID {
            members.entry(label).or_default().push(i);
        }
    }

    members
        .into_iter()
        .filter_map(|(cluster_id, idx)| {
            let coords: Vec<Coord<f64>> = idx.iter().map(|&i| projected[i]).collect();
            let boundary = to_geographic(&convex_boundary(&coords)?);
            Some(Cluster {
                cluster_id,
                boundary,
                member_count: idx.len(),
                total_reports: idx.iter().map(|&i| u64::from(points[i].report_count)).sum(),
            })
        })
        .collect()
}
