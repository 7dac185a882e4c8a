//! Local Getis-Ord Gi* hotspot statistics.
//!
//! Spatial weights are binary k-nearest-neighbor weights over projected
//! coordinates, with each point also counted as its own neighbor (the
//! "star" variant). Pseudo p-values come from conditional permutation: the
//! point's own value is held fixed and its `k` neighbors are redrawn from
//! the remaining points.

use coastal_hazard_config::HotspotConfig;
use coastal_hazard_models::{AnalyzedPoint, Hotspot, HotspotStatus};
use coastal_hazard_random::{SeedKey, stream};
use coastal_hazard_spatial::PointIndex;
use coastal_hazard_spatial::geometry::circle;
use coastal_hazard_spatial::projection::to_geographic;
use geo::Coord;
use thiserror::Error;

/// Why the Gi* statistic could not be computed.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// Too few points, no usable neighbors, or no variance in the values.
    #[error("Degenerate hotspot input: {reason}")]
    DegenerateInput {
        /// Description of the degenerate condition.
        reason: String,
    },

    /// Inputs or outputs were not finite numbers.
    #[error("Hotspot computation failed: {reason}")]
    ComputationFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl HotspotError {
    /// The run status recorded when this error forces the fallback.
    #[must_use]
    pub const fn status(&self) -> HotspotStatus {
        match self {
            Self::DegenerateInput { .. } => HotspotStatus::DegenerateInput,
            Self::ComputationFailed { .. } => HotspotStatus::ComputationFailed,
        }
    }
}

/// Gi* result for one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalGi {
    pub z_score: f64,
    /// `None` when no permutations were requested.
    pub p_value: Option<f64>,
}

impl LocalGi {
    /// Result assigned to every point when the statistic is unavailable.
    pub const NOT_SIGNIFICANT: Self = Self {
        z_score: 0.0,
        p_value: Some(1.0),
    };
}

/// Computes the local Gi* statistic for every indexed point.
///
/// `desired_k` is capped at `n - 1`.
///
/// # Errors
///
/// * [`HotspotError::DegenerateInput`] if there are fewer than two points,
///   the neighbor graph covers every point, or the values have no variance
/// * [`HotspotError::ComputationFailed`] if any value or resulting z-score
///   is not finite
#[allow(clippy::cast_precision_loss)]
pub fn local_gi_star(
    index: &PointIndex,
    values: &[f64],
    desired_k: usize,
    permutations: usize,
    global_seed: u32,
) -> Result<Vec<LocalGi>, HotspotError> {
    let n = values.len();
    if n != index.len() {
        return Err(HotspotError::ComputationFailed {
            reason: format!("{n} values for {} indexed points", index.len()),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(HotspotError::ComputationFailed {
            reason: "non-finite input value".to_string(),
        });
    }
    if n < 2 {
        return Err(HotspotError::DegenerateInput {
            reason: format!("{n} points"),
        });
    }

    let k = desired_k.min(n - 1);
    if k == 0 || k + 1 >= n {
        return Err(HotspotError::DegenerateInput {
            reason: format!("k={k} neighbors leaves no contrast among {n} points"),
        });
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let mean_sq = values.iter().map(|v| v * v).sum::<f64>() / nf;
    let std_dev = (mean_sq - mean * mean).max(0.0).sqrt();
    if std_dev <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(HotspotError::DegenerateInput {
            reason: "values have no variance".to_string(),
        });
    }

    // Binary weights including self: W = S1 = k + 1.
    let w = (k + 1) as f64;
    let denominator = std_dev * ((nf * w - w * w) / (nf - 1.0)).sqrt();

    let mut results = Vec::with_capacity(n);
    for (i, &own) in values.iter().enumerate() {
        let neighbor_sum: f64 = index.nearest(i, k).iter().map(|&j| values[j]).sum();
        let z_score = (own + neighbor_sum - mean * w) / denominator;
        if !z_score.is_finite() {
            return Err(HotspotError::ComputationFailed {
                reason: format!("non-finite z-score at point {i}"),
            });
        }

        let p_value = (permutations > 0).then(|| {
            permutation_p_value(values, i, k, neighbor_sum, permutations, global_seed)
        });
        results.push(LocalGi { z_score, p_value });
    }

    log::debug!(
        "Computed Gi* for {n} points (k={k}, permutations={permutations})"
    );
    Ok(results)
}

/// Folded pseudo p-value for point `i`.
///
/// Each draw sums `k` values sampled without replacement from every point
/// except `i`. Draws at least as extreme as the observed neighbor sum are
/// counted on whichever tail is smaller.
#[allow(clippy::cast_precision_loss)]
fn permutation_p_value(
    values: &[f64],
    i: usize,
    k: usize,
    observed: f64,
    permutations: usize,
    global_seed: u32,
) -> f64 {
    let mut rng = stream(SeedKey::HotspotPermutation { index: i }, global_seed);
    let others = values.len() - 1;

    let larger = (0..permutations)
        .filter(|_| {
            let sum: f64 = rand::seq::index::sample(&mut rng, others, k)
                .iter()
                .map(|j| if j >= i { values[j + 1] } else { values[j] })
                .sum();
            sum >= observed
        })
        .count();
    let extreme = larger.min(permutations - larger);

    (extreme + 1) as f64 / (permutations + 1) as f64
}

/// Points whose z-score exceeds the threshold and whose report count meets
/// the floor, each buffered into a circle in projected space and returned
/// in WGS84.
#[must_use]
pub fn select_hotspots(
    points: &[AnalyzedPoint],
    projected: &[Coord<f64>],
    config: &HotspotConfig,
) -> Vec<Hotspot> {
    points
        .iter()
        .zip(projected)
        .filter(|(p, _)| {
            p.hotspot_z_score > config.z_threshold && p.point.report_count >= config.min_reports
        })
        .map(|(p, c)| Hotspot {
            point: *p,
            area: to_geographic(&circle(*c, config.buffer_m, config.buffer_segments)),
        })
        .collect()
}
