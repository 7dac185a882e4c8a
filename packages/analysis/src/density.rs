//! Weighted Gaussian kernel density estimation over projected points.

use coastal_hazard_config::DensityConfig;
use coastal_hazard_spatial::geometry::{pairwise_distance_std, squared_distance};
use geo::Coord;

/// Added to the min-max denominator so equal densities do not divide by zero.
const NORMALIZATION_EPSILON: f64 = 1e-12;

/// Picks the kernel bandwidth (meters) for `coords`.
///
/// Fewer than two points use the fallback bandwidth. Otherwise the
/// standard deviation of all pairwise distances is scaled by `n^(-1/5)`
/// and clamped to the configured bounds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn select_bandwidth(coords: &[Coord<f64>], config: &DensityConfig) -> f64 {
    let Some(std_dist) = pairwise_distance_std(coords) else {
        return config.fallback_bandwidth_m;
    };

    let bandwidth = std_dist * (coords.len() as f64).powf(-0.2);
    if !bandwidth.is_finite() {
        log::warn!("Non-finite density bandwidth; using fallback");
        return config.fallback_bandwidth_m;
    }
    bandwidth.clamp(config.min_bandwidth_m, config.max_bandwidth_m)
}

/// Log-density of a weighted 2D Gaussian KDE at each input point.
///
/// Sample weights must be non-negative; zero-weight samples contribute
/// nothing. Evaluated with log-sum-exp so far-apart samples do not
/// underflow to zero.
#[must_use]
pub fn log_densities(coords: &[Coord<f64>], weights: &[f64], bandwidth: f64) -> Vec<f64> {
    let total_weight: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    let two_h2 = 2.0 * bandwidth * bandwidth;
    let log_norm = total_weight.ln() + (std::f64::consts::TAU * bandwidth * bandwidth).ln();

    coords
        .iter()
        .map(|x| {
            let terms: Vec<f64> = coords
                .iter()
                .zip(weights)
                .filter(|(_, w)| **w > 0.0)
                .map(|(xi, w)| w.ln() - squared_distance(*x, *xi) / two_h2)
                .collect();
            log_sum_exp(&terms) - log_norm
        })
        .collect()
}

fn log_sum_exp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
}

/// Min-max normalizes exponentiated log-densities into `[0, 1]`.
#[must_use]
pub fn normalize(log_densities: &[f64]) -> Vec<f64> {
    let densities: Vec<f64> = log_densities.iter().map(|l| l.exp()).collect();
    let min = densities.iter().copied().fold(f64::INFINITY, f64::min);
    let max = densities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min + NORMALIZATION_EPSILON;

    densities
        .iter()
        .map(|d| ((d - min) / range).clamp(0.0, 1.0))
        .collect()
}

/// Normalized density weight for every point.
#[must_use]
pub fn density_weights(coords: &[Coord<f64>], weights: &[f64], bandwidth: f64) -> Vec<f64> {
    if coords.is_empty() {
        return Vec::new();
    }
    normalize(&log_densities(coords, weights, bandwidth))
}
