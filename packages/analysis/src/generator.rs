//! Synthetic hazard point generation.
//!
//! Each anchor expands into one group of points. Three independent streams
//! are used per group: one for the point count, one for the Gaussian
//! offsets, and one for the group's base risk and per-point perturbations.

use coastal_hazard_config::GenerationConfig;
use coastal_hazard_models::{HazardPoint, LatLon};
use coastal_hazard_random::{SeedKey, stream};
use rand::Rng;
use rand_distr::StandardNormal;

/// Generates the hazard points for every anchor, tagging each point with
/// its 1-based group index.
#[must_use]
pub fn generate_points(
    anchors: &[LatLon],
    config: &GenerationConfig,
    global_seed: u32,
) -> Vec<HazardPoint> {
    let points: Vec<HazardPoint> = (1u32..)
        .zip(anchors)
        .flat_map(|(group_id, anchor)| generate_group(*anchor, group_id, config, global_seed))
        .collect();

    log::info!(
        "Generated {} hazard points from {} anchors",
        points.len(),
        anchors.len()
    );
    points
}

/// Generates one anchor's group of points.
#[must_use]
pub fn generate_group(
    anchor: LatLon,
    group_id: u32,
    config: &GenerationConfig,
    global_seed: u32,
) -> Vec<HazardPoint> {
    let count = config.points_per_anchor.unwrap_or_else(|| {
        let mut rng = stream(
            SeedKey::AnchorCount {
                latitude: anchor.latitude,
                longitude: anchor.longitude,
            },
            global_seed,
        );
        rng.gen_range(config.min_points_per_anchor..=config.max_points_per_anchor)
    });

    let coordinates = scatter(anchor, count, config.spread_degrees / 2.0, global_seed);

    let mut risk_rng = stream(SeedKey::GroupRisk { group_id }, global_seed);
    let base_risk = if risk_rng.r#gen::<f64>() < config.high_risk_probability {
        risk_rng.gen_range(config.high_risk_min..=config.high_risk_max)
    } else {
        risk_rng.gen_range(config.low_risk_min..=config.low_risk_max)
    };

    log::debug!("Group {group_id}: {count} points, base risk {base_risk}");

    coordinates
        .into_iter()
        .map(|(latitude, longitude)| {
            let variation = risk_rng.gen_range(-config.risk_variation..=config.risk_variation);
            let report_count = (i64::from(base_risk) + i64::from(variation)).max(1);
            HazardPoint {
                latitude,
                longitude,
                report_count: u32::try_from(report_count).unwrap_or(u32::MAX),
                group_id,
            }
        })
        .collect()
}

/// Draws `count` Gaussian-scattered coordinates around `anchor`.
///
/// All latitude offsets are drawn before all longitude offsets.
fn scatter(anchor: LatLon, count: u32, std_dev: f64, global_seed: u32) -> Vec<(f64, f64)> {
    let mut rng = stream(
        SeedKey::AnchorOffsets {
            latitude: anchor.latitude,
            longitude: anchor.longitude,
        },
        global_seed,
    );

    let lats: Vec<f64> = (0..count)
        .map(|_| std_dev.mul_add(rng.sample::<f64, _>(StandardNormal), anchor.latitude))
        .collect();
    let lons: Vec<f64> = (0..count)
        .map(|_| std_dev.mul_add(rng.sample::<f64, _>(StandardNormal), anchor.longitude))
        .collect();

    lats.into_iter().zip(lons).collect()
}
