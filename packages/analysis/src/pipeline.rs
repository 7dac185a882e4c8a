//! Runs density, clustering, and hotspot analysis over one point set.

use coastal_hazard_config::PipelineConfig;
use coastal_hazard_models::{AnalyzedPoint, Cluster, HazardPoint, Hotspot, HotspotStatus};
use coastal_hazard_spatial::PointIndex;
use coastal_hazard_spatial::projection::project;
use geo::Coord;

use crate::anchors::COASTAL_ANCHORS;
use crate::clusters::{dbscan, summarize_clusters};
use crate::density::{density_weights, select_bandwidth};
use crate::generator::generate_points;
use crate::hotspots::{LocalGi, local_gi_star, select_hotspots};

/// Everything derived from one point set.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub points: Vec<AnalyzedPoint>,
    pub clusters: Vec<Cluster>,
    pub hotspots: Vec<Hotspot>,
    /// Kernel bandwidth actually used, in meters.
    pub bandwidth_m: f64,
    pub hotspot_status: HotspotStatus,
}

/// Projects every point to Web Mercator.
#[must_use]
pub fn project_points(points: &[HazardPoint]) -> Vec<Coord<f64>> {
    points
        .iter()
        .map(|p| {
            project(Coord {
                x: p.longitude,
                y: p.latitude,
            })
        })
        .collect()
}

/// Analyzes `points` with the given configuration.
///
/// A failed hotspot computation never fails the run: every point is
/// assigned a zero z-score and a p-value of one, and the failure is
/// reported through [`Analysis::hotspot_status`].
#[must_use]
pub fn analyze(points: &[HazardPoint], config: &PipelineConfig) -> Analysis {
    let projected = project_points(points);
    let index = PointIndex::new(&projected);
    let reports: Vec<f64> = points.iter().map(|p| f64::from(p.report_count)).collect();

    let bandwidth_m = select_bandwidth(&projected, &config.density);
    let density = density_weights(&projected, &reports, bandwidth_m);
    log::info!("Density bandwidth: {bandwidth_m:.0} m");

    let labels = dbscan(&index, config.clustering.eps_m, config.clustering.min_samples);
    let clusters = summarize_clusters(points, &projected, &labels);

    let (gi, hotspot_status) = match local_gi_star(
        &index,
        &reports,
        config.hotspot.k_neighbors,
        config.hotspot.permutations,
        config.seed,
    ) {
        Ok(gi) => (gi, HotspotStatus::Computed),
        Err(e) => {
            log::warn!("{e}; treating every point as not significant");
            (vec![LocalGi::NOT_SIGNIFICANT; points.len()], e.status())
        }
    };

    let analyzed: Vec<AnalyzedPoint> = points
        .iter()
        .zip(density)
        .zip(labels)
        .zip(gi)
        .map(|(((point, density_weight), cluster_id), gi)| AnalyzedPoint {
            point: *point,
            density_weight,
            cluster_id,
            hotspot_z_score: gi.z_score,
            hotspot_p_value: gi.p_value,
        })
        .collect();

    let hotspots = select_hotspots(&analyzed, &projected, &config.hotspot);
    log::info!(
        "Analysis complete: {} points, {} clusters, {} hotspots ({hotspot_status})",
        analyzed.len(),
        clusters.len(),
        hotspots.len()
    );

    Analysis {
        points: analyzed,
        clusters,
        hotspots,
        bandwidth_m,
        hotspot_status,
    }
}

/// Generates points from the built-in coastal anchors and analyzes them.
#[must_use]
pub fn generate_and_analyze(config: &PipelineConfig) -> Analysis {
    let points = generate_points(&COASTAL_ANCHORS, &config.generation, config.seed);
    analyze(&points, config)
}

#[cfg(test)]
mod tests {
    use coastal_hazard_config::profiles;

    use super::*;

    fn standard() -> PipelineConfig {
        profiles::profile("standard").unwrap()
    }

    #[test]
    fn standard_run_is_reproducible() {
        let config = standard();
        assert_eq!(generate_and_analyze(&config), generate_and_analyze(&config));
    }

    #[test]
    fn standard_run_has_expected_shape() {
        let config = standard();
        let analysis = generate_and_analyze(&config);

        assert!((200..=400).contains(&analysis.points.len()));
        assert_eq!(analysis.hotspot_status, HotspotStatus::Computed);
        assert!((10_000.0..=40_000.0).contains(&analysis.bandwidth_m));
        assert!(
            analysis
                .points
                .iter()
                .all(|p| (0.0..=1.0).contains(&p.density_weight))
        );
        assert!(analysis.points.iter().all(|p| {
            p.hotspot_p_value
                .is_some_and(|v| v > 0.0 && v <= 1.0)
        }));
    }

    #[test]
    fn clusters_account_for_every_clustered_point() {
        let analysis = generate_and_analyze(&standard());

        let clustered = analysis.points.iter().filter(|p| !p.is_noise()).count();
        let members: usize = analysis.clusters.iter().map(|c| c.member_count).sum();
        assert_eq!(clustered, members);

        let ids: Vec<i32> = analysis.clusters.iter().map(|c| c.cluster_id).collect();
        let expected: Vec<i32> = (0..).take(ids.len()).collect();
        assert_eq!(ids, expected);

        for cluster in &analysis.clusters {
            let reports: u64 = analysis
                .points
                .iter()
                .filter(|p| p.cluster_id == cluster.cluster_id)
                .map(|p| u64::from(p.point.report_count))
                .sum();
            assert_eq!(cluster.total_reports, reports);
        }
    }

    #[test]
    fn hotspots_meet_both_thresholds() {
        let config = standard();
        let analysis = generate_and_analyze(&config);
        for hotspot in &analysis.hotspots {
            assert!(hotspot.point.hotspot_z_score > config.hotspot.z_threshold);
            assert!(hotspot.point.point.report_count >= config.hotspot.min_reports);
        }
    }

    #[test]
    fn tiny_input_falls_back_to_not_significant() {
        let points = [
            HazardPoint {
                latitude: 13.0,
                longitude: 80.0,
                report_count: 30,
                group_id: 1,
            },
            HazardPoint {
                latitude: 13.1,
                longitude: 80.1,
                report_count: 2,
                group_id: 1,
            },
        ];
        let analysis = analyze(&points, &standard());

        assert_eq!(analysis.hotspot_status, HotspotStatus::DegenerateInput);
        assert!(analysis.hotspots.is_empty());
        for p in &analysis.points {
            assert!(p.hotspot_z_score.abs() < f64::EPSILON);
            assert_eq!(p.hotspot_p_value, Some(1.0));
        }
    }

    #[test]
    fn empty_input_produces_empty_analysis() {
        let analysis = analyze(&[], &standard());
        assert!(analysis.points.is_empty());
        assert!(analysis.clusters.is_empty());
        assert!(analysis.hotspots.is_empty());
        assert!((analysis.bandwidth_m - 20_000.0).abs() < f64::EPSILON);
    }
}
