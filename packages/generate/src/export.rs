//! `GeoJSON` layer export and the run manifest.
//!
//! Every run rewrites all five files in the output directory. Each file is
//! written to a `.tmp` sibling first and then renamed into place.

use std::path::{Path, PathBuf};

use coastal_hazard_analysis::Analysis;
use coastal_hazard_models::{
    AnalyzedPoint, Cluster, Hotspot, Manifest, ManifestStats, SafeSpotOutcome,
};
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::json;
use thiserror::Error;

/// Point layer file name.
pub const POINTS_FILE: &str = "points.geojson";
/// Cluster hull layer file name.
pub const CLUSTERS_FILE: &str = "clusters.geojson";
/// Hotspot buffer layer file name.
pub const HOTSPOTS_FILE: &str = "hotspots.geojson";
/// Safe-spot layer file name.
pub const SAFESPOTS_FILE: &str = "safespots.geojson";
/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors while writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize {file}: {source}")]
    Serialize {
        file: String,
        source: serde_json::Error,
    },
}

fn feature(geometry: geojson::Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn point_properties(p: &AnalyzedPoint) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("report_count".to_string(), json!(p.point.report_count));
    props.insert("group_id".to_string(), json!(p.point.group_id));
    props.insert("density_weight".to_string(), json!(p.density_weight));
    props.insert("cluster_id".to_string(), json!(p.cluster_id));
    props.insert("hotspot_z_score".to_string(), json!(p.hotspot_z_score));
    props.insert("hotspot_p_value".to_string(), json!(p.hotspot_p_value));
    props
}

/// One point feature per analyzed point.
#[must_use]
pub fn points_collection(points: &[AnalyzedPoint]) -> FeatureCollection {
    collection(
        points
            .iter()
            .map(|p| {
                feature(
                    geojson::Value::from(&p.point.location().to_point()),
                    point_properties(p),
                )
            })
            .collect(),
    )
}

/// One hull feature per non-noise cluster.
#[must_use]
pub fn clusters_collection(clusters: &[Cluster]) -> FeatureCollection {
    collection(
        clusters
            .iter()
            .map(|c| {
                let mut props = JsonObject::new();
                props.insert("cluster_id".to_string(), json!(c.cluster_id));
                props.insert("member_count".to_string(), json!(c.member_count));
                props.insert("total_reports".to_string(), json!(c.total_reports));
                feature(geojson::Value::from(&c.boundary), props)
            })
            .collect(),
    )
}

/// One buffered polygon per hotspot, carrying the point's attributes.
#[must_use]
pub fn hotspots_collection(hotspots: &[Hotspot]) -> FeatureCollection {
    collection(
        hotspots
            .iter()
            .map(|h| feature(geojson::Value::from(&h.area), point_properties(&h.point)))
            .collect(),
    )
}

/// The safe-spot layer.
///
/// An already-safe reference becomes a single sentinel feature located at
/// the reference itself. A search yields one ranked feature per spot, or
/// an empty collection.
#[must_use]
pub fn safe_spots_collection(outcome: &SafeSpotOutcome) -> FeatureCollection {
    match outcome {
        SafeSpotOutcome::AlreadySafe {
            reference,
            elevation_meters,
            tsunami_height_meters,
        } => {
            let mut props = JsonObject::new();
            props.insert("status".to_string(), json!("safe"));
            props.insert(
                "message".to_string(),
                json!(format!(
                    "Current location is {elevation_meters:.1} m above sea level, \
                     above the {tsunami_height_meters:.1} m tsunami run-up height"
                )),
            );
            props.insert("elevation_meters".to_string(), json!(elevation_meters));
            props.insert(
                "tsunami_height_meters".to_string(),
                json!(tsunami_height_meters),
            );
            collection(vec![feature(
                geojson::Value::from(&reference.to_point()),
                props,
            )])
        }
        SafeSpotOutcome::Searched { spots, .. } => collection(
            (1..)
                .zip(spots)
                .map(|(rank, s)| {
                    let mut props = JsonObject::new();
                    props.insert("rank".to_string(), json!(rank));
                    props.insert("elevation_meters".to_string(), json!(s.elevation_meters));
                    props.insert("elevation_feet".to_string(), json!(s.elevation_feet()));
                    props.insert(
                        "distance_km".to_string(),
                        json!(s.distance_from_reference_km),
                    );
                    props.insert(
                        "elevation_above_tsunami_meters".to_string(),
                        json!(s.elevation_above_tsunami_meters),
                    );
                    props.insert("safety_score".to_string(), json!(s.safety_score));
                    feature(
                        geojson::Value::Point(vec![s.longitude, s.latitude]),
                        props,
                    )
                })
                .collect(),
        ),
    }
}

/// Writes `contents` to `dir/file` via a temporary sibling.
fn write_atomic(dir: &Path, file: &str, contents: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(file);
    let tmp_path = dir.join(format!("{file}.tmp"));
    std::fs::write(&tmp_path, contents).map_err(|source| ExportError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, &path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

/// Serializes `collection` to `dir/file`.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the write fails.
pub fn write_collection(
    dir: &Path,
    file: &str,
    collection: &FeatureCollection,
) -> Result<PathBuf, ExportError> {
    let contents =
        serde_json::to_string(collection).map_err(|source| ExportError::Serialize {
            file: file.to_string(),
            source,
        })?;
    write_atomic(dir, file, &contents)
}

/// `path` relative to `base` with `/` separators, or just the file name
/// when `path` is not under `base`.
#[must_use]
pub fn relative_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base
        && let Ok(rel) = path.strip_prefix(base)
    {
        return rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
    }
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}

/// Paths of the four exported layers.
#[derive(Debug, Clone)]
pub struct ExportedLayers {
    pub points: PathBuf,
    pub clusters: PathBuf,
    pub hotspots: PathBuf,
    pub safespots: PathBuf,
}

/// Builds the manifest for one run.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_manifest(
    layers: &ExportedLayers,
    base: Option<&Path>,
    analysis: &Analysis,
    outcome: &SafeSpotOutcome,
    profile: &str,
    seed: u32,
) -> Manifest {
    let total_reports: u64 = analysis
        .points
        .iter()
        .map(|p| u64::from(p.point.report_count))
        .sum();
    let avg_reports = if analysis.points.is_empty() {
        0.0
    } else {
        total_reports as f64 / analysis.points.len() as f64
    };

    Manifest {
        points: relative_path(&layers.points, base),
        clusters: relative_path(&layers.clusters, base),
        hotspots: relative_path(&layers.hotspots, base),
        safespots: relative_path(&layers.safespots, base),
        profile: profile.to_string(),
        seed,
        stats: ManifestStats {
            num_points: analysis.points.len(),
            num_clusters: analysis.clusters.len(),
            num_hotspots: analysis.hotspots.len(),
            num_safe_spots: outcome.spots().len(),
            is_safe_elevation: outcome.is_safe_elevation(),
            avg_reports,
            density_bandwidth_m: analysis.bandwidth_m,
            hotspot_status: analysis.hotspot_status,
        },
    }
}

/// Writes every layer and the manifest into `dir`, creating it if needed.
///
/// Manifest paths are relative to the current working directory.
///
/// # Errors
///
/// Returns [`ExportError`] if the directory cannot be created or any file
/// cannot be written.
pub fn export_all(
    dir: &Path,
    analysis: &Analysis,
    outcome: &SafeSpotOutcome,
    profile: &str,
    seed: u32,
) -> Result<Manifest, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let layers = ExportedLayers {
        points: write_collection(dir, POINTS_FILE, &points_collection(&analysis.points))?,
        clusters: write_collection(dir, CLUSTERS_FILE, &clusters_collection(&analysis.clusters))?,
        hotspots: write_collection(dir, HOTSPOTS_FILE, &hotspots_collection(&analysis.hotspots))?,
        safespots: write_collection(dir, SAFESPOTS_FILE, &safe_spots_collection(outcome))?,
    };

    let cwd = std::env::current_dir().ok();
    let manifest = build_manifest(&layers, cwd.as_deref(), analysis, outcome, profile, seed);

    let contents =
        serde_json::to_string_pretty(&manifest).map_err(|source| ExportError::Serialize {
            file: MANIFEST_FILE.to_string(),
            source,
        })?;
    write_atomic(dir, MANIFEST_FILE, &contents)?;

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use coastal_hazard_analysis::generate_and_analyze;
    use coastal_hazard_config::profiles;
    use coastal_hazard_models::{HotspotStatus, LatLon, SafeSpotCandidate};

    use super::*;

    fn already_safe() -> SafeSpotOutcome {
        SafeSpotOutcome::AlreadySafe {
            reference: LatLon::new(13.0827, 80.2707),
            elevation_meters: 42.0,
            tsunami_height_meters: 10.0,
        }
    }

    fn searched(spots: Vec<SafeSpotCandidate>) -> SafeSpotOutcome {
        SafeSpotOutcome::Searched {
            reference: LatLon::new(13.0827, 80.2707),
            reference_elevation_meters: 3.0,
            required_elevation_meters: 15.24,
            candidates_sampled: 200,
            spots,
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn already_safe_exports_single_sentinel_at_reference() {
        let fc = safe_spots_collection(&already_safe());
        assert_eq!(fc.features.len(), 1);

        let feature = &fc.features[0];
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["status"], "safe");
        assert_eq!(props["elevation_meters"], 42.0);
        assert!(props["message"].as_str().unwrap().contains("42.0 m"));

        let geometry = feature.geometry.as_ref().unwrap();
        assert_eq!(geometry.value, geojson::Value::Point(vec![80.2707, 13.0827]));
    }

    #[test]
    fn empty_search_exports_empty_collection() {
        let fc = safe_spots_collection(&searched(vec![]));
        assert!(fc.features.is_empty());
    }

    #[test]
    fn spots_are_ranked_in_order() {
        let spot = |elevation_meters: f64| SafeSpotCandidate {
            latitude: 13.1,
            longitude: 80.3,
            elevation_meters,
            distance_from_reference_km: 4.0,
            elevation_above_tsunami_meters: elevation_meters - 10.0,
            safety_score: ((elevation_meters - 10.0) * 5.0).min(100.0),
        };
        let fc = safe_spots_collection(&searched(vec![spot(40.0), spot(20.0)]));

        let ranks: Vec<i64> = fc
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["rank"].as_i64().unwrap())
            .collect();
        assert_eq!(ranks, vec![1, 2]);

        let props = fc.features[1].properties.as_ref().unwrap();
        assert_eq!(props["safety_score"], 50.0);
        let feet = props["elevation_feet"].as_f64().unwrap();
        assert!((feet - 20.0 / 0.3048).abs() < 1e-9);
    }

    #[test]
    fn relative_path_inside_and_outside_base() {
        let base = Path::new("/work/repo");
        assert_eq!(
            relative_path(Path::new("/work/repo/data/generated/points.geojson"), Some(base)),
            "data/generated/points.geojson"
        );
        assert_eq!(
            relative_path(Path::new("/elsewhere/points.geojson"), Some(base)),
            "points.geojson"
        );
        assert_eq!(relative_path(Path::new("/x/manifest.json"), None), "manifest.json");
    }

    #[test]
    fn end_to_end_export_matches_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = profiles::profile("standard").unwrap();
        let analysis = generate_and_analyze(&config);
        let outcome = already_safe();

        let manifest =
            export_all(dir.path(), &analysis, &outcome, &config.name, config.seed).unwrap();

        for file in [
            POINTS_FILE,
            CLUSTERS_FILE,
            HOTSPOTS_FILE,
            SAFESPOTS_FILE,
            MANIFEST_FILE,
        ] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }

        let points = read_json(&dir.path().join(POINTS_FILE));
        let features = points["features"].as_array().unwrap();
        assert!((200..=400).contains(&features.len()));
        assert_eq!(manifest.stats.num_points, features.len());

        let total: u64 = features
            .iter()
            .map(|f| f["properties"]["report_count"].as_u64().unwrap())
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = total as f64 / features.len() as f64;
        assert!((manifest.stats.avg_reports - mean).abs() < 1e-12);

        let clusters = read_json(&dir.path().join(CLUSTERS_FILE));
        let clusters = clusters["features"].as_array().unwrap();
        assert_eq!(manifest.stats.num_clusters, clusters.len());
        assert!(
            clusters
                .iter()
                .all(|f| f["properties"]["cluster_id"].as_i64().unwrap() >= 0)
        );

        assert!(manifest.stats.is_safe_elevation);
        assert_eq!(manifest.stats.num_safe_spots, 0);
        assert_eq!(manifest.stats.hotspot_status, HotspotStatus::Computed);
        assert_eq!(manifest.profile, "standard");
        assert_eq!(manifest.seed, 42);

        let written: Manifest =
            serde_json::from_value(read_json(&dir.path().join(MANIFEST_FILE))).unwrap();
        assert_eq!(written.points, manifest.points);
        assert_eq!(written.safespots, manifest.safespots);
        assert_eq!(written.stats.num_points, manifest.stats.num_points);
        assert!((written.stats.avg_reports - manifest.stats.avg_reports).abs() < 1e-9);
    }

    #[test]
    fn hotspot_features_are_polygons() {
        let config = profiles::profile("standard").unwrap();
        let analysis = generate_and_analyze(&config);
        let fc = hotspots_collection(&analysis.hotspots);
        assert_eq!(fc.features.len(), analysis.hotspots.len());
        assert!(fc.features.iter().all(|f| matches!(
            f.geometry.as_ref().map(|g| &g.value),
            Some(geojson::Value::Polygon(_))
        )));
    }
}
