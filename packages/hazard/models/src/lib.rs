#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Coastal hazard data types shared across the analysis toolchain.
//!
//! Synthetic hazard reports start life as [`HazardPoint`]s, gain derived
//! density/cluster/hotspot fields as [`AnalyzedPoint`]s, and are summarized
//! into [`Cluster`]s and [`Hotspot`]s for export. Evacuation candidates are
//! described by [`SafeSpotOutcome`], and every completed run is recorded in a
//! [`Manifest`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Cluster label reserved for points that do not belong to any cluster.
pub const NOISE_CLUSTER_ID: i32 = -1;

/// Exact length of one international foot in meters.
pub const METERS_PER_FOOT: f64 = 0.3048;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl LatLon {
    /// Creates a coordinate pair from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns this location as a `geo` point (x = longitude, y = latitude).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// A single simulated hazard report location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Synthetic severity/frequency signal. Always at least 1.
    pub report_count: u32,
    /// 1-based index of the anchor group this point was generated from.
    pub group_id: u32,
}

impl HazardPoint {
    /// Returns the point's location.
    #[must_use]
    pub const fn location(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

/// A [`HazardPoint`] together with the statistics derived for it in one
/// pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedPoint {
    /// The generated point.
    #[serde(flatten)]
    pub point: HazardPoint,
    /// Kernel density weight, min-max normalized to `[0, 1]`.
    pub density_weight: f64,
    /// Cluster label, or [`NOISE_CLUSTER_ID`] when unclustered.
    pub cluster_id: i32,
    /// Local Getis-Ord Gi* z-score.
    pub hotspot_z_score: f64,
    /// Pseudo p-value from permutation testing, when permutations ran.
    pub hotspot_p_value: Option<f64>,
}

impl AnalyzedPoint {
    /// Whether this point was left unclustered.
    #[must_use]
    pub const fn is_noise(&self) -> bool {
        self.cluster_id == NOISE_CLUSTER_ID
    }
}

/// Summary of one non-noise cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster label, never [`NOISE_CLUSTER_ID`].
    pub cluster_id: i32,
    /// Boundary in WGS84: a point, a segment, or the convex hull polygon.
    pub boundary: geo::Geometry<f64>,
    /// Number of member points.
    pub member_count: usize,
    /// Sum of `report_count` across members.
    pub total_reports: u64,
}

/// A statistically significant high-report point and its buffered area.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// The underlying analyzed point.
    pub point: AnalyzedPoint,
    /// Circular buffer around the point in WGS84.
    pub area: geo::Polygon<f64>,
}

/// A candidate evacuation location that clears the required elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeSpotCandidate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Ground elevation in meters.
    pub elevation_meters: f64,
    /// Approximate distance from the reference location in kilometers.
    pub distance_from_reference_km: f64,
    /// Elevation minus the assumed tsunami run-up height.
    pub elevation_above_tsunami_meters: f64,
    /// Score in `[0, 100]`.
    pub safety_score: f64,
}

impl SafeSpotCandidate {
    /// Elevation converted to feet.
    #[must_use]
    pub fn elevation_feet(&self) -> f64 {
        self.elevation_meters / METERS_PER_FOOT
    }
}

/// Result of a safe-spot search around one reference location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SafeSpotOutcome {
    /// The reference location is already above the tsunami run-up height,
    /// so no search was performed.
    AlreadySafe {
        /// Reference location.
        reference: LatLon,
        /// Elevation of the reference location in meters.
        elevation_meters: f64,
        /// Assumed tsunami run-up height in meters.
        tsunami_height_meters: f64,
    },
    /// Candidates were sampled around the reference location.
    Searched {
        /// Reference location.
        reference: LatLon,
        /// Elevation of the reference location in meters.
        reference_elevation_meters: f64,
        /// Elevation a candidate must strictly exceed.
        required_elevation_meters: f64,
        /// Number of candidates inside the radius whose elevation was checked.
        candidates_sampled: usize,
        /// Qualifying candidates, best first. Empty when none qualified.
        spots: Vec<SafeSpotCandidate>,
    },
}

impl SafeSpotOutcome {
    /// Whether the reference location itself was judged safe.
    #[must_use]
    pub const fn is_safe_elevation(&self) -> bool {
        matches!(self, Self::AlreadySafe { .. })
    }

    /// Qualifying candidates (always empty for [`Self::AlreadySafe`]).
    #[must_use]
    pub fn spots(&self) -> &[SafeSpotCandidate] {
        match self {
            Self::AlreadySafe { .. } => &[],
            Self::Searched { spots, .. } => spots,
        }
    }

    /// The reference location the search was run for.
    #[must_use]
    pub const fn reference(&self) -> LatLon {
        match self {
            Self::AlreadySafe { reference, .. } | Self::Searched { reference, .. } => *reference,
        }
    }
}

/// How the hotspot statistic was obtained for a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HotspotStatus {
    /// Gi* was computed for every point.
    Computed,
    /// Too few points or no variance; non-significant defaults were used.
    DegenerateInput,
    /// The statistic could not be computed; non-significant defaults were used.
    ComputationFailed,
}

/// Aggregate statistics recorded in the [`Manifest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestStats {
    /// Number of exported points.
    pub num_points: usize,
    /// Number of non-noise clusters.
    pub num_clusters: usize,
    /// Number of exported hotspots.
    pub num_hotspots: usize,
    /// Number of exported safe spots (zero for the "already safe" case).
    pub num_safe_spots: usize,
    /// Whether the reference location was already above the run-up height.
    pub is_safe_elevation: bool,
    /// Arithmetic mean of every exported `report_count`.
    pub avg_reports: f64,
    /// Kernel bandwidth used for the density estimate, in meters.
    pub density_bandwidth_m: f64,
    /// How the hotspot statistic was obtained.
    pub hotspot_status: HotspotStatus,
}

/// Summary of one completed pipeline run. Regenerated wholesale every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Relative path of the points collection.
    pub points: String,
    /// Relative path of the cluster collection.
    pub clusters: String,
    /// Relative path of the hotspot collection.
    pub hotspots: String,
    /// Relative path of the safe-spot collection.
    pub safespots: String,
    /// Name of the configuration profile used.
    pub profile: String,
    /// Global seed used for all random streams.
    pub seed: u32,
    /// Aggregate statistics.
    pub stats: ManifestStats,
}
