#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the coastal hazard analysis pipeline.
//!
//! Every tunable constant of the pipeline (global seed, generation ranges,
//! density bandwidth bounds, clustering radius, hotspot policy, safe-spot
//! search parameters) lives in one [`PipelineConfig`]. Named profiles are
//! defined as TOML files under `profiles/` and embedded at compile time; see
//! [`profiles`]. Any section omitted from a profile falls back to the
//! `standard` values via [`Default`].

pub mod profiles;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a configuration file failed.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// TOML parsing failed.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No embedded profile has the requested name.
    #[error("Unknown profile '{name}'")]
    UnknownProfile {
        /// Requested profile name.
        name: String,
    },

    /// A value is out of its allowed range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of the violated constraint.
        message: String,
    },
}

/// Full configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineConfig {
    /// Profile name recorded in the manifest.
    pub name: String,
    /// Human-readable summary of the profile.
    #[serde(default)]
    pub description: String,
    /// Global seed XORed into every entity seed.
    #[serde(default = "default_seed")]
    pub seed: u32,
    /// Synthetic point generation.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Kernel density estimation.
    #[serde(default)]
    pub density: DensityConfig,
    /// Density-based clustering.
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// Getis-Ord Gi* hotspot policy.
    #[serde(default)]
    pub hotspot: HotspotConfig,
    /// Safe-spot candidate search.
    #[serde(default)]
    pub safe_spot: SafeSpotConfig,
}

const fn default_seed() -> u32 {
    42
}

/// Synthetic point generation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Spread around each anchor in degrees; offsets use `spread / 2` as
    /// the standard deviation.
    pub spread_degrees: f64,
    /// Inclusive lower bound of the per-anchor point count.
    pub min_points_per_anchor: u32,
    /// Inclusive upper bound of the per-anchor point count.
    pub max_points_per_anchor: u32,
    /// Fixed per-anchor point count, overriding the random draw.
    pub points_per_anchor: Option<u32>,
    /// Probability that a group draws its base risk from the high range.
    pub high_risk_probability: f64,
    /// Inclusive lower bound of the high-risk range.
    pub high_risk_min: u32,
    /// Inclusive upper bound of the high-risk range.
    pub high_risk_max: u32,
    /// Inclusive lower bound of the low-risk range.
    pub low_risk_min: u32,
    /// Inclusive upper bound of the low-risk range.
    pub low_risk_max: u32,
    /// Per-point perturbation is drawn from `[-risk_variation, risk_variation]`.
    pub risk_variation: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            spread_degrees: 0.9,
            min_points_per_anchor: 10,
            max_points_per_anchor: 20,
            points_per_anchor: None,
            high_risk_probability: 0.25,
            high_risk_min: 12,
            high_risk_max: 24,
            low_risk_min: 1,
            low_risk_max: 11,
            risk_variation: 3,
        }
    }
}

/// Kernel density bandwidth bounds, in projected meters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Bandwidth used when fewer than two points exist.
    pub fallback_bandwidth_m: f64,
    /// Lower clamp for the rule-of-thumb bandwidth.
    pub min_bandwidth_m: f64,
    /// Upper clamp for the rule-of-thumb bandwidth.
    pub max_bandwidth_m: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            fallback_bandwidth_m: 20_000.0,
            min_bandwidth_m: 10_000.0,
            max_bandwidth_m: 40_000.0,
        }
    }
}

/// DBSCAN parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Neighborhood radius in projected meters.
    pub eps_m: f64,
    /// Minimum neighborhood size (including the point itself) of a core point.
    pub min_samples: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            eps_m: 35_000.0,
            min_samples: 3,
        }
    }
}

/// Hotspot detection policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    /// Desired neighbor count; the effective k is `min(k_neighbors, n - 1)`.
    pub k_neighbors: usize,
    /// A hotspot's z-score must strictly exceed this value.
    pub z_threshold: f64,
    /// A hotspot's `report_count` must be at least this value.
    pub min_reports: u32,
    /// Conditional permutations for pseudo p-values (0 disables them).
    pub permutations: usize,
    /// Radius of the exported hotspot circle in projected meters.
    pub buffer_m: f64,
    /// Number of segments approximating the exported circle.
    pub buffer_segments: usize,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 6,
            z_threshold: 1.5,
            min_reports: 6,
            permutations: 999,
            buffer_m: 6000.0,
            buffer_segments: 64,
        }
    }
}

/// Safe-spot candidate search parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SafeSpotConfig {
    /// Default reference latitude when none is given on the command line.
    pub reference_latitude: f64,
    /// Default reference longitude when none is given on the command line.
    pub reference_longitude: f64,
    /// Search radius in kilometers.
    pub radius_km: f64,
    /// Minimum sampled distance from the reference in kilometers.
    pub min_distance_km: f64,
    /// Number of random candidates drawn.
    pub max_candidates: usize,
    /// Minimum acceptable elevation in feet.
    pub min_elevation_feet: f64,
    /// Assumed tsunami run-up height in meters.
    pub tsunami_height_m: f64,
    /// Margin added on top of the run-up height in meters.
    pub safety_buffer_m: f64,
    /// Fixed degrees-to-kilometers ratio used for offsets and distances.
    pub km_per_degree: f64,
}

impl Default for SafeSpotConfig {
    fn default() -> Self {
        Self {
            reference_latitude: 13.0827,
            reference_longitude: 80.2707,
            radius_km: 10.0,
            min_distance_km: 0.5,
            max_candidates: 200,
            min_elevation_feet: 50.0,
            tsunami_height_m: 10.0,
            safety_buffer_m: 5.0,
            km_per_degree: 111.32,
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out of
    /// range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ensure_finite()?;

        let generation = &self.generation;
        if generation.min_points_per_anchor > generation.max_points_per_anchor {
            return Err(invalid("generation.min_points_per_anchor exceeds max"));
        }
        if generation.high_risk_min > generation.high_risk_max
            || generation.low_risk_min > generation.low_risk_max
        {
            return Err(invalid("generation risk range is empty"));
        }
        if !(0.0..=1.0).contains(&generation.high_risk_probability) {
            return Err(invalid("generation.high_risk_probability must be in [0, 1]"));
        }
        if generation.risk_variation < 0 {
            return Err(invalid("generation.risk_variation must be non-negative"));
        }
        if generation.spread_degrees < 0.0 {
            return Err(invalid("generation.spread_degrees must be non-negative"));
        }

        let density = &self.density;
        if density.min_bandwidth_m <= 0.0 || density.min_bandwidth_m > density.max_bandwidth_m {
            return Err(invalid("density bandwidth bounds are inconsistent"));
        }
        if density.fallback_bandwidth_m <= 0.0 {
            return Err(invalid("density.fallback_bandwidth_m must be positive"));
        }

        if self.clustering.eps_m <= 0.0 || self.clustering.min_samples == 0 {
            return Err(invalid("clustering.eps_m and min_samples must be positive"));
        }

        if self.hotspot.buffer_m <= 0.0 || self.hotspot.buffer_segments < 3 {
            return Err(invalid(
                "hotspot.buffer_m must be positive with at least 3 segments",
            ));
        }

        let safe_spot = &self.safe_spot;
        if safe_spot.radius_km <= 0.0 || safe_spot.km_per_degree <= 0.0 {
            return Err(invalid("safe_spot.radius_km and km_per_degree must be positive"));
        }
        if safe_spot.min_distance_km < 0.0 {
            return Err(invalid("safe_spot.min_distance_km must be non-negative"));
        }

        Ok(())
    }

    /// Rejects NaN and infinite values in every floating-point field.
    fn ensure_finite(&self) -> Result<(), ConfigError> {
        let fields = [
            ("generation.spread_degrees", self.generation.spread_degrees),
            (
                "generation.high_risk_probability",
                self.generation.high_risk_probability,
            ),
            ("density.fallback_bandwidth_m", self.density.fallback_bandwidth_m),
            ("density.min_bandwidth_m", self.density.min_bandwidth_m),
            ("density.max_bandwidth_m", self.density.max_bandwidth_m),
            ("clustering.eps_m", self.clustering.eps_m),
            ("hotspot.z_threshold", self.hotspot.z_threshold),
            ("hotspot.buffer_m", self.hotspot.buffer_m),
            ("safe_spot.reference_latitude", self.safe_spot.reference_latitude),
            ("safe_spot.reference_longitude", self.safe_spot.reference_longitude),
            ("safe_spot.radius_km", self.safe_spot.radius_km),
            ("safe_spot.min_distance_km", self.safe_spot.min_distance_km),
            ("safe_spot.min_elevation_feet", self.safe_spot.min_elevation_feet),
            ("safe_spot.tsunami_height_m", self.safe_spot.tsunami_height_m),
            ("safe_spot.safety_buffer_m", self.safe_spot.safety_buffer_m),
            ("safe_spot.km_per_degree", self.safe_spot.km_per_degree),
        ];

        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, _)) => Err(ConfigError::Invalid {
                message: format!("{name} must be a finite number"),
            }),
            None => Ok(()),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_string(),
    }
}
