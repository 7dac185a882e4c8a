#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Runs the coastal hazard pipeline and exports its results.
//!
//! One run generates the synthetic point set, analyzes it, searches for
//! safe spots around a reference location, and writes four `GeoJSON`
//! layers plus `manifest.json` (see [`export`]). The output directory is
//! fully rewritten on every run.

pub mod export;
pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use coastal_hazard_analysis::{find_safe_spots, generate_and_analyze};
use coastal_hazard_config::profiles::{self, DEFAULT_PROFILE};
use coastal_hazard_config::{ConfigError, PipelineConfig};
use coastal_hazard_elevation::{ElevationError, ElevationService, ProgressCallback};
use coastal_hazard_models::{LatLon, Manifest, SafeSpotOutcome};
use thiserror::Error;

use crate::export::ExportError;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Elevation(#[from] ElevationError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Default output directory: `data/generated` under the workspace root.
#[must_use]
pub fn output_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(
            || PathBuf::from("data/generated"),
            |root| root.join("data/generated"),
        )
}

/// Options for a full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Named profile. Ignored when `config` is set.
    pub profile: Option<String>,

    /// Path to a TOML configuration file.
    pub config: Option<PathBuf>,

    /// Overrides [`output_dir`].
    pub output_dir: Option<PathBuf>,

    /// Overrides the configured safe-spot reference location.
    pub reference: Option<LatLon>,

    /// Known reference elevation in meters; skips the reference lookup.
    pub reference_elevation: Option<f64>,

    /// Simulate every elevation instead of calling the remote service.
    pub offline: bool,
}

/// Resolves the configuration from a file, a named profile, or the default
/// profile, in that order of precedence.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be loaded or the profile is
/// unknown.
pub fn resolve_config(
    profile: Option<&str>,
    config: Option<&Path>,
) -> Result<PipelineConfig, ConfigError> {
    match (config, profile) {
        (Some(path), _) => PipelineConfig::load(path),
        (None, Some(name)) => profiles::profile(name),
        (None, None) => profiles::profile(DEFAULT_PROFILE),
    }
}

/// The configured safe-spot reference location.
#[must_use]
pub const fn configured_reference(config: &PipelineConfig) -> LatLon {
    LatLon::new(
        config.safe_spot.reference_latitude,
        config.safe_spot.reference_longitude,
    )
}

/// Runs generation, analysis, the safe-spot search, and export.
///
/// # Errors
///
/// Returns [`GenerateError`] if the configuration cannot be resolved, the
/// elevation client cannot be built, or any output cannot be written.
pub async fn run(
    args: &RunArgs,
    progress: Arc<dyn ProgressCallback>,
) -> Result<Manifest, GenerateError> {
    let config = resolve_config(args.profile.as_deref(), args.config.as_deref())?;
    log::info!("Running profile '{}' with seed {}", config.name, config.seed);

    let analysis = generate_and_analyze(&config);

    let elevation = ElevationService::from_registry(config.seed, args.offline)?
        .with_progress(progress);
    let reference = args
        .reference
        .unwrap_or_else(|| configured_reference(&config));
    let outcome = find_safe_spots(
        reference,
        args.reference_elevation,
        &config.safe_spot,
        config.seed,
        &elevation,
    )
    .await;

    let dir = args.output_dir.clone().unwrap_or_else(output_dir);
    let manifest = export::export_all(&dir, &analysis, &outcome, &config.name, config.seed)?;

    log::info!(
        "Exported {} points, {} clusters, {} hotspots, {} safe spots to {}",
        manifest.stats.num_points,
        manifest.stats.num_clusters,
        manifest.stats.num_hotspots,
        manifest.stats.num_safe_spots,
        dir.display()
    );
    Ok(manifest)
}

/// Runs only the safe-spot search for `reference`.
///
/// # Errors
///
/// Returns [`GenerateError`] if the configuration cannot be resolved or the
/// elevation client cannot be built.
pub async fn safe_spots(
    reference: LatLon,
    reference_elevation: Option<f64>,
    profile: Option<&str>,
    config: Option<&Path>,
    offline: bool,
    progress: Arc<dyn ProgressCallback>,
) -> Result<SafeSpotOutcome, GenerateError> {
    let config = resolve_config(profile, config)?;
    let elevation =
        ElevationService::from_registry(config.seed, offline)?.with_progress(progress);
    Ok(find_safe_spots(
        reference,
        reference_elevation,
        &config.safe_spot,
        config.seed,
        &elevation,
    )
    .await)
}
