//! Deterministic elevation simulator used when no remote service answers.
//!
//! Terrain is modeled as rising linearly with the approximate distance from
//! a single coastal reference point, plus bounded per-coordinate noise, and
//! flattened close to the shore. This is a stand-in for demonstrations, not
//! a terrain model: the coastline shape is ignored entirely.

use async_trait::async_trait;
use coastal_hazard_models::LatLon;
use coastal_hazard_random::{SeedKey, stream};
use rand::Rng;

use crate::{ElevationError, ElevationProvider};

/// Fixed coastal reference point (Chennai shoreline).
pub const COAST_REFERENCE: LatLon = LatLon::new(13.05, 80.28);

/// Degrees-to-kilometers ratio for the distance approximation.
const KM_PER_DEGREE: f64 = 111.32;

/// Elevation gained per kilometer inland.
const SLOPE_M_PER_KM: f64 = 1.8;

/// Terrain noise is uniform in `[-NOISE_AMPLITUDE_M, NOISE_AMPLITUDE_M]`.
pub const NOISE_AMPLITUDE_M: f64 = 12.0;

/// Within this distance of the reference, elevation is scaled down.
const NEAR_COAST_KM: f64 = 3.0;

const NEAR_COAST_FACTOR: f64 = 0.4;

/// Coordinate-seeded elevation simulator.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedElevation {
    global_seed: u32,
}

impl SimulatedElevation {
    /// Creates a simulator whose noise streams mix in `global_seed`.
    #[must_use]
    pub const fn new(global_seed: u32) -> Self {
        Self { global_seed }
    }

    /// Approximate distance from [`COAST_REFERENCE`] in kilometers.
    #[must_use]
    pub fn distance_from_coast_km(coord: LatLon) -> f64 {
        let mean_lat = ((coord.latitude + COAST_REFERENCE.latitude) / 2.0).to_radians();
        let dlat = coord.latitude - COAST_REFERENCE.latitude;
        let dlon = (coord.longitude - COAST_REFERENCE.longitude) * mean_lat.cos();
        dlat.hypot(dlon) * KM_PER_DEGREE
    }

    /// Simulated elevation in meters, rounded to 0.1 m and never negative.
    ///
    /// Identical coordinates always produce identical elevations.
    #[must_use]
    pub fn elevation(&self, coord: LatLon) -> f64 {
        let distance_km = Self::distance_from_coast_km(coord);
        let mut rng = stream(
            SeedKey::SimulatedElevation {
                latitude: coord.latitude,
                longitude: coord.longitude,
            },
            self.global_seed,
        );
        let noise = rng.gen_range(-NOISE_AMPLITUDE_M..=NOISE_AMPLITUDE_M);

        let mut meters = SLOPE_M_PER_KM.mul_add(distance_km, noise);
        if distance_km < NEAR_COAST_KM {
            meters *= NEAR_COAST_FACTOR;
        }

        (meters.max(0.0) * 10.0).round() / 10.0
    }

    /// Upper bound of [`Self::elevation`] at a given distance from the coast.
    #[must_use]
    pub fn max_elevation_at(distance_km: f64) -> f64 {
        SLOPE_M_PER_KM.mul_add(distance_km, NOISE_AMPLITUDE_M)
    }
}

#[async_trait]
impl ElevationProvider for SimulatedElevation {
    fn id(&self) -> &str {
        "simulated"
    }

    async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
        Ok(coords.iter().map(|c| self.elevation(*c)).collect())
    }
}
