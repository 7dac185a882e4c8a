//! Evacuation safe-spot search around a reference location.
//!
//! The search is skipped entirely when the reference location already sits
//! above the tsunami run-up height. Otherwise candidates are drawn at random
//! bearings and distances inside the search radius, their elevations are
//! resolved through [`ElevationService`], and only candidates strictly above
//! the required elevation are kept.

use coastal_hazard_config::SafeSpotConfig;
use coastal_hazard_elevation::ElevationService;
use coastal_hazard_models::{LatLon, METERS_PER_FOOT, SafeSpotCandidate, SafeSpotOutcome};
use coastal_hazard_random::{SeedKey, stream};
use rand::Rng;

/// Scores saturate at this value.
const MAX_SAFETY_SCORE: f64 = 100.0;

/// Score points per meter above the tsunami run-up height.
const SCORE_PER_METER: f64 = 5.0;

/// Smallest longitude scale factor, so the search stays finite at the poles.
const MIN_COS_LATITUDE: f64 = 1e-6;

/// Runs the safe-spot search for `reference`.
///
/// `reference_elevation` skips the reference lookup when already known.
pub async fn find_safe_spots(
    reference: LatLon,
    reference_elevation: Option<f64>,
    config: &SafeSpotConfig,
    global_seed: u32,
    elevation: &ElevationService,
) -> SafeSpotOutcome {
    let reference_elevation = match reference_elevation {
        Some(meters) => meters,
        None => {
            let sample = elevation.elevation(reference).await;
            log::info!(
                "Reference elevation {:.1} m ({})",
                sample.meters,
                sample.source
            );
            sample.meters
        }
    };

    if reference_elevation > config.tsunami_height_m {
        log::info!(
            "Reference ({:.4}, {:.4}) at {reference_elevation:.1} m is above the {:.1} m run-up height",
            reference.latitude,
            reference.longitude,
            config.tsunami_height_m
        );
        return SafeSpotOutcome::AlreadySafe {
            reference,
            elevation_meters: reference_elevation,
            tsunami_height_meters: config.tsunami_height_m,
        };
    }

    let candidates = sample_candidates(reference, config, global_seed);
    let samples = elevation.elevations(&candidates).await;
    let required = required_elevation(config);

    let mut spots: Vec<SafeSpotCandidate> = candidates
        .iter()
        .zip(&samples)
        .filter(|(_, s)| s.meters > required)
        .map(|(c, s)| {
            let above = s.meters - config.tsunami_height_m;
            SafeSpotCandidate {
                latitude: c.latitude,
                longitude: c.longitude,
                elevation_meters: s.meters,
                distance_from_reference_km: approx_distance_km(reference, *c, config.km_per_degree),
                elevation_above_tsunami_meters: above,
                safety_score: (above * SCORE_PER_METER).min(MAX_SAFETY_SCORE),
            }
        })
        .collect();

    spots.sort_by(|a, b| {
        b.safety_score
            .total_cmp(&a.safety_score)
            .then(a.distance_from_reference_km.total_cmp(&b.distance_from_reference_km))
    });

    if spots.is_empty() {
        log::warn!(
            "No location within {} km of ({:.4}, {:.4}) is above {required:.1} m",
            config.radius_km,
            reference.latitude,
            reference.longitude
        );
    } else {
        log::info!(
            "{} of {} candidates are above {required:.1} m",
            spots.len(),
            candidates.len()
        );
    }

    SafeSpotOutcome::Searched {
        reference,
        reference_elevation_meters: reference_elevation,
        required_elevation_meters: required,
        candidates_sampled: candidates.len(),
        spots,
    }
}

/// Elevation a candidate must strictly exceed.
#[must_use]
pub fn required_elevation(config: &SafeSpotConfig) -> f64 {
    (config.min_elevation_feet * METERS_PER_FOOT)
        .max(config.tsunami_height_m + config.safety_buffer_m)
}

/// Draws up to `max_candidates` locations around `reference`, dropping any
/// that land outside the search radius.
#[must_use]
pub fn sample_candidates(reference: LatLon, config: &SafeSpotConfig, global_seed: u32) -> Vec<LatLon> {
    let mut rng = stream(
        SeedKey::SafeSpotSearch {
            latitude: reference.latitude,
            longitude: reference.longitude,
        },
        global_seed,
    );

    let radius = config.radius_km;
    let min_distance = config.min_distance_km.min(radius);
    let lon_scale = reference
        .latitude
        .to_radians()
        .cos()
        .max(MIN_COS_LATITUDE);

    let candidates: Vec<LatLon> = (0..config.max_candidates)
        .filter_map(|_| {
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let distance = rng.gen_range(min_distance..=radius);

            let dlat = distance / config.km_per_degree * angle.sin();
            let dlon = distance / (config.km_per_degree * lon_scale) * angle.cos();
            let candidate = LatLon::new(reference.latitude + dlat, reference.longitude + dlon);

            (approx_distance_km(reference, candidate, config.km_per_degree) <= radius)
                .then_some(candidate)
        })
        .collect();

    log::debug!(
        "Kept {} of {} sampled candidates inside {radius} km",
        candidates.len(),
        config.max_candidates
    );
    candidates
}

/// Equirectangular distance in kilometers, scaling longitude by the cosine
/// of the mean latitude.
#[must_use]
pub fn approx_distance_km(a: LatLon, b: LatLon, km_per_degree: f64) -> f64 {
    let mean_lat = ((a.latitude + b.latitude) / 2.0).to_radians();
    let dx = (b.longitude - a.longitude) * km_per_degree * mean_lat.cos();
    let dy = (b.latitude - a.latitude) * km_per_degree;
    dx.hypot(dy)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use coastal_hazard_elevation::simulator::COAST_REFERENCE;
    use coastal_hazard_elevation::{ElevationError, ElevationProvider};

    use super::*;

    struct FlatProvider {
        meters: f64,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ElevationProvider for FlatProvider {
        fn id(&self) -> &str {
            "flat"
        }

        async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.meters; coords.len()])
        }
    }

    fn flat(meters: f64) -> (ElevationService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FlatProvider {
            meters,
            calls: Arc::clone(&calls),
        };
        let service = ElevationService::with_provider(Box::new(provider), 100, Duration::ZERO, 42);
        (service, calls)
    }

    /// Cycles through a fixed set of elevations by position within a batch.
    struct PatternProvider {
        pattern: Vec<f64>,
    }

    #[async_trait]
    impl ElevationProvider for PatternProvider {
        fn id(&self) -> &str {
            "pattern"
        }

        async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
            Ok((0..coords.len())
                .map(|i| self.pattern[i % self.pattern.len()])
                .collect())
        }
    }

    fn reference() -> LatLon {
        let config = SafeSpotConfig::default();
        LatLon::new(config.reference_latitude, config.reference_longitude)
    }

    #[tokio::test]
    async fn high_reference_is_already_safe_without_lookups() {
        let (service, calls) = flat(100.0);
        let config = SafeSpotConfig::default();

        let outcome = find_safe_spots(reference(), Some(50.0), &config, 42, &service).await;

        assert!(outcome.is_safe_elevation());
        assert!(outcome.spots().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let SafeSpotOutcome::AlreadySafe {
            elevation_meters,
            tsunami_height_meters,
            ..
        } = outcome
        else {
            panic!("expected already-safe outcome");
        };
        assert!((elevation_meters - 50.0).abs() < f64::EPSILON);
        assert!((tsunami_height_meters - 10.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_reference_elevation_is_looked_up() {
        let (service, calls) = flat(20.0);
        let config = SafeSpotConfig::default();

        let outcome = find_safe_spots(reference(), None, &config, 42, &service).await;

        assert!(outcome.is_safe_elevation());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reference_at_run_up_height_is_not_safe() {
        let (service, _) = flat(20.0);
        let config = SafeSpotConfig::default();

        let outcome = find_safe_spots(reference(), Some(10.0), &config, 42, &service).await;
        assert!(!outcome.is_safe_elevation());
    }

    #[tokio::test]
    async fn qualifying_candidates_are_scored_and_ordered() {
        let (service, _) = flat(20.0);
        let config = SafeSpotConfig::default();

        let outcome = find_safe_spots(reference(), Some(2.0), &config, 42, &service).await;
        let SafeSpotOutcome::Searched {
            required_elevation_meters,
            candidates_sampled,
            spots,
            ..
        } = &outcome
        else {
            panic!("expected a search");
        };

        assert!((required_elevation_meters - 50.0 * METERS_PER_FOOT).abs() < 1e-9);
        assert_eq!(spots.len(), *candidates_sampled);
        assert!(!spots.is_empty() && spots.len() <= config.max_candidates);
        for spot in spots {
            assert!((spot.safety_score - 50.0).abs() < 1e-9);
            assert!((spot.elevation_above_tsunami_meters - 10.0).abs() < 1e-9);
            assert!(spot.distance_from_reference_km <= config.radius_km);
        }
        assert!(
            spots
                .windows(2)
                .all(|w| w[0].distance_from_reference_km <= w[1].distance_from_reference_km)
        );
    }

    #[tokio::test]
    async fn candidates_must_strictly_exceed_required_elevation() {
        let config = SafeSpotConfig::default();
        let required = required_elevation(&config);
        let pattern = vec![required - 1.0, required, required + 0.5, 30.0];
        let provider = PatternProvider {
            pattern: pattern.clone(),
        };
        let service = ElevationService::with_provider(Box::new(provider), 100, Duration::ZERO, 42);

        let outcome = find_safe_spots(reference(), Some(0.0), &config, 42, &service).await;
        let SafeSpotOutcome::Searched {
            candidates_sampled,
            spots,
            ..
        } = &outcome
        else {
            panic!("expected a search");
        };

        let expected = (0..*candidates_sampled).filter(|i| i % 4 >= 2).count();
        assert!(expected > 0);
        assert_eq!(spots.len(), expected);
        assert!(spots.iter().all(|s| s.elevation_meters > required));
        assert!(
            !spots
                .iter()
                .any(|s| s.elevation_meters.total_cmp(&required).is_eq())
        );
        assert!(spots.iter().any(|s| s.elevation_meters.total_cmp(&pattern[2]).is_eq()));
        assert!(spots.iter().any(|s| s.elevation_meters.total_cmp(&30.0).is_eq()));

        // Higher ground scores first.
        let first_low = spots
            .iter()
            .position(|s| s.elevation_meters < 30.0)
            .unwrap_or(spots.len());
        assert!(spots[first_low..].iter().all(|s| s.elevation_meters < 30.0));
    }

    #[tokio::test]
    async fn score_is_capped() {
        let (service, _) = flat(500.0);
        let config = SafeSpotConfig::default();

        let outcome = find_safe_spots(reference(), Some(0.0), &config, 42, &service).await;
        assert!(
            outcome
                .spots()
                .iter()
                .all(|s| (s.safety_score - MAX_SAFETY_SCORE).abs() < f64::EPSILON)
        );
    }

    #[tokio::test]
    async fn unreachable_height_yields_empty_search() {
        let service = ElevationService::simulated(42);
        let config = SafeSpotConfig {
            tsunami_height_m: 600.0,
            ..SafeSpotConfig::default()
        };

        let outcome = find_safe_spots(COAST_REFERENCE, None, &config, 42, &service).await;
        let SafeSpotOutcome::Searched {
            candidates_sampled,
            spots,
            ..
        } = outcome
        else {
            panic!("expected a search");
        };
        assert!(candidates_sampled > 0 && candidates_sampled <= 200);
        assert!(spots.is_empty());
    }

    #[tokio::test]
    async fn simulated_search_is_reproducible() {
        let config = SafeSpotConfig::default();
        let a = find_safe_spots(reference(), None, &config, 42, &ElevationService::simulated(42)).await;
        let b = find_safe_spots(reference(), None, &config, 42, &ElevationService::simulated(42)).await;
        assert_eq!(a, b);
    }

    #[test]
    fn candidates_stay_inside_radius() {
        let config = SafeSpotConfig::default();
        let origin = reference();
        let candidates = sample_candidates(origin, &config, 42);

        assert!(candidates.len() > 150 && candidates.len() <= config.max_candidates);
        for c in &candidates {
            assert!(approx_distance_km(origin, *c, config.km_per_degree) <= config.radius_km);
        }
        assert_eq!(candidates, sample_candidates(origin, &config, 42));
    }

    #[test]
    fn min_distance_is_capped_by_radius() {
        let config = SafeSpotConfig {
            radius_km: 0.2,
            min_distance_km: 0.5,
            ..SafeSpotConfig::default()
        };
        let origin = reference();
        let candidates = sample_candidates(origin, &config, 42);
        assert!(!candidates.is_empty());
        for c in &candidates {
            let d = approx_distance_km(origin, *c, config.km_per_degree);
            assert!((d - 0.2).abs() < 1e-3, "distance {d}");
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = approx_distance_km(LatLon::new(10.0, 80.0), LatLon::new(11.0, 80.0), 111.32);
        assert!((d - 111.32).abs() < 1e-9);
    }

    #[test]
    fn required_elevation_takes_the_stricter_rule() {
        let config = SafeSpotConfig::default();
        assert!((required_elevation(&config) - 15.24).abs() < 1e-9);

        let config = SafeSpotConfig {
            tsunami_height_m: 20.0,
            ..SafeSpotConfig::default()
        };
        assert!((required_elevation(&config) - 25.0).abs() < 1e-9);
    }
}
