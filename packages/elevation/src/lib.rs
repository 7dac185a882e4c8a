#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Elevation lookup for safe-spot analysis.
//!
//! Elevations come from a remote provider configured via TOML files in
//! `services/` (see [`service_registry`]):
//!
//! 1. **Open-Elevation** (priority 1), batched `POST` lookups.
//! 2. **`OpenTopoData`** (priority 2, disabled by default), batched `GET`
//!    lookups against an SRTM dataset.
//!
//! Remote lookups are best-effort. [`ElevationService`] sends batches one
//! at a time with a fixed delay between them, and on the first failure
//! switches to the deterministic [`SimulatedElevation`] for the rest of the
//! request. A lookup therefore always yields one elevation per coordinate.

pub mod open_elevation;
pub mod open_topo_data;
pub mod progress;
pub mod service_registry;
pub mod simulator;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coastal_hazard_models::LatLon;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

pub use open_elevation::OpenElevation;
pub use open_topo_data::OpenTopoData;
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use simulator::SimulatedElevation;

use service_registry::{ElevationServiceConfig, ProviderConfig};

/// Errors from remote elevation lookups.
#[derive(Debug, Error)]
pub enum ElevationError {
    /// HTTP request failed (connection, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Elevation service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service returned a different number of elevations than requested.
    #[error("Expected {expected} elevations, received {actual}")]
    CountMismatch {
        /// Number of coordinates sent.
        expected: usize,
        /// Number of elevations received.
        actual: usize,
    },
}

/// Where an elevation value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ElevationSource {
    /// A remote elevation service.
    Remote,
    /// The deterministic local simulator.
    Simulated,
}

/// One elevation value and its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    /// Elevation in meters.
    pub meters: f64,
    /// Which backend produced the value.
    pub source: ElevationSource,
}

/// A backend that resolves elevations for a batch of coordinates.
#[async_trait]
pub trait ElevationProvider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &str;

    /// Returns one elevation (meters) per input coordinate, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError`] on any transport, status, or parse
    /// failure.
    async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError>;
}

/// Best-effort elevation lookup with a deterministic fallback.
pub struct ElevationService {
    remote: Option<Box<dyn ElevationProvider>>,
    simulator: SimulatedElevation,
    batch_size: usize,
    rate_limit: Duration,
    progress: Arc<dyn ProgressCallback>,
}

impl ElevationService {
    /// A service that never touches the network.
    #[must_use]
    pub fn simulated(global_seed: u32) -> Self {
        Self {
            remote: None,
            simulator: SimulatedElevation::new(global_seed),
            batch_size: usize::MAX,
            rate_limit: Duration::ZERO,
            progress: null_progress(),
        }
    }

    /// A service backed by `remote`, falling back to the simulator.
    #[must_use]
    pub fn with_provider(
        remote: Box<dyn ElevationProvider>,
        batch_size: usize,
        rate_limit: Duration,
        global_seed: u32,
    ) -> Self {
        Self {
            remote: Some(remote),
            simulator: SimulatedElevation::new(global_seed),
            batch_size: batch_size.max(1),
            rate_limit,
            progress: null_progress(),
        }
    }

    /// Builds a service from the highest-priority enabled entry in the
    /// service registry, or a simulator-only service when `offline` is set
    /// or no service is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Http`] if the HTTP client cannot be built.
    pub fn from_registry(global_seed: u32, offline: bool) -> Result<Self, ElevationError> {
        if offline {
            log::info!("Offline mode: elevations will be simulated");
            return Ok(Self::simulated(global_seed));
        }

        let Some(config) = service_registry::enabled_services().into_iter().next() else {
            log::warn!("No elevation service enabled; elevations will be simulated");
            return Ok(Self::simulated(global_seed));
        };

        log::info!("Using elevation service '{}' ({})", config.name, config.base_url());
        let remote = build_provider(&config)?;
        Ok(Self::with_provider(
            remote,
            config.max_batch_size(),
            config.rate_limit(),
            global_seed,
        ))
    }

    /// Attaches a progress callback that is advanced once per batch.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Elevation of a single coordinate.
    pub async fn elevation(&self, coord: LatLon) -> ElevationSample {
        self.elevations(&[coord])
            .await
            .pop()
            .unwrap_or_else(|| self.simulate(coord))
    }

    /// Elevations for `coords`, one sample per coordinate in input order.
    ///
    /// Remote batches are sent sequentially with the configured delay
    /// between them. The first failed batch and every batch after it are
    /// served by the simulator; failures are logged, never returned.
    pub async fn elevations(&self, coords: &[LatLon]) -> Vec<ElevationSample> {
        let mut samples = Vec::with_capacity(coords.len());
        if coords.is_empty() {
            return samples;
        }

        self.progress.set_total(coords.len() as u64);
        self.progress.set_message("Looking up elevations".to_string());

        let mut remote = self.remote.as_deref();
        let mut sent_remote = false;

        for batch in coords.chunks(self.batch_size) {
            if let Some(provider) = remote {
                if sent_remote && !self.rate_limit.is_zero() {
                    tokio::time::sleep(self.rate_limit).await;
                }
                sent_remote = true;

                match lookup_checked(provider, batch).await {
                    Ok(values) => {
                        samples.extend(values.into_iter().map(|meters| ElevationSample {
                            meters,
                            source: ElevationSource::Remote,
                        }));
                        self.progress.inc(batch.len() as u64);
                        continue;
                    }
                    Err(e) => {
                        log::warn!(
                            "Elevation service '{}' failed ({e}); simulating the remaining {} coordinates",
                            provider.id(),
                            coords.len() - samples.len(),
                        );
                        remote = None;
                    }
                }
            }

            samples.extend(batch.iter().map(|c| self.simulate(*c)));
            self.progress.inc(batch.len() as u64);
        }

        let simulated = samples
            .iter()
            .filter(|s| s.source == ElevationSource::Simulated)
            .count();
        self.progress.finish(format!(
            "Resolved {} elevations ({simulated} simulated)",
            samples.len()
        ));
        log::debug!(
            "Resolved {} elevations ({simulated} simulated)",
            samples.len()
        );

        samples
    }

    fn simulate(&self, coord: LatLon) -> ElevationSample {
        ElevationSample {
            meters: self.simulator.elevation(coord),
            source: ElevationSource::Simulated,
        }
    }
}

/// Calls the provider and verifies it returned one value per coordinate.
async fn lookup_checked(
    provider: &dyn ElevationProvider,
    batch: &[LatLon],
) -> Result<Vec<f64>, ElevationError> {
    let values = provider.lookup_batch(batch).await?;
    if values.len() != batch.len() {
        return Err(ElevationError::CountMismatch {
            expected: batch.len(),
            actual: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ElevationError::Parse {
            message: "non-finite elevation in response".to_string(),
        });
    }
    Ok(values)
}

fn build_provider(
    config: &ElevationServiceConfig,
) -> Result<Box<dyn ElevationProvider>, ElevationError> {
    Ok(match &config.provider {
        ProviderConfig::OpenElevation { base_url, .. } => {
            Box::new(OpenElevation::new(base_url, config.timeout())?)
        }
        ProviderConfig::OpenTopoData {
            base_url, dataset, ..
        } => Box::new(OpenTopoData::new(base_url, dataset, config.timeout())?),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Returns a fixed elevation, failing from call number `fail_from` on.
    struct StubProvider {
        meters: f64,
        fail_from: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ElevationProvider for StubProvider {
        fn id(&self) -> &str {
            "stub"
        }

        async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_from {
                return Err(ElevationError::Status { status: 503 });
            }
            Ok(vec![self.meters; coords.len()])
        }
    }

    struct ShortProvider;

    #[async_trait]
    impl ElevationProvider for ShortProvider {
        fn id(&self) -> &str {
            "short"
        }

        async fn lookup_batch(&self, _coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
            Ok(vec![1.0])
        }
    }

    fn coords(n: u32) -> Vec<LatLon> {
        (0..n)
            .map(|i| LatLon::new(13.0 + f64::from(i) * 0.01, 80.0))
            .collect()
    }

    fn stub(fail_from: usize) -> (Box<dyn ElevationProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider {
            meters: 123.0,
            fail_from,
            calls: Arc::clone(&calls),
        };
        (Box::new(provider), calls)
    }

    #[tokio::test]
    async fn remote_values_are_used_when_available() {
        let (provider, calls) = stub(usize::MAX);
        let service = ElevationService::with_provider(provider, 2, Duration::ZERO, 42);
        let samples = service.elevations(&coords(5)).await;

        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.source == ElevationSource::Remote));
        assert!(samples.iter().all(|s| (s.meters - 123.0).abs() < f64::EPSILON));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_switches_to_simulator_for_remaining_batches() {
        let (provider, calls) = stub(1);
        let service = ElevationService::with_provider(provider, 2, Duration::ZERO, 42);
        let input = coords(6);
        let samples = service.elevations(&input).await;

        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0].source, ElevationSource::Remote);
        assert_eq!(samples[1].source, ElevationSource::Remote);
        assert!(
            samples[2..]
                .iter()
                .all(|s| s.source == ElevationSource::Simulated)
        );
        // The provider is not called again after the first failure.
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let sim = SimulatedElevation::new(42);
        assert!((samples[4].meters - sim.elevation(input[4])).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn short_response_is_treated_as_failure() {
        let service =
            ElevationService::with_provider(Box::new(ShortProvider), 10, Duration::ZERO, 42);
        let samples = service.elevations(&coords(3)).await;
        assert_eq!(samples.len(), 3);
        assert!(
            samples
                .iter()
                .all(|s| s.source == ElevationSource::Simulated)
        );
    }

    #[tokio::test]
    async fn simulated_service_is_deterministic() {
        let input = coords(4);
        let a = ElevationService::simulated(42).elevations(&input).await;
        let b = ElevationService::simulated(42).elevations(&input).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn single_lookup_returns_one_sample() {
        let (provider, _) = stub(usize::MAX);
        let service = ElevationService::with_provider(provider, 100, Duration::ZERO, 42);
        let sample = service.elevation(LatLon::new(13.0, 80.0)).await;
        assert_eq!(sample.source, ElevationSource::Remote);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let (provider, calls) = stub(usize::MAX);
        let service = ElevationService::with_provider(provider, 100, Duration::ZERO, 42);
        assert!(service.elevations(&[]).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn offline_registry_service_is_simulated() {
        let service = ElevationService::from_registry(42, true).unwrap();
        assert!(service.remote.is_none());
    }

    #[test]
    fn source_string_forms() {
        assert_eq!(ElevationSource::Simulated.to_string(), "simulated");
        assert_eq!(ElevationSource::Remote.as_ref(), "remote");
    }
}
