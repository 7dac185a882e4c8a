//! Compile-time registry of elevation service configurations.
//!
//! Each remote elevation provider is defined in a TOML file under
//! `services/`. The registry embeds these at compile time and exposes them
//! via [`all_services`] and [`enabled_services`].

use std::time::Duration;

use serde::Deserialize;

/// An elevation service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ElevationServiceConfig {
    /// Unique identifier (e.g., `"open_elevation"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order. Lower values are preferred.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Open-Elevation `POST /api/v1/lookup`.
    OpenElevation {
        /// Lookup endpoint URL.
        base_url: String,
        /// Maximum coordinates per request.
        max_batch_size: usize,
        /// Delay between consecutive requests in milliseconds.
        rate_limit_ms: u64,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// `OpenTopoData` `GET /v1/{dataset}`.
    OpenTopoData {
        /// API base URL (without the dataset segment).
        base_url: String,
        /// Dataset name (e.g., `"srtm90m"`).
        dataset: String,
        /// Maximum coordinates per request.
        max_batch_size: usize,
        /// Delay between consecutive requests in milliseconds.
        rate_limit_ms: u64,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

impl ElevationServiceConfig {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::OpenElevation { base_url, .. }
            | ProviderConfig::OpenTopoData { base_url, .. } => base_url,
        }
    }

    /// Maximum coordinates per request (at least 1).
    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        match &self.provider {
            ProviderConfig::OpenElevation { max_batch_size, .. }
            | ProviderConfig::OpenTopoData { max_batch_size, .. } => (*max_batch_size).max(1),
        }
    }

    /// Delay between consecutive requests.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        match &self.provider {
            ProviderConfig::OpenElevation { rate_limit_ms, .. }
            | ProviderConfig::OpenTopoData { rate_limit_ms, .. } => {
                Duration::from_millis(*rate_limit_ms)
            }
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        match &self.provider {
            ProviderConfig::OpenElevation { timeout_secs, .. }
            | ProviderConfig::OpenTopoData { timeout_secs, .. } => {
                Duration::from_secs(*timeout_secs)
            }
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("open_elevation", include_str!("../services/open_elevation.toml")),
    ("open_topo_data", include_str!("../services/open_topo_data.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all elevation service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this cannot happen at runtime for a tested build).
#[must_use]
pub fn all_services() -> Vec<ElevationServiceConfig> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse elevation service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<ElevationServiceConfig> {
    let mut services: Vec<ElevationServiceConfig> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}
