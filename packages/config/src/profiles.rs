//! Compile-time registry of named analysis profiles.
//!
//! Each profile is a TOML file under `profiles/`. The two shipped profiles
//! differ only in hotspot policy: `standard` uses six neighbors, a 1.5
//! z-score threshold, and a floor of 6 reports; `sensitive` uses four
//! neighbors, 1.35, and a floor of 10.

use crate::{ConfigError, PipelineConfig};

/// Name of the profile used when none is requested.
pub const DEFAULT_PROFILE: &str = "standard";

// ── Compile-time embedded TOML files ────────────────────────────────

const PROFILE_TOMLS: &[(&str, &str)] = &[
    ("standard", include_str!("../profiles/standard.toml")),
    ("sensitive", include_str!("../profiles/sensitive.toml")),
];

#[cfg(test)]
const EXPECTED_PROFILE_COUNT: usize = 2;

/// Returns every embedded profile.
///
/// # Panics
///
/// Panics if any embedded TOML is malformed or invalid (the files ship with
/// the crate, so this indicates a packaging bug).
#[must_use]
pub fn all_profiles() -> Vec<PipelineConfig> {
    PROFILE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            PipelineConfig::from_toml_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse profile '{name}': {e}"))
        })
        .collect()
}

/// Names of all embedded profiles, in registry order.
#[must_use]
pub fn profile_names() -> Vec<&'static str> {
    PROFILE_TOMLS.iter().map(|(name, _)| *name).collect()
}

/// Looks up an embedded profile by name.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownProfile`] if no profile has that name, or a
/// parse/validation error if the embedded TOML is broken.
pub fn profile(name: &str) -> Result<PipelineConfig, ConfigError> {
    let (_, toml_str) = PROFILE_TOMLS
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(name))
        .ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
        })?;
    PipelineConfig::from_toml_str(toml_str)
}
