//! Open-Elevation client.
//!
//! Accepts a JSON body of coordinates and returns one elevation per input
//! in the same order. The public instance is rate limited; the caller
//! spaces batches using `rate_limit_ms` from the service TOML.
//!
//! See <https://github.com/Jorl17/open-elevation/blob/master/docs/api.md>

use std::time::Duration;

use async_trait::async_trait;
use coastal_hazard_models::LatLon;
use serde::Serialize;

use crate::{ElevationError, ElevationProvider};

/// Open-Elevation `POST /api/v1/lookup` client.
pub struct OpenElevation {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct LookupRequest {
    locations: Vec<Location>,
}

#[derive(Serialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

impl OpenElevation {
    /// Builds a client whose every request times out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ElevationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl ElevationProvider for OpenElevation {
    fn id(&self) -> &str {
        "open_elevation"
    }

    async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
        let body = LookupRequest {
            locations: coords
                .iter()
                .map(|c| Location {
                    latitude: c.latitude,
                    longitude: c.longitude,
                })
                .collect(),
        };

        let resp = self.client.post(&self.base_url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ElevationError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body, coords.len())
    }
}

/// Parses an Open-Elevation response body.
fn parse_response(body: &serde_json::Value, expected: usize) -> Result<Vec<f64>, ElevationError> {
    let results = body["results"]
        .as_array()
        .ok_or_else(|| ElevationError::Parse {
            message: "Open-Elevation response has no results array".to_string(),
        })?;

    if results.len() != expected {
        return Err(ElevationError::CountMismatch {
            expected,
            actual: results.len(),
        });
    }

    results
        .iter()
        .map(|r| {
            r["elevation"].as_f64().ok_or_else(|| ElevationError::Parse {
                message: format!("Missing elevation in Open-Elevation result: {r}"),
            })
        })
        .collect()
}
