//! `OpenTopoData` client.
//!
//! Coordinates are passed as a `|`-separated `lat,lon` list in the query
//! string. The public API allows 100 locations per request and one request
//! per second.
//!
//! See <https://www.opentopodata.org/api/>

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use coastal_hazard_models::LatLon;

use crate::{ElevationError, ElevationProvider};

/// `OpenTopoData` `GET /v1/{dataset}` client.
pub struct OpenTopoData {
    client: reqwest::Client,
    url: String,
}

impl OpenTopoData {
    /// Builds a client for `dataset` whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ElevationError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, dataset: &str, timeout: Duration) -> Result<Self, ElevationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/{dataset}", base_url.trim_end_matches('/')),
        })
    }
}

/// Formats coordinates as `lat,lon|lat,lon`.
fn locations_param(coords: &[LatLon]) -> String {
    let mut out = String::new();
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        let _ = write!(out, "{:.6},{:.6}", c.latitude, c.longitude);
    }
    out
}

#[async_trait]
impl ElevationProvider for OpenTopoData {
    fn id(&self) -> &str {
        "open_topo_data"
    }

    async fn lookup_batch(&self, coords: &[LatLon]) -> Result<Vec<f64>, ElevationError> {
        let locations = locations_param(coords);
        let resp = self
            .client
            .get(&self.url)
            .query(&[("locations", locations.as_str())])
            .send()
            .await?;

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

/// Parses an `OpenTopoData` response body.
///
/// Points outside the dataset come back with a `null` elevation; those are
/// reported as sea level.
fn parse_response(body: &serde_json::Value, expected: usize) -> Result<Vec<f64>, ElevationError> {
    if let Some(status) = body["status"].as_str()
        && status != "OK"
    {
        return Err(ElevationError::Parse {
            message: format!(
                "OpenTopoData status {status}: {}",
                body["error"].as_str().unwrap_or("no error message")
            ),
        });
    }

    let results = body["results"]
        .as_array()
        .ok_or_else(|| ElevationError::Parse {
            message: "OpenTopoData response has no results array".to_string(),
        })?;

    if results.len() != expected {
        return Err(ElevationError::CountMismatch {
            expected,
            actual: results.len(),
        });
    }

    Ok(results
        .iter()
        .map(|r| r["elevation"].as_f64().unwrap_or(0.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_locations() {
        let coords = [LatLon::new(13.0827, 80.2707), LatLon::new(-1.5, 2.25)];
        assert_eq!(
            locations_param(&coords),
            "13.082700,80.270700|-1.500000,2.250000"
        );
    }

    #[test]
    fn parses_results_with_null_as_sea_level() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                {"dataset": "srtm90m", "elevation": 42.0},
                {"dataset": "srtm90m", "elevation": null}
            ]
        });
        let values = parse_response(&body, 2).unwrap();
        assert!((values[0] - 42.0).abs() < f64::EPSILON);
        assert!(values[1].abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_error_status() {
        let body = serde_json::json!({"status": "INVALID_REQUEST", "error": "Too many locations"});
        let err = parse_response(&body, 1).unwrap_err();
        assert!(err.to_string().contains("Too many locations"));
    }
}
