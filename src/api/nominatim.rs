use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = concat!("muniplaces/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("geocoding request for '{name}' failed: {source}")]
    Request {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("geocoding service returned status {status} for '{name}'")]
    Status {
        name: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to parse geocoding response for '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid {field} '{value}' in geocoding response for '{name}'")]
    InvalidCoordinate {
        name: String,
        field: &'static str,
        value: String,
    },
}

/// Resolves free-text place names to coordinates.
pub trait Geocoder {
    /// Look up one place name.
    ///
    /// # Returns
    /// * `Ok(Some((lat, lon)))` - Coordinates of the primary match
    /// * `Ok(None)` - The provider has no match for `name`
    /// * `Err` - Transport, status or response format failure
    fn geocode(&self, name: &str) -> Result<Option<(f64, f64)>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[allow(dead_code)]
    #[serde(default)]
    display_name: String,
}

/// Geocoder backed by the Nominatim search API
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// # Arguments
    /// * `base_url` - Search endpoint, normally [`NOMINATIM_URL`]
    /// * `user_agent` - Client identifier registered with the provider
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(GeocodeError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, name: &str) -> Result<Option<(f64, f64)>, GeocodeError> {
        tracing::debug!(name, "geocoding");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|source| GeocodeError::Request {
                name: name.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status {
                name: name.to_string(),
                status: response.status(),
            });
        }

        let results: Vec<NominatimResult> =
            response.json().map_err(|source| GeocodeError::Decode {
                name: name.to_string(),
                source,
            })?;

        let Some(result) = results.into_iter().next() else {
            return Ok(None);
        };

        let lat = parse_coordinate(name, "latitude", &result.lat)?;
        let lon = parse_coordinate(name, "longitude", &result.lon)?;

        Ok(Some((lat, lon)))
    }
}

fn parse_coordinate(name: &str, field: &'static str, value: &str) -> Result<f64, GeocodeError> {
    value
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidCoordinate {
            name: name.to_string(),
            field,
            value: value.to_string(),
        })
}
