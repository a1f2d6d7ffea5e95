//! Google Maps reverse geocoding.

use std::time::Duration;

use cbi_core::errors::ReportError;
use serde::Deserialize;

use super::ReverseGeocoder;

const ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

pub struct GoogleGeocoder {
    agent: ureq::Agent,
    api_key: String,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            agent,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl std::fmt::Debug for GoogleGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleGeocoder")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GeocodeResponse {
    /// The first result's postal code.
    fn postal_code(self) -> Result<Option<String>, ReportError> {
        match self.status.as_str() {
            "OK" => Ok(self.results.into_iter().next().and_then(|r| {
                r.address_components
                    .into_iter()
                    .find(|c| c.types.iter().any(|t| t == "postal_code"))
                    .map(|c| c.long_name)
            })),
            "ZERO_RESULTS" => Ok(None),
            other => Err(ReportError::Geocoding {
                message: match self.error_message {
                    Some(msg) => format!("{other}: {msg}"),
                    None => other.to_string(),
                },
            }),
        }
    }
}

/// The request URL carries the API key, so it is left out of the message.
fn request_error(err: ureq::Error) -> ReportError {
    let message = match err {
        ureq::Error::Status(code, _) => format!("geocoder returned HTTP {code}"),
        ureq::Error::Transport(t) => format!("geocoder request failed: {}", t.kind()),
    };
    ReportError::Geocoding { message }
}

impl ReverseGeocoder for GoogleGeocoder {
    fn postal_code(&self, latitude: f64, longitude: f64) -> Result<Option<String>, ReportError> {
        let response: GeocodeResponse = self
            .agent
            .get(&self.endpoint)
            .query("latlng", &format!("{latitude},{longitude}"))
            .query("key", &self.api_key)
            .call()
            .map_err(request_error)?
            .into_json()
            .map_err(|e| ReportError::Geocoding {
                message: format!("invalid geocoder response: {e}"),
            })?;
        response.postal_code()
    }
}
