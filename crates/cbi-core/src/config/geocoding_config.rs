//! Live reverse-geocoding feature flag.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Resolve permit ZIP codes with a live geocoder instead of the static
    /// crosswalk. Default: false.
    pub use_geocoding: Option<bool>,
    /// Geocoding API key. Required when `use_geocoding` is on.
    pub api_key: Option<String>,
}

impl GeocodingConfig {
    pub fn effective_use_geocoding(&self) -> bool {
        self.use_geocoding.unwrap_or(false)
    }
}
