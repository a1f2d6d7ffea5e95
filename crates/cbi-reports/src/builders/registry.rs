//! The default builder set and the settings it is assembled from.

use std::path::PathBuf;
use std::sync::Arc;

use cbi_core::config::CbiConfig;

use super::{
    AirportTripsBuilder, CcviTripsBuilder, CovidCategoriesBuilder, DisadvantagedBuilder,
    DriverAlertsBuilder, ReportBuilder, ResidentAlertsBuilder, TripForecastsBuilder,
};
use crate::crosswalk::{CrosswalkKind, ProjectRoot};
use crate::zip::{GeocodingBackfill, GoogleGeocoder, ZipBackfill};

/// Where permit ZIP codes come from.
#[derive(Clone, Default)]
pub enum PermitZipSource {
    /// The community-area crosswalk, same as the disadvantaged table.
    #[default]
    Crosswalk,
    /// A per-row strategy, normally live reverse geocoding.
    Geocoding(Arc<dyn ZipBackfill>),
}

impl PermitZipSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crosswalk => "crosswalk",
            Self::Geocoding(strategy) => strategy.name(),
        }
    }
}

/// Inputs the builders need beyond the database.
#[derive(Clone)]
pub struct BuilderSettings {
    pub crosswalk_path: PathBuf,
    pub permit_zips: PermitZipSource,
}

impl BuilderSettings {
    pub fn new(crosswalk_path: impl Into<PathBuf>) -> Self {
        Self {
            crosswalk_path: crosswalk_path.into(),
            permit_zips: PermitZipSource::Crosswalk,
        }
    }

    pub fn with_permit_zips(mut self, source: PermitZipSource) -> Self {
        self.permit_zips = source;
        self
    }

    pub fn from_config(config: &CbiConfig, root: &ProjectRoot) -> Self {
        let settings = Self::new(root.crosswalk_path(CrosswalkKind::CommunityAreaToZip));
        if !config.geocoding.effective_use_geocoding() {
            return settings;
        }
        match config
            .geocoding
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            Some(key) => {
                let geocoder = GeocodingBackfill::new(GoogleGeocoder::new(key));
                settings.with_permit_zips(PermitZipSource::Geocoding(Arc::new(geocoder)))
            }
            None => {
                tracing::warn!("geocoding enabled without an api key; using the crosswalk");
                settings
            }
        }
    }
}

/// Every builder, in registration order.
pub fn default_builders(settings: &BuilderSettings) -> Vec<Box<dyn ReportBuilder>> {
    vec![
        Box::new(CovidCategoriesBuilder),
        Box::new(DriverAlertsBuilder),
        Box::new(ResidentAlertsBuilder),
        Box::new(AirportTripsBuilder),
        Box::new(CcviTripsBuilder),
        Box::new(TripForecastsBuilder),
        Box::new(DisadvantagedBuilder::new(
            settings.crosswalk_path.clone(),
            settings.permit_zips.clone(),
        )),
    ]
}
