//! Report builders.
//!
//! A builder declares the tables it reads and writes and produces an ordered
//! list of named steps. `execute_builder` checks the dependencies, runs the
//! preflight checks and then applies every step inside one BEGIN IMMEDIATE
//! transaction: either every output table is rebuilt or none is touched.

mod airport_trips;
mod ccvi_trips;
mod covid_categories;
mod disadvantaged;
mod driver_alerts;
mod executor;
mod registry;
mod resident_alerts;
mod step;
mod trip_forecasts;

pub use airport_trips::AirportTripsBuilder;
pub use ccvi_trips::CcviTripsBuilder;
pub use covid_categories::{CovidCategoriesBuilder, CovidCategory};
pub use disadvantaged::DisadvantagedBuilder;
pub use driver_alerts::DriverAlertsBuilder;
pub use executor::{execute_builder, BuildSummary};
pub use registry::{default_builders, BuilderSettings, PermitZipSource};
pub use resident_alerts::ResidentAlertsBuilder;
pub use step::{BackfillStep, SqlStep, Step, StepContext, StepPlan};
pub use trip_forecasts::TripForecastsBuilder;

use cbi_core::errors::ReportError;
use cbi_core::Table;
use rusqlite::Connection;

/// A named transactional procedure that rebuilds one or more report tables.
pub trait ReportBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tables that must exist and hold rows before the builder runs.
    fn dependencies(&self) -> &[Table];

    /// Tables this builder drops and recreates. Each has no other writer.
    fn outputs(&self) -> &[Table];

    /// Engine capability checks, run before the transaction opens.
    fn preflight(&self, _conn: &Connection) -> Result<(), ReportError> {
        Ok(())
    }

    /// The ordered steps of one run. Reference data is loaded here so a
    /// broken file fails the run before any DDL.
    fn steps(&self, conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError>;
}
