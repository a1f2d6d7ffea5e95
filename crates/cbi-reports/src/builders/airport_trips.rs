//! Weekly trips to and from the airport ZIPs, per ZIP and COVID category.

use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::capabilities;
use cbi_storage::sql::Statement;
use rusqlite::Connection;

use super::step::{add_column, copy_table, drop_table};
use super::{ReportBuilder, Step, StepPlan};

#[derive(Debug, Default)]
pub struct AirportTripsBuilder;

const DEPENDENCIES: [Table; 2] = [Table::DriverAlerts, Table::CovidCategories];
const OUTPUTS: [Table; 1] = [Table::AirportTrips];

impl ReportBuilder for AirportTripsBuilder {
    fn name(&self) -> &'static str {
        "airport_trips"
    }

    fn dependencies(&self) -> &[Table] {
        &DEPENDENCIES
    }

    fn outputs(&self) -> &[Table] {
        &OUTPUTS
    }

    fn preflight(&self, conn: &Connection) -> Result<(), ReportError> {
        capabilities::ensure_update_from(conn)?;
        Ok(())
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        let report = Table::AirportTrips;
        Ok(StepPlan::new()
            .sql("drop_target", drop_table(report))
            .sql("copy_categories", copy_table(report, Table::CovidCategories))
            .sql(
                "add_trips_to_airport",
                add_column(report, "trips_to_airport INTEGER DEFAULT 0"),
            )
            .sql(
                "add_trips_from_airport",
                add_column(report, "trips_from_airport INTEGER DEFAULT 0"),
            )
            // Trips leaving a ZIP for the airport.
            .sql(
                "count_trips_to_airport",
                Statement::new("UPDATE ")
                    .table(report)
                    .kw(" AS r SET trips_to_airport = a.trips FROM (")
                    .kw("SELECT pickup_zip_code AS zip_code, week_start, COUNT(*) AS trips FROM ")
                    .table(Table::DriverAlerts)
                    .kw(" WHERE airport_dropoff GROUP BY pickup_zip_code, week_start")
                    .kw(") AS a WHERE r.zip_code = a.zip_code AND r.week_start = a.week_start"),
            )
            // Trips from the airport arriving in a ZIP.
            .sql(
                "count_trips_from_airport",
                Statement::new("UPDATE ")
                    .table(report)
                    .kw(" AS r SET trips_from_airport = a.trips FROM (")
                    .kw("SELECT dropoff_zip_code AS zip_code, week_start, COUNT(*) AS trips FROM ")
                    .table(Table::DriverAlerts)
                    .kw(" WHERE airport_pickup GROUP BY dropoff_zip_code, week_start")
                    .kw(") AS a WHERE r.zip_code = a.zip_code AND r.week_start = a.week_start"),
            )
            .sort_table(report, "zip_code, week_start")
            .into_steps())
    }
}
