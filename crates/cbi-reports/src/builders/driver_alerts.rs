//! `req_1a_covid_alerts_drivers`: every trip with airport flags, time
//! buckets and the COVID category at both ends.

use cbi_core::constants::AIRPORT_ZIP_CODES;
use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::capabilities;
use cbi_storage::sql::{Literal, Statement};
use rusqlite::Connection;

use super::step::{add_column, copy_table, drop_table};
use super::{ReportBuilder, Step, StepPlan};

#[derive(Debug, Default)]
pub struct DriverAlertsBuilder;

const DEPENDENCIES: [Table; 2] = [Table::TaxiTrips, Table::CovidCategories];
const OUTPUTS: [Table; 1] = [Table::DriverAlerts];

/// `'60666', '60656', ...`
fn airport_zip_list(stmt: Statement) -> Statement {
    AIRPORT_ZIP_CODES
        .iter()
        .enumerate()
        .fold(stmt, |stmt, (i, zip)| {
            let stmt = if i > 0 { stmt.kw(", ") } else { stmt };
            stmt.literal(&Literal::text(*zip))
        })
}

fn flag_airport(column: &'static str, zip_column: &'static str) -> Statement {
    let stmt = Statement::new("UPDATE ")
        .table(Table::DriverAlerts)
        .kw(" SET ")
        .kw(column)
        .kw(" = TRUE WHERE ")
        .kw(zip_column)
        .kw(" IN (");
    airport_zip_list(stmt).kw(")")
}

fn join_category(column: &'static str, zip_column: &'static str) -> Statement {
    Statement::new("UPDATE ")
        .table(Table::DriverAlerts)
        .kw(" AS t SET ")
        .kw(column)
        .kw(" = c.covid_cat FROM ")
        .table(Table::CovidCategories)
        .kw(" AS c WHERE t.")
        .kw(zip_column)
        .kw(" = c.zip_code AND t.week_start = c.week_start")
}

impl ReportBuilder for DriverAlertsBuilder {
    fn name(&self) -> &'static str {
        "driver_alerts"
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
        let t = Table::DriverAlerts;
        Ok(StepPlan::new()
            .sql("drop_target", drop_table(t))
            .sql("copy_trips", copy_table(t, Table::TaxiTrips))
            .sql(
                "add_airport_dropoff",
                add_column(t, "airport_dropoff BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "add_airport_pickup",
                add_column(t, "airport_pickup BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "flag_airport_dropoff",
                flag_airport("airport_dropoff", "dropoff_zip_code"),
            )
            .sql(
                "flag_airport_pickup",
                flag_airport("airport_pickup", "pickup_zip_code"),
            )
            .sql("add_day", add_column(t, "day TEXT"))
            .sql(
                "set_day",
                Statement::new("UPDATE ")
                    .table(t)
                    .kw(" SET day = date(trip_start_timestamp)"),
            )
            .sql("add_week_start", add_column(t, "week_start TEXT"))
            // The Sunday before the Monday that starts the trip's week.
            .sql(
                "set_week_start",
                Statement::new("UPDATE ").table(t).kw(
                    " SET week_start = date(trip_start_timestamp, '-6 days', 'weekday 1', '-1 day')",
                ),
            )
            .sql("add_month_start", add_column(t, "month_start TEXT"))
            .sql(
                "set_month_start",
                Statement::new("UPDATE ")
                    .table(t)
                    .kw(" SET month_start = date(trip_start_timestamp, 'start of month')"),
            )
            .sql("add_pickup_covid_cat", add_column(t, "pickup_covid_cat TEXT"))
            .sql("add_dropoff_covid_cat", add_column(t, "dropoff_covid_cat TEXT"))
            .sql(
                "join_pickup_category",
                join_category("pickup_covid_cat", "pickup_zip_code"),
            )
            .sql(
                "join_dropoff_category",
                join_category("dropoff_covid_cat", "dropoff_zip_code"),
            )
            .into_steps())
    }
}
