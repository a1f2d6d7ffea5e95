//! Naive next-bucket forecasts: the mean historical dropoff count per ZIP,
//! labeled with the bucket after the latest one in the alerts table.

use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::queries::reports::ForecastHorizon;
use cbi_storage::sql::Statement;
use rusqlite::Connection;

use super::step::drop_table;
use super::{ReportBuilder, Step, StepPlan};

#[derive(Debug, Default)]
pub struct TripForecastsBuilder;

const DEPENDENCIES: [Table; 1] = [Table::DriverAlerts];
const OUTPUTS: [Table; 3] = [Table::DailyTrips, Table::WeeklyTrips, Table::MonthlyTrips];

/// `date()` modifier that advances a bucket label by one bucket.
const fn step_modifier(horizon: ForecastHorizon) -> &'static str {
    match horizon {
        ForecastHorizon::Daily => "'+1 day'",
        ForecastHorizon::Weekly => "'+7 days'",
        ForecastHorizon::Monthly => "'+1 month'",
    }
}

const fn step_names(horizon: ForecastHorizon) -> (&'static str, &'static str) {
    match horizon {
        ForecastHorizon::Daily => ("drop_daily", "forecast_daily"),
        ForecastHorizon::Weekly => ("drop_weekly", "forecast_weekly"),
        ForecastHorizon::Monthly => ("drop_monthly", "forecast_monthly"),
    }
}

impl TripForecastsBuilder {
    pub fn forecast_statement(horizon: ForecastHorizon) -> Statement {
        let bucket = horizon.bucket_column();
        Statement::new("CREATE TABLE ")
            .table(horizon.table())
            .kw(" AS WITH counts AS (SELECT dropoff_zip_code, ")
            .kw(bucket)
            .kw(" AS bucket, COUNT(*) AS trips FROM ")
            .table(Table::DriverAlerts)
            .kw(" GROUP BY dropoff_zip_code, ")
            .kw(bucket)
            .kw("), next_bucket AS (SELECT date(MAX(")
            .kw(bucket)
            .kw("), ")
            .kw(step_modifier(horizon))
            .kw(") AS bucket FROM ")
            .table(Table::DriverAlerts)
            .kw(") SELECT c.dropoff_zip_code AS zip_code, n.bucket AS ")
            .kw(bucket)
            .kw(", AVG(c.trips) AS trips FROM counts AS c CROSS JOIN next_bucket AS n")
            .kw(" GROUP BY c.dropoff_zip_code, n.bucket")
    }
}

impl ReportBuilder for TripForecastsBuilder {
    fn name(&self) -> &'static str {
        "trip_forecasts"
    }

    fn dependencies(&self) -> &[Table] {
        &DEPENDENCIES
    }

    fn outputs(&self) -> &[Table] {
        &OUTPUTS
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        let plan = ForecastHorizon::ALL
            .into_iter()
            .fold(StepPlan::new(), |plan, horizon| {
                let (drop_name, create_name) = step_names(horizon);
                plan.sql(drop_name, drop_table(horizon.table()))
                    .sql(create_name, Self::forecast_statement(horizon))
                    .sort_table(horizon.table(), "zip_code")
            });
        Ok(plan.into_steps())
    }
}
