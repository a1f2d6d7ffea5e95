//! Weekly pickup and dropoff counts per ZIP, joined to the COVID category
//! of the same ZIP and week.

use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::capabilities;
use cbi_storage::sql::Statement;
use rusqlite::Connection;

use super::step::{add_column, copy_table, drop_table};
use super::{ReportBuilder, Step, StepPlan};

#[derive(Debug, Default)]
pub struct ResidentAlertsBuilder;

const DEPENDENCIES: [Table; 2] = [Table::DriverAlerts, Table::CovidCategories];
const OUTPUTS: [Table; 3] = [
    Table::WeeklyPickups,
    Table::WeeklyDropoffs,
    Table::ResidentAlerts,
];

impl ReportBuilder for ResidentAlertsBuilder {
    fn name(&self) -> &'static str {
        "resident_alerts"
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
        let report = Table::ResidentAlerts;
        Ok(StepPlan::new()
            .sql("drop_weekly_pickups", drop_table(Table::WeeklyPickups))
            .sql(
                "count_weekly_pickups",
                Statement::new("CREATE TABLE ")
                    .table(Table::WeeklyPickups)
                    .kw(" AS SELECT week_start, pickup_zip_code, COUNT(*) AS weekly_pickups FROM ")
                    .table(Table::DriverAlerts)
                    .kw(" GROUP BY week_start, pickup_zip_code"),
            )
            .sql("drop_weekly_dropoffs", drop_table(Table::WeeklyDropoffs))
            .sql(
                "count_weekly_dropoffs",
                Statement::new("CREATE TABLE ")
                    .table(Table::WeeklyDropoffs)
                    .kw(" AS SELECT week_start, dropoff_zip_code, COUNT(*) AS weekly_dropoffs FROM ")
                    .table(Table::DriverAlerts)
                    .kw(" GROUP BY week_start, dropoff_zip_code"),
            )
            .sql("drop_target", drop_table(report))
            .sql("copy_categories", copy_table(report, Table::CovidCategories))
            .sql(
                "add_weekly_dropoffs",
                add_column(report, "weekly_dropoffs INTEGER DEFAULT 0"),
            )
            .sql(
                "join_weekly_dropoffs",
                Statement::new("UPDATE ")
                    .table(report)
                    .kw(" AS r SET weekly_dropoffs = wd.weekly_dropoffs FROM ")
                    .table(Table::WeeklyDropoffs)
                    .kw(" AS wd WHERE r.zip_code = wd.dropoff_zip_code AND r.week_start = wd.week_start"),
            )
            .sql(
                "add_weekly_pickups",
                add_column(report, "weekly_pickups INTEGER DEFAULT 0"),
            )
            .sql(
                "join_weekly_pickups",
                Statement::new("UPDATE ")
                    .table(report)
                    .kw(" AS r SET weekly_pickups = wp.weekly_pickups FROM ")
                    .table(Table::WeeklyPickups)
                    .kw(" AS wp WHERE r.zip_code = wp.pickup_zip_code AND r.week_start = wp.week_start"),
            )
            .into_steps())
    }
}
