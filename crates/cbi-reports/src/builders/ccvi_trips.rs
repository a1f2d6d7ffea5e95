//! Weekly trip volume touching high-vulnerability ZIPs.

use cbi_core::constants::{CCVI_HIGH_CATEGORY, CCVI_ZIP_GEOGRAPHY};
use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::sql::{Literal, Statement};
use rusqlite::Connection;

use super::step::drop_table;
use super::{ReportBuilder, Step, StepPlan};

#[derive(Debug, Default)]
pub struct CcviTripsBuilder;

const DEPENDENCIES: [Table; 2] = [Table::Ccvi, Table::DriverAlerts];
const OUTPUTS: [Table; 1] = [Table::CcviTrips];

impl CcviTripsBuilder {
    /// A trip counts once for its pickup ZIP and once for its dropoff ZIP.
    fn create_statement() -> Statement {
        Statement::new("CREATE TABLE ")
            .table(Table::CcviTrips)
            .kw(" AS WITH weekly_trips AS (")
            .kw("SELECT pickup_zip_code AS zip_code, week_start, COUNT(*) AS trips FROM ")
            .table(Table::DriverAlerts)
            .kw(" GROUP BY pickup_zip_code, week_start")
            .kw(" UNION ALL ")
            .kw("SELECT dropoff_zip_code AS zip_code, week_start, COUNT(*) AS trips FROM ")
            .table(Table::DriverAlerts)
            .kw(" GROUP BY dropoff_zip_code, week_start")
            .kw(") SELECT c.*, wt.week_start AS week_start, SUM(wt.trips) AS weekly_trips FROM ")
            .table(Table::Ccvi)
            .kw(" AS c JOIN weekly_trips AS wt ON c.community_area_or_zip = wt.zip_code")
            .kw(" WHERE c.ccvi_category = ")
            .literal(&Literal::text(CCVI_HIGH_CATEGORY))
            .kw(" AND c.geography_type = ")
            .literal(&Literal::text(CCVI_ZIP_GEOGRAPHY))
            .kw(" GROUP BY c.id, c.geography_type, c.community_area_or_zip,")
            .kw(" c.community_area_name, c.ccvi_score, c.ccvi_category, wt.week_start")
    }
}

impl ReportBuilder for CcviTripsBuilder {
    fn name(&self) -> &'static str {
        "ccvi_trips"
    }

    fn dependencies(&self) -> &[Table] {
        &DEPENDENCIES
    }

    fn outputs(&self) -> &[Table] {
        &OUTPUTS
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        Ok(StepPlan::new()
            .sql("drop_target", drop_table(Table::CcviTrips))
            .sql("aggregate_high_risk_trips", Self::create_statement())
            .sort_table(Table::CcviTrips, "community_area_or_zip, week_start")
            .into_steps())
    }
}
