//! Disadvantaged community areas and the building permits eligible for a
//! waived fee.
//!
//! A community area is disadvantaged when it is among the five highest by
//! poverty rate or by unemployment rate. Permits inherit the flags of their
//! community area, and the combined flag is published as `waived_fee`.

use std::path::PathBuf;
use std::sync::Arc;

use cbi_core::constants::TOP_N_COMMUNITY_AREAS;
use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::capabilities;
use cbi_storage::sql::{Literal, Statement};
use rusqlite::Connection;

use super::registry::PermitZipSource;
use super::step::{add_column, copy_table, drop_table};
use super::{BackfillStep, ReportBuilder, Step, StepPlan};
use crate::crosswalk::{Crosswalk, CrosswalkKind};
use crate::zip::{CrosswalkBackfill, ZipBackfill};

pub struct DisadvantagedBuilder {
    crosswalk_path: PathBuf,
    permit_zips: PermitZipSource,
}

const DEPENDENCIES: [Table; 2] = [Table::PublicHealth, Table::BuildingPermits];
const OUTPUTS: [Table; 2] = [Table::Disadvantaged, Table::DisadvantagedPermits];

impl DisadvantagedBuilder {
    pub fn new(crosswalk_path: impl Into<PathBuf>, permit_zips: PermitZipSource) -> Self {
        Self {
            crosswalk_path: crosswalk_path.into(),
            permit_zips,
        }
    }

    fn flag_top(column: &'static str, metric: &'static str) -> Statement {
        let limit = Literal::Integer(i64::from(TOP_N_COMMUNITY_AREAS));
        Statement::new("UPDATE ")
            .table(Table::Disadvantaged)
            .kw(" SET ")
            .kw(column)
            .kw(" = TRUE WHERE community_area IN (SELECT community_area FROM ")
            .table(Table::Disadvantaged)
            .kw(" ORDER BY ")
            .kw(metric)
            .kw(" DESC LIMIT ")
            .literal(&limit)
            .kw(")")
    }

    fn load_crosswalk(&self) -> Result<CrosswalkBackfill, ReportError> {
        let mapping = Crosswalk::load(&self.crosswalk_path, CrosswalkKind::CommunityAreaToZip)?;
        Ok(CrosswalkBackfill::new(mapping)?)
    }
}

impl std::fmt::Debug for DisadvantagedBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisadvantagedBuilder")
            .field("crosswalk_path", &self.crosswalk_path)
            .field("permit_zips", &self.permit_zips.name())
            .finish()
    }
}

impl ReportBuilder for DisadvantagedBuilder {
    fn name(&self) -> &'static str {
        "disadvantaged"
    }

    fn dependencies(&self) -> &[Table] {
        &DEPENDENCIES
    }

    fn outputs(&self) -> &[Table] {
        &OUTPUTS
    }

    fn preflight(&self, conn: &Connection) -> Result<(), ReportError> {
        capabilities::ensure_update_from(conn)?;
        capabilities::ensure_json_points(conn)?;
        Ok(())
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        let crosswalk = Arc::new(self.load_crosswalk()?);
        let permit_strategy: Arc<dyn ZipBackfill> = match &self.permit_zips {
            PermitZipSource::Crosswalk => crosswalk.clone(),
            PermitZipSource::Geocoding(strategy) => Arc::clone(strategy),
        };

        let permits = Table::DisadvantagedPermits;
        let areas = Table::Disadvantaged;
        Ok(StepPlan::new()
            .sql("drop_permits", drop_table(permits))
            .sql("copy_permits", copy_table(permits, Table::BuildingPermits))
            .sql("add_point", add_column(permits, "point TEXT"))
            .sql("add_permit_zip", add_column(permits, "zip_code TEXT DEFAULT ''"))
            .sql(
                "set_point",
                Statement::new("UPDATE ").table(permits).kw(
                    " SET point = json_object('type', 'Point', 'coordinates', \
                     json_array(longitude, latitude)) \
                     WHERE latitude IS NOT NULL AND longitude IS NOT NULL",
                ),
            )
            .sql(
                "add_permit_poverty_flag",
                add_column(permits, "top_5_poverty BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "add_permit_unemployment_flag",
                add_column(permits, "top_5_unemployment BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "add_permit_disadvantaged_flag",
                add_column(permits, "disadvantaged BOOLEAN DEFAULT FALSE"),
            )
            .sql("drop_areas", drop_table(areas))
            .sql("copy_public_health", copy_table(areas, Table::PublicHealth))
            .sql("add_area_zip", add_column(areas, "zip_code TEXT DEFAULT ''"))
            .sql(
                "add_poverty_flag",
                add_column(areas, "top_5_poverty BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "add_unemployment_flag",
                add_column(areas, "top_5_unemployment BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "add_disadvantaged_flag",
                add_column(areas, "disadvantaged BOOLEAN DEFAULT FALSE"),
            )
            .sql(
                "flag_top_poverty",
                Self::flag_top("top_5_poverty", "below_poverty_level"),
            )
            .sql(
                "flag_top_unemployment",
                Self::flag_top("top_5_unemployment", "unemployment"),
            )
            .sql(
                "flag_disadvantaged",
                Statement::new("UPDATE ")
                    .table(areas)
                    .kw(" SET disadvantaged = (top_5_poverty OR top_5_unemployment)"),
            )
            .sql(
                "copy_flags_to_permits",
                Statement::new("UPDATE ")
                    .table(permits)
                    .kw(" AS p SET top_5_poverty = d.top_5_poverty,")
                    .kw(" top_5_unemployment = d.top_5_unemployment,")
                    .kw(" disadvantaged = d.disadvantaged FROM ")
                    .table(areas)
                    .kw(" AS d WHERE p.community_area = d.community_area"),
            )
            .sql(
                "rename_waived_fee",
                Statement::new("ALTER TABLE ")
                    .table(permits)
                    .kw(" RENAME COLUMN disadvantaged TO waived_fee"),
            )
            .step(BackfillStep::new("backfill_area_zip", areas, crosswalk))
            .step(BackfillStep::new(
                "backfill_permit_zip",
                permits,
                permit_strategy,
            ))
            .into_steps())
    }
}
