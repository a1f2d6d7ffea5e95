//! ZIP codes from the community-area crosswalk.

use cbi_core::errors::{CrosswalkError, ReportError};
use cbi_core::Table;
use cbi_storage::sql::{Literal, Statement};
use rusqlite::Connection;

use super::{BackfillStats, ZipBackfill};
use crate::builders::StepContext;
use crate::crosswalk::{Crosswalk, CrosswalkKind};

/// One bulk `UPDATE .. FROM` joining the table's `community_area` to the
/// crosswalk.
#[derive(Debug, Clone)]
pub struct CrosswalkBackfill {
    mapping: Crosswalk,
}

impl CrosswalkBackfill {
    /// The crosswalk must map community areas to ZIP codes and hold at least
    /// one entry.
    pub fn new(mapping: Crosswalk) -> Result<Self, CrosswalkError> {
        if mapping.kind() != CrosswalkKind::CommunityAreaToZip {
            return Err(CrosswalkError::MalformedRow {
                path: CrosswalkKind::CommunityAreaToZip.file_name().to_string(),
                row: 0,
                message: format!("expected a community area crosswalk, got {:?}", mapping.kind()),
            });
        }
        if mapping.is_empty() {
            return Err(CrosswalkError::Empty {
                path: CrosswalkKind::CommunityAreaToZip.file_name().to_string(),
            });
        }
        Ok(Self { mapping })
    }

    pub fn clear_statement(table: Table) -> Statement {
        Statement::new("UPDATE ").table(table).kw(" SET zip_code = ''")
    }

    pub fn update_statement(&self, table: Table) -> Statement {
        let rows = self
            .mapping
            .iter()
            .map(|(area, zip)| [Literal::text(area), Literal::text(zip)]);
        Statement::new("WITH mapping (community_area, zip_code) AS (VALUES ")
            .values(rows)
            .kw(") UPDATE ")
            .table(table)
            .kw(" AS target SET zip_code = mapping.zip_code FROM mapping")
            .kw(" WHERE target.community_area = mapping.community_area")
    }
}

impl ZipBackfill for CrosswalkBackfill {
    fn name(&self) -> &'static str {
        "crosswalk"
    }

    fn backfill(
        &self,
        ctx: &StepContext<'_>,
        conn: &Connection,
        table: Table,
    ) -> Result<BackfillStats, ReportError> {
        let total = ctx.execute(conn, &Self::clear_statement(table))?;
        let resolved = ctx.execute(conn, &self.update_statement(table))?;
        Ok(BackfillStats {
            resolved,
            skipped: total.saturating_sub(resolved),
        })
    }
}
