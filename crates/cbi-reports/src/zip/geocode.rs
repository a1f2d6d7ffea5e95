//! ZIP codes from per-row reverse geocoding.

use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::sql::Statement;
use rusqlite::{params, Connection};

use super::{BackfillStats, ZipBackfill};
use crate::builders::StepContext;

/// Resolves a coordinate to a postal code.
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` when the location has no postal code.
    fn postal_code(&self, latitude: f64, longitude: f64) -> Result<Option<String>, ReportError>;
}

/// Calls the geocoder once per located row and writes the result by `id`.
///
/// A failed lookup or update skips that row and the pass continues.
#[derive(Debug, Clone)]
pub struct GeocodingBackfill<G> {
    geocoder: G,
}

impl<G: ReverseGeocoder> GeocodingBackfill<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    fn located_rows(
        &self,
        ctx: &StepContext<'_>,
        conn: &Connection,
        table: Table,
    ) -> Result<Vec<(String, f64, f64)>, ReportError> {
        let sql = Statement::new("SELECT id, latitude, longitude FROM ")
            .table(table)
            .kw(" WHERE latitude IS NOT NULL AND longitude IS NOT NULL ORDER BY id");
        let mut stmt = conn.prepare(sql.as_str()).map_err(|e| ctx.failed(&sql, e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(|e| ctx.failed(&sql, e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| ctx.failed(&sql, e))
    }
}

impl<G: ReverseGeocoder> ZipBackfill for GeocodingBackfill<G> {
    fn name(&self) -> &'static str {
        "geocoding"
    }

    fn backfill(
        &self,
        ctx: &StepContext<'_>,
        conn: &Connection,
        table: Table,
    ) -> Result<BackfillStats, ReportError> {
        let unlocated = ctx.execute(
            conn,
            &Statement::new("UPDATE ").table(table).kw(" SET zip_code = ''"),
        )?;
        let located = self.located_rows(ctx, conn, table)?;
        let mut stats = BackfillStats {
            resolved: 0,
            skipped: unlocated.saturating_sub(located.len()),
        };

        let update = Statement::new("UPDATE ")
            .table(table)
            .kw(" SET zip_code = ?1 WHERE id = ?2");
        let mut stmt = conn
            .prepare(update.as_str())
            .map_err(|e| ctx.failed(&update, e))?;

        for (id, latitude, longitude) in located {
            let zip = match self.geocoder.postal_code(latitude, longitude) {
                Ok(Some(zip)) => zip,
                Ok(None) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "failed to reverse geocode permit");
                    stats.skipped += 1;
                    continue;
                }
            };
            match stmt.execute(params![zip, id]) {
                Ok(_) => stats.resolved += 1,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "failed to update zip code for permit");
                    stats.skipped += 1;
                }
            }
        }

        Ok(stats)
    }
}
