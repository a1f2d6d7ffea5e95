//! ZIP code backfill strategies for report tables keyed by community area
//! or location.

mod crosswalk_backfill;
mod geocode;
mod google;

pub use crosswalk_backfill::CrosswalkBackfill;
pub use geocode::{GeocodingBackfill, ReverseGeocoder};
pub use google::GoogleGeocoder;

use cbi_core::errors::ReportError;
use cbi_core::Table;
use rusqlite::Connection;

use crate::builders::StepContext;

/// Outcome of a backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    /// Rows that received a ZIP code.
    pub resolved: usize,
    /// Rows left with an empty ZIP code.
    pub skipped: usize,
}

/// Fills the `zip_code` column of `table`.
///
/// Runs inside the builder's transaction. Every strategy first clears the
/// column to `''` so stale codes never survive a rebuild.
pub trait ZipBackfill: Send + Sync {
    fn name(&self) -> &'static str;

    fn backfill(
        &self,
        ctx: &StepContext<'_>,
        conn: &Connection,
        table: Table,
    ) -> Result<BackfillStats, ReportError>;
}
