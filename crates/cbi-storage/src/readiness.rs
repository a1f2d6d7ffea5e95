//! Readiness gate: source tables must exist and hold at least one row.

use std::time::{Duration, Instant};

use cbi_core::constants::{FALLBACK_POLL_INTERVAL_SECONDS, READINESS_STATUS_LOG_SECONDS};
use cbi_core::errors::{GateError, StorageError};
use cbi_core::traits::{Cancellable, CancellationToken};
use cbi_core::Table;
use rusqlite::Connection;

use crate::queries::catalog;
use crate::sql::Statement;

/// Check a single table. Missing and empty are both "not ready".
///
/// `DatabaseManager::open` creates every source table, so on a managed
/// database a source table is only ever empty. Missing is what a builder
/// sees when another builder's output has never been created, and what a
/// raw connection sees before the collectors have run.
pub fn check_table_ready(conn: &Connection, table: Table) -> Result<(), GateError> {
    if !catalog::table_exists(conn, table.as_str())? {
        return Err(GateError::TableMissing {
            table: table.as_str().to_string(),
        });
    }

    let sql = Statement::new("SELECT EXISTS (SELECT 1 FROM ")
        .table(table)
        .kw(")");
    let has_rows: bool = conn
        .query_row(sql.as_str(), [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: format!("failed to count rows in {table}: {e}"),
        })?;
    if !has_rows {
        return Err(GateError::TableEmpty {
            table: table.as_str().to_string(),
        });
    }
    Ok(())
}

/// Blocks until every table in a set is ready.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    tables: Vec<Table>,
    poll_interval: Duration,
    last_reason: Option<String>,
}

impl ReadinessGate {
    /// A zero poll interval is replaced by the 5 s fallback.
    pub fn new(tables: impl IntoIterator<Item = Table>, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            Duration::from_secs(FALLBACK_POLL_INTERVAL_SECONDS)
        } else {
            poll_interval
        };
        Self {
            tables: tables.into_iter().collect(),
            poll_interval,
            last_reason: None,
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Why the most recent poll failed, if it did.
    pub fn last_reason(&self) -> Option<&str> {
        self.last_reason.as_deref()
    }

    /// Check every table once, stopping at the first one that is not ready.
    pub fn poll(&mut self, conn: &Connection) -> bool {
        for &table in &self.tables {
            if let Err(e) = check_table_ready(conn, table) {
                self.last_reason = Some(e.to_string());
                return false;
            }
        }
        self.last_reason = None;
        true
    }

    /// Poll `conn` until ready or cancelled.
    ///
    /// Cancellation is checked before every poll and interrupts the sleep
    /// between polls.
    pub fn wait(&mut self, conn: &Connection, cancel: &CancellationToken) -> Result<(), GateError> {
        self.wait_polling(cancel, |gate| Ok(gate.poll(conn)))
    }

    /// Like `wait`, but `poll_once` supplies a connection for each poll, so
    /// a shared connection is only held while a poll runs.
    pub fn wait_polling<F>(
        &mut self,
        cancel: &CancellationToken,
        mut poll_once: F,
    ) -> Result<(), GateError>
    where
        F: FnMut(&mut Self) -> Result<bool, GateError>,
    {
        if self.tables.is_empty() {
            return Ok(());
        }

        let status_every = Duration::from_secs(READINESS_STATUS_LOG_SECONDS);
        let mut last_status: Option<Instant> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled());
            }

            if poll_once(self)? {
                tracing::info!(tables = self.tables.len(), "source tables ready");
                return Ok(());
            }

            if last_status.map_or(true, |t| t.elapsed() >= status_every) {
                tracing::info!(
                    reason = self.last_reason().unwrap_or_default(),
                    "still waiting for source tables"
                );
                last_status = Some(Instant::now());
            }

            if cancel.wait_timeout(self.poll_interval) {
                return Err(self.cancelled());
            }
        }
    }

    fn cancelled(&self) -> GateError {
        GateError::Cancelled {
            last_reason: self.last_reason.clone(),
        }
    }
}
