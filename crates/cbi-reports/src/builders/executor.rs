//! Running one builder.

use std::time::Instant;

use cbi_core::errors::{GateError, ReportError};
use cbi_core::Table;
use cbi_storage::connection::writer::with_immediate_transaction;
use cbi_storage::queries::catalog;
use cbi_storage::readiness::check_table_ready;
use rusqlite::Connection;
use serde::Serialize;

use super::{ReportBuilder, StepContext};

/// Result of a committed builder run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub builder: String,
    pub steps: usize,
    pub duration_ms: u64,
    /// Row count of every output table after commit.
    pub row_counts: Vec<(String, i64)>,
}

impl BuildSummary {
    pub fn rows(&self, table: Table) -> Option<i64> {
        self.row_counts
            .iter()
            .find(|(name, _)| name == table.as_str())
            .map(|(_, n)| *n)
    }
}

/// Check dependencies, run preflight, then apply every step in one
/// transaction.
///
/// A failure at any step rolls back the whole run, so each output table
/// keeps its previous contents.
pub fn execute_builder(
    conn: &Connection,
    builder: &dyn ReportBuilder,
) -> Result<BuildSummary, ReportError> {
    let name = builder.name();

    for &table in builder.dependencies() {
        match check_table_ready(conn, table) {
            Ok(()) => {}
            Err(GateError::Storage(e)) => return Err(ReportError::Storage(e)),
            Err(e) => {
                return Err(ReportError::DependencyNotReady {
                    builder: name.to_string(),
                    table: table.as_str().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    builder.preflight(conn)?;
    let steps = builder.steps(conn)?;

    tracing::info!(builder = name, steps = steps.len(), "building report");
    let started = Instant::now();

    let row_counts = with_immediate_transaction(conn, |tx| {
        for step in &steps {
            let ctx = StepContext {
                builder: name,
                step: step.name(),
            };
            let rows = step.apply(&ctx, tx)?;
            tracing::debug!(builder = name, step = step.name(), rows, "step applied");
        }
        builder
            .outputs()
            .iter()
            .map(|&table| Ok((table.as_str().to_string(), catalog::row_count(tx, table)?)))
            .collect::<Result<Vec<_>, ReportError>>()
    })?;

    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::info!(builder = name, duration_ms, "report refreshed");

    Ok(BuildSummary {
        builder: name.to_string(),
        steps: steps.len(),
        duration_ms,
        row_counts,
    })
}
