//! Builder steps.

use std::fmt::Display;
use std::sync::Arc;

use cbi_core::errors::ReportError;
use cbi_core::Table;
use cbi_storage::sql::{Ident, Statement};
use rusqlite::Connection;

use crate::zip::ZipBackfill;

/// Where a statement runs, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub builder: &'a str,
    pub step: &'a str,
}

impl StepContext<'_> {
    /// Execute one statement, returning the number of rows it changed.
    pub fn execute(&self, conn: &Connection, statement: &Statement) -> Result<usize, ReportError> {
        tracing::trace!(builder = self.builder, step = self.step, sql = %statement, "executing");
        conn.execute(statement.as_str(), [])
            .map_err(|e| self.failed(statement, e))
    }

    /// A `StatementFailed` carrying the literal statement text.
    pub fn failed(&self, statement: &Statement, err: impl Display) -> ReportError {
        tracing::error!(
            builder = self.builder,
            step = self.step,
            statement = %statement,
            error = %err,
            "statement failed"
        );
        ReportError::StatementFailed {
            builder: self.builder.to_string(),
            step: self.step.to_string(),
            statement: statement.to_string(),
            message: err.to_string(),
        }
    }
}

/// One unit of a builder run.
pub trait Step {
    fn name(&self) -> &str;

    /// Returns the number of rows touched.
    fn apply(&self, ctx: &StepContext<'_>, conn: &Connection) -> Result<usize, ReportError>;
}

/// A single SQL statement.
#[derive(Debug, Clone)]
pub struct SqlStep {
    name: &'static str,
    statement: Statement,
}

impl SqlStep {
    pub fn new(name: &'static str, statement: Statement) -> Self {
        Self { name, statement }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }
}

impl Step for SqlStep {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, ctx: &StepContext<'_>, conn: &Connection) -> Result<usize, ReportError> {
        ctx.execute(conn, &self.statement)
    }
}

/// Fills a table's `zip_code` column with a backfill strategy.
pub struct BackfillStep {
    name: &'static str,
    table: Table,
    strategy: Arc<dyn ZipBackfill>,
}

impl BackfillStep {
    pub fn new(name: &'static str, table: Table, strategy: Arc<dyn ZipBackfill>) -> Self {
        Self {
            name,
            table,
            strategy,
        }
    }
}

impl Step for BackfillStep {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, ctx: &StepContext<'_>, conn: &Connection) -> Result<usize, ReportError> {
        let stats = self.strategy.backfill(ctx, conn, self.table)?;
        tracing::info!(
            builder = ctx.builder,
            table = %self.table,
            strategy = self.strategy.name(),
            resolved = stats.resolved,
            skipped = stats.skipped,
            "zip codes backfilled"
        );
        Ok(stats.resolved)
    }
}

/// Ordered step list with helpers for the statements every builder repeats.
#[derive(Default)]
pub struct StepPlan {
    steps: Vec<Box<dyn Step>>,
}

impl StepPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql(mut self, name: &'static str, statement: Statement) -> Self {
        self.steps.push(Box::new(SqlStep::new(name, statement)));
        self
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Recreate `table` with its rows ordered by `order_by`.
    ///
    /// Tables created by `CREATE TABLE .. AS SELECT` store rows in insertion
    /// order, which is what downstream readers see without an ORDER BY.
    pub fn sort_table(self, table: Table, order_by: &'static str) -> Self {
        let scratch = Ident::sorted_scratch(table);
        self.sql(
            "drop_sorted_scratch",
            Statement::new("DROP TABLE IF EXISTS ").ident(&scratch),
        )
        .sql(
            "create_sorted_copy",
            Statement::new("CREATE TABLE ")
                .ident(&scratch)
                .kw(" AS SELECT * FROM ")
                .table(table)
                .kw(" ORDER BY ")
                .kw(order_by),
        )
        .sql("drop_unsorted", Statement::new("DROP TABLE ").table(table))
        .sql(
            "rename_sorted_copy",
            Statement::new("ALTER TABLE ")
                .ident(&scratch)
                .kw(" RENAME TO ")
                .table(table),
        )
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<Box<dyn Step>> {
        self.steps
    }
}

pub(crate) fn drop_table(table: Table) -> Statement {
    Statement::new("DROP TABLE IF EXISTS ").table(table)
}

pub(crate) fn copy_table(target: Table, source: Table) -> Statement {
    Statement::new("CREATE TABLE ")
        .table(target)
        .kw(" AS SELECT * FROM ")
        .table(source)
}

pub(crate) fn add_column(table: Table, definition: &'static str) -> Statement {
    Statement::new("ALTER TABLE ")
        .table(table)
        .kw(" ADD COLUMN ")
        .kw(definition)
}
