//! Execution plan validation errors.

use super::error_code::{self, CbiErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("builder {builder} depends on {table}, which is neither a source table nor produced by any builder")]
    UnknownDependency { builder: String, table: String },

    #[error("table {table} is written by both {first} and {second}")]
    DuplicateWriter {
        table: String,
        first: String,
        second: String,
    },

    #[error("builder {builder} writes source table {table}")]
    WritesSourceTable { builder: String, table: String },

    #[error("dependency cycle among builders: {}", .builders.join(", "))]
    Cycle { builders: Vec<String> },
}

impl CbiErrorCode for PlanError {
    fn error_code(&self) -> &'static str {
        error_code::PLAN_ERROR
    }
}
