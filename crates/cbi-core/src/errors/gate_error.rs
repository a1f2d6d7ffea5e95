//! Readiness gate errors.

use super::error_code::{self, CbiErrorCode};
use super::StorageError;

/// Why a table is not ready, or why waiting stopped.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("required table \"{table}\" does not exist")]
    TableMissing { table: String },

    #[error("required table \"{table}\" has no data to report on")]
    TableEmpty { table: String },

    #[error("cancelled while waiting for tables{}", .last_reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Cancelled { last_reason: Option<String> },

    #[error("failed to verify table readiness: {0}")]
    Storage(#[from] StorageError),
}

impl GateError {
    /// The table this error is about, when it concerns a single table.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::TableMissing { table } | Self::TableEmpty { table } => Some(table),
            _ => None,
        }
    }
}

impl CbiErrorCode for GateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TableMissing { .. } | Self::TableEmpty { .. } => {
                error_code::DEPENDENCY_NOT_READY
            }
            Self::Cancelled { .. } => error_code::CANCELLED,
            Self::Storage(e) => e.error_code(),
        }
    }
}
