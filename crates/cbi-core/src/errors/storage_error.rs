//! Storage-layer errors for SQLite operations.

use super::error_code::{self, CbiErrorCode};

/// Errors raised by the connection manager, migrations and queries.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Database busy")]
    DbBusy,

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Required database capability `{capability}` is unavailable: {hint}")]
    CapabilityMissing { capability: String, hint: String },
}

impl StorageError {
    /// Wrap a rusqlite-style error message.
    pub fn sqlite(message: impl Into<String>) -> Self {
        Self::SqliteError {
            message: message.into(),
        }
    }
}

impl CbiErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::DbBusy => error_code::DB_BUSY,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::CapabilityMissing { .. } => error_code::CAPABILITY_MISSING,
        }
    }
}
