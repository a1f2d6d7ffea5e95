//! Query modules.
//!
//! `catalog` inspects any table, `sources` writes the collector tables with
//! their conflict policies, `reports` reads the derived report tables.

pub mod catalog;
pub mod reports;
pub mod sources;

use cbi_core::errors::StorageError;

pub(crate) fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}
