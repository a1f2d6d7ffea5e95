//! Connection pragmas.
//!
//! The writer runs in WAL mode so the collectors and `status` can read while
//! a builder holds its transaction. Report tables are dropped and recreated
//! every cycle, so the writer also uses incremental auto_vacuum.

use std::time::Duration;

use cbi_core::errors::StorageError;
use rusqlite::Connection;

/// Busy timeout shared by the writer and the readers.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const WRITER_PRAGMAS: &[(&str, &str)] = &[
    ("journal_mode", "WAL"),
    ("synchronous", "NORMAL"),
    ("cache_size", "-64000"),
    ("temp_store", "MEMORY"),
];

const READER_PRAGMAS: &[(&str, &str)] = &[
    ("query_only", "ON"),
    ("cache_size", "-16000"),
    ("temp_store", "MEMORY"),
];

const AUTO_VACUUM_INCREMENTAL: i64 = 2;

fn set_all(conn: &Connection, pragmas: &[(&str, &str)]) -> Result<(), StorageError> {
    for &(name, value) in pragmas {
        conn.execute_batch(&format!("PRAGMA {name} = {value};"))
            .map_err(|e| StorageError::SqliteError {
                message: format!("PRAGMA {name} = {value}: {e}"),
            })?;
    }
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| StorageError::SqliteError {
            message: format!("busy_timeout: {e}"),
        })
}

/// Writer pragmas, plus a one-time switch to incremental auto_vacuum.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    set_all(conn, WRITER_PRAGMAS)?;

    // The mode of an existing file only changes after a VACUUM.
    let auto_vacuum: i64 = conn
        .pragma_query_value(None, "auto_vacuum", |row| row.get(0))
        .unwrap_or(0);
    if auto_vacuum != AUTO_VACUUM_INCREMENTAL {
        tracing::debug!(auto_vacuum, "switching database to incremental auto_vacuum");
        conn.execute_batch("PRAGMA auto_vacuum = INCREMENTAL; VACUUM;")
            .map_err(|e| StorageError::SqliteError {
                message: format!("failed to enable incremental auto_vacuum: {e}"),
            })?;
    }
    Ok(())
}

/// Pragmas for pooled read connections.
pub fn apply_read_pragmas(conn: &Connection) -> Result<(), StorageError> {
    set_all(conn, READER_PRAGMAS)
}

/// True when the connection is in WAL mode. In-memory databases report
/// `memory` and return false.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StorageError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
