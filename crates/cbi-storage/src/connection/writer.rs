//! Write transactions: BEGIN IMMEDIATE, rolled back on drop.

use cbi_core::errors::StorageError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Execute a write operation inside a BEGIN IMMEDIATE transaction.
///
/// The write lock is taken at transaction start so collectors writing to the
/// same file see `SQLITE_BUSY` up front rather than mid-rebuild. If `f`
/// returns an error the transaction is dropped without commit, which rolls
/// back every statement it ran.
pub fn with_immediate_transaction<F, T, E>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<StorageError>,
{
    // new_unchecked takes `&Connection`, which lets callers hold the writer
    // through a shared borrow.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|e| {
        if is_busy(&e) {
            StorageError::DbBusy
        } else {
            StorageError::SqliteError {
                message: format!("failed to begin immediate transaction: {e}"),
            }
        }
    })?;

    let result = f(&tx)?;

    tx.commit().map_err(|e| StorageError::SqliteError {
        message: format!("failed to commit: {e}"),
    })?;

    Ok(result)
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked
    )
}
