//! Read-only connection pool.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

use cbi_core::constants::MAX_READ_POOL_SIZE;
use cbi_core::errors::StorageError;
use rusqlite::{Connection, OpenFlags};

use super::pragmas::apply_read_pragmas;

/// Read connections handed out idle-first, falling back to round-robin.
///
/// Report reads and `status` never write, so the connections are opened
/// read-only and with `query_only` set.
pub struct ReadPool {
    slots: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

fn open_error(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: format!("failed to open read connection: {e}"),
    }
}

impl ReadPool {
    fn build(
        pool_size: usize,
        mut open: impl FnMut() -> Result<Connection, StorageError>,
    ) -> Result<Self, StorageError> {
        let slots = (0..pool_size.clamp(1, MAX_READ_POOL_SIZE))
            .map(|_| open().map(Mutex::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Open `pool_size` read-only connections (clamped to 1..=8).
    pub fn open(path: &Path, pool_size: usize) -> Result<Self, StorageError> {
        Self::build(pool_size, || {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(open_error)?;
            apply_read_pragmas(&conn)?;
            Ok(conn)
        })
    }

    /// Independent in-memory connections; each sees its own empty database.
    pub fn open_in_memory(pool_size: usize) -> Result<Self, StorageError> {
        Self::build(pool_size, || Connection::open_in_memory().map_err(open_error))
    }

    /// Run `f` on an idle connection, or wait for the next one in turn.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<StorageError>,
    {
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let n = self.slots.len();
        for offset in 0..n {
            match self.slots[(start + offset) % n].try_lock() {
                Ok(guard) => return f(&guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(poisoned().into()),
            }
        }
        let guard = self.slots[start % n].lock().map_err(|_| poisoned())?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }
}

fn poisoned() -> StorageError {
    StorageError::SqliteError {
        message: "read pool lock poisoned".to_string(),
    }
}
