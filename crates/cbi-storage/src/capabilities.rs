//! Engine capability checks run before builders that need them.

use cbi_core::errors::StorageError;
use rusqlite::Connection;

/// Oldest SQLite release with `UPDATE .. FROM`.
pub const MIN_UPDATE_FROM_VERSION: (u32, u32, u32) = (3, 33, 0);

/// The engine's `sqlite_version()`.
pub fn sqlite_version(conn: &Connection) -> Result<String, StorageError> {
    conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })
}

fn parse_version(raw: &str) -> Option<(u32, u32, u32)> {
    let mut parts = raw.trim().split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next()??;
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

/// Require `UPDATE .. FROM` (crosswalk backfill, flag copies, category joins).
pub fn ensure_update_from(conn: &Connection) -> Result<(), StorageError> {
    let version = sqlite_version(conn)?;
    match parse_version(&version) {
        Some(v) if v >= MIN_UPDATE_FROM_VERSION => Ok(()),
        _ => Err(StorageError::CapabilityMissing {
            capability: "UPDATE FROM".to_string(),
            hint: format!(
                "SQLite {version} is too old; 3.33.0 or newer is required to build the report tables"
            ),
        }),
    }
}

/// Require the JSON1 functions used to store permit locations as GeoJSON points.
pub fn ensure_json_points(conn: &Connection) -> Result<(), StorageError> {
    let json1: Result<i64, _> = conn.query_row(
        "SELECT json_valid(json_object('type', 'Point', 'coordinates', json_array(0.0, 0.0)))",
        [],
        |row| row.get(0),
    );
    match json1 {
        Ok(1) => Ok(()),
        Ok(_) => Err(StorageError::CapabilityMissing {
            capability: "JSON1".to_string(),
            hint: "json_object produced invalid JSON".to_string(),
        }),
        Err(e) => Err(StorageError::CapabilityMissing {
            capability: "JSON1".to_string(),
            hint: format!(
                "SQLite was built without the JSON1 functions ({e}); rebuild with JSON support to store permit points"
            ),
        }),
    }
}
