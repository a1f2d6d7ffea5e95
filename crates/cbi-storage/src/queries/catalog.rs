//! Schema and content inspection.

use cbi_core::errors::StorageError;
use cbi_core::Table;
use rusqlite::types::Value;
use rusqlite::{params, Connection};

use super::sqlite_err;
use crate::sql::{Ident, Statement};

/// True when a table with this exact name exists.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, StorageError> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        params![name],
        |row| row.get(0),
    )
    .map_err(sqlite_err)
}

pub fn row_count(conn: &Connection, table: Table) -> Result<i64, StorageError> {
    let sql = Statement::new("SELECT COUNT(*) FROM ").table(table);
    conn.query_row(sql.as_str(), [], |row| row.get(0))
        .map_err(sqlite_err)
}

/// Column names in declaration order. Empty when the table does not exist.
pub fn column_names(conn: &Connection, name: &str) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![name], |row| row.get(0))
        .map_err(sqlite_err)?;
    rows.collect::<Result<Vec<String>, _>>().map_err(sqlite_err)
}

/// Full contents of a table, for comparing rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub columns: Vec<String>,
    /// Rows in storage order.
    pub rows: Vec<Vec<Value>>,
}

impl TableSnapshot {
    /// Rows sorted by their debug rendering, for order-insensitive comparison.
    pub fn sorted_rows(&self) -> Vec<Vec<Value>> {
        let mut rows = self.rows.clone();
        rows.sort_by_cached_key(|r| format!("{r:?}"));
        rows
    }
}

/// Read every row of `name`. `None` when the table does not exist.
pub fn table_snapshot(conn: &Connection, name: &str) -> Result<Option<TableSnapshot>, StorageError> {
    if !table_exists(conn, name)? {
        return Ok(None);
    }
    let columns = column_names(conn, name)?;
    let sql = Statement::new("SELECT * FROM ")
        .ident(&Ident::new(name))
        .kw(" ORDER BY rowid");
    let mut stmt = conn.prepare(sql.as_str()).map_err(sqlite_err)?;
    let width = columns.len();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;
    Ok(Some(TableSnapshot { columns, rows }))
}
