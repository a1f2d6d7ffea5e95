//! Connection manager tests: pragmas, migrations, pool, transactions.

use cbi_core::errors::StorageError;
use cbi_core::SOURCE_TABLES;
use cbi_storage::connection::pragmas::verify_wal_mode;
use cbi_storage::connection::writer::with_immediate_transaction;
use cbi_storage::migrations::{current_version, LATEST_VERSION};
use cbi_storage::queries::catalog;
use cbi_storage::DatabaseManager;
use tempfile::TempDir;

#[test]
fn open_applies_wal_and_migrations() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open(&dir.path().join("cbi.db"), 2).unwrap();

    db.with_writer(|conn| {
        assert!(verify_wal_mode(conn)?);
        assert_eq!(current_version(conn)?, LATEST_VERSION);
        for table in SOURCE_TABLES {
            assert!(catalog::table_exists(conn, table.as_str())?, "{table} missing");
        }
        Ok::<_, StorageError>(())
    })
    .unwrap();
    assert_eq!(db.reader_count(), 2);
}

#[test]
fn reopening_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cbi.db");
    {
        let db = DatabaseManager::open_default(&path).unwrap();
        db.with_writer(|conn| {
            conn.execute(
                "INSERT INTO public_health (community_area, below_poverty_level) VALUES ('1', 20.5)",
                [],
            )
            .map_err(|e| StorageError::sqlite(e.to_string()))
        })
        .unwrap();
    }
    let db = DatabaseManager::open_default(&path).unwrap();
    let count = db
        .with_reader(|conn| catalog::row_count(conn, cbi_core::Table::PublicHealth))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn pool_size_is_clamped() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open(&dir.path().join("cbi.db"), 64).unwrap();
    assert_eq!(db.reader_count(), 8);
}

#[test]
fn readers_are_query_only() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open_default(&dir.path().join("cbi.db")).unwrap();
    let result = db.with_reader(|conn| {
        conn.execute("DELETE FROM covid", [])
            .map_err(|e| StorageError::sqlite(e.to_string()))
    });
    assert!(result.is_err());
}

#[test]
fn failed_transaction_rolls_back() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let result: Result<(), StorageError> = db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| {
            tx.execute_batch("CREATE TABLE scratch (x INTEGER); INSERT INTO scratch VALUES (1);")
                .map_err(|e| StorageError::sqlite(e.to_string()))?;
            Err(StorageError::sqlite("boom"))
        })
    });
    assert!(result.is_err());

    let exists = db
        .with_writer(|conn| catalog::table_exists(conn, "scratch"))
        .unwrap();
    assert!(!exists);
}

#[test]
fn committed_transaction_is_visible_to_readers() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open_default(&dir.path().join("cbi.db")).unwrap();
    db.with_writer(|conn| {
        with_immediate_transaction(conn, |tx| {
            tx.execute(
                "INSERT INTO ccvi (geography_type, community_area_or_zip, ccvi_category) VALUES ('ZIP', '60601', 'HIGH')",
                [],
            )
            .map_err(|e| StorageError::sqlite(e.to_string()))
        })
    })
    .unwrap();

    let count = db
        .with_reader(|conn| catalog::row_count(conn, cbi_core::Table::Ccvi))
        .unwrap();
    assert_eq!(count, 1);
    db.checkpoint().unwrap();
}
