//! Readiness gate tests.

use std::thread;
use std::time::{Duration, Instant};

use cbi_core::errors::GateError;
use cbi_core::traits::{Cancellable, CancellationToken};
use cbi_core::{Table, SOURCE_TABLES};
use cbi_storage::migrations::run_migrations;
use cbi_storage::queries::sources::{upsert_public_health, PublicHealthRecord};
use cbi_storage::{check_table_ready, ReadinessGate};
use rusqlite::Connection;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

fn area(n: &str) -> PublicHealthRecord {
    PublicHealthRecord {
        community_area: n.to_string(),
        below_poverty_level: Some(10.0),
        unemployment: Some(5.0),
        per_capita_income: Some(30000.0),
    }
}

#[test]
fn missing_table_is_not_ready() {
    let conn = Connection::open_in_memory().unwrap();
    let err = check_table_ready(&conn, Table::Ccvi).unwrap_err();
    assert!(matches!(err, GateError::TableMissing { ref table } if table == "ccvi"));
}

#[test]
fn empty_table_is_not_ready() {
    let conn = setup_db();
    let err = check_table_ready(&conn, Table::PublicHealth).unwrap_err();
    assert!(matches!(err, GateError::TableEmpty { ref table } if table == "public_health"));
    assert_eq!(err.to_string(), "required table \"public_health\" has no data to report on");
}

#[test]
fn migrated_sources_are_empty_not_missing() {
    let conn = setup_db();
    for table in SOURCE_TABLES {
        let err = check_table_ready(&conn, table).unwrap_err();
        assert!(matches!(err, GateError::TableEmpty { .. }), "{table:?}: {err}");
    }
}

#[test]
fn populated_table_is_ready() {
    let conn = setup_db();
    upsert_public_health(&conn, &area("1")).unwrap();
    check_table_ready(&conn, Table::PublicHealth).unwrap();
}

#[test]
fn zero_interval_uses_fallback() {
    let gate = ReadinessGate::new([Table::Covid], Duration::ZERO);
    assert_eq!(gate.poll_interval(), Duration::from_secs(5));
}

#[test]
fn empty_table_list_returns_immediately() {
    let conn = Connection::open_in_memory().unwrap();
    let mut gate = ReadinessGate::new([], Duration::from_secs(60));
    gate.wait(&conn, &CancellationToken::new()).unwrap();
}

#[test]
fn poll_records_first_failure() {
    let conn = setup_db();
    upsert_public_health(&conn, &area("1")).unwrap();
    let mut gate = ReadinessGate::new([Table::PublicHealth, Table::Covid], Duration::from_secs(1));
    assert!(!gate.poll(&conn));
    assert!(gate.last_reason().unwrap().contains("covid"));
}

#[test]
fn wait_returns_once_tables_fill() {
    let conn = setup_db();
    upsert_public_health(&conn, &area("1")).unwrap();
    let mut gate = ReadinessGate::new([Table::PublicHealth], Duration::from_millis(10));
    gate.wait(&conn, &CancellationToken::new()).unwrap();
    assert!(gate.last_reason().is_none());
}

#[test]
fn cancellation_interrupts_wait_with_last_reason() {
    let conn = setup_db();
    let token = CancellationToken::new();
    let canceller = token.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        canceller.cancel();
    });

    let mut gate = ReadinessGate::new([Table::TaxiTrips], Duration::from_secs(30));
    let start = Instant::now();
    let err = gate.wait(&conn, &token).unwrap_err();
    handle.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    match err {
        GateError::Cancelled { last_reason } => {
            assert!(last_reason.unwrap().contains("taxi_trips"));
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

#[test]
fn already_cancelled_token_returns_before_polling() {
    let conn = setup_db();
    let token = CancellationToken::new();
    token.cancel();
    let mut gate = ReadinessGate::new([Table::TaxiTrips], Duration::from_secs(30));
    let err = gate.wait(&conn, &token).unwrap_err();
    assert!(matches!(err, GateError::Cancelled { last_reason: None }));
}
