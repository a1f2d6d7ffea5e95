//! Disadvantaged community areas and the waived-fee permit report.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cbi_core::errors::{CrosswalkError, ReportError};
use cbi_core::Table;
use cbi_reports::builders::{execute_builder, DisadvantagedBuilder, PermitZipSource};
use cbi_reports::zip::{GeocodingBackfill, ReverseGeocoder};
use cbi_storage::migrations::run_migrations;
use cbi_storage::queries::catalog::{column_names, table_exists};
use cbi_storage::queries::reports::{disadvantaged_rows, permit_report_rows};
use cbi_storage::queries::sources::{
    insert_building_permit, upsert_public_health, BuildingPermitRecord, PublicHealthRecord,
};
use rusqlite::Connection;
use tempfile::TempDir;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

fn write_crosswalk(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("community_area_to_zip_code.csv");
    fs::write(&path, "community_area,zip_code\n1,60601\n5,60615\n06,60619\n").unwrap();
    path
}

/// Areas 1-5 lead on poverty, 6, 7, 5, 4 and 3 lead on unemployment, area 8
/// is on neither list.
fn seed_public_health(conn: &Connection) {
    let areas = [
        ("1", 40.0, 5.0),
        ("2", 35.0, 6.0),
        ("3", 30.0, 7.0),
        ("4", 25.0, 8.0),
        ("5", 20.0, 9.0),
        ("6", 10.0, 30.0),
        ("7", 5.0, 25.0),
        ("8", 1.0, 1.0),
    ];
    for (area, poverty, unemployment) in areas {
        upsert_public_health(
            conn,
            &PublicHealthRecord {
                community_area: area.into(),
                below_poverty_level: Some(poverty),
                unemployment: Some(unemployment),
                per_capita_income: None,
            },
        )
        .unwrap();
    }
}

fn permit(id: &str, area: &str, location: Option<(f64, f64)>) -> BuildingPermitRecord {
    BuildingPermitRecord {
        id: id.into(),
        permit_id: Some(format!("P-{id}")),
        community_area: Some(area.into()),
        latitude: location.map(|(lat, _)| lat),
        longitude: location.map(|(_, lon)| lon),
        ..Default::default()
    }
}

fn seed_permits(conn: &Connection) {
    for p in [
        permit("p1", "5", Some((41.8, -87.6))),
        permit("p2", "8", None),
        permit("p3", "6", Some((41.9, -87.7))),
    ] {
        insert_building_permit(conn, &p).unwrap();
    }
}

fn builder(dir: &TempDir) -> DisadvantagedBuilder {
    DisadvantagedBuilder::new(write_crosswalk(dir), PermitZipSource::Crosswalk)
}

#[test]
fn disadvantaged_is_the_union_of_both_top_five_lists() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_public_health(&conn);
    seed_permits(&conn);

    let summary = execute_builder(&conn, &builder(&dir)).unwrap();
    assert_eq!(summary.rows(Table::Disadvantaged), Some(8));
    assert_eq!(summary.rows(Table::DisadvantagedPermits), Some(3));

    let rows = disadvantaged_rows(&conn).unwrap();
    assert_eq!(rows.iter().filter(|r| r.top_5_poverty).count(), 5);
    assert_eq!(rows.iter().filter(|r| r.top_5_unemployment).count(), 5);
    for row in &rows {
        assert_eq!(
            row.disadvantaged,
            row.top_5_poverty || row.top_5_unemployment,
            "area {}",
            row.community_area
        );
    }
    let flagged: Vec<&str> = rows
        .iter()
        .filter(|r| r.disadvantaged)
        .map(|r| r.community_area.as_str())
        .collect();
    assert_eq!(flagged, ["1", "2", "3", "4", "5", "6", "7"]);
}

#[test]
fn area_zip_codes_come_from_the_crosswalk() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_public_health(&conn);
    seed_permits(&conn);
    execute_builder(&conn, &builder(&dir)).unwrap();

    let rows = disadvantaged_rows(&conn).unwrap();
    let zip_of = |area: &str| {
        rows.iter()
            .find(|r| r.community_area == area)
            .map(|r| r.zip_code.clone())
            .unwrap()
    };
    assert_eq!(zip_of("5"), "60615");
    assert_eq!(zip_of("6"), "60619");
    assert_eq!(zip_of("8"), "");
}

#[test]
fn permits_inherit_flags_and_publish_waived_fee() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_public_health(&conn);
    seed_permits(&conn);
    execute_builder(&conn, &builder(&dir)).unwrap();

    let columns = column_names(&conn, Table::DisadvantagedPermits.as_str()).unwrap();
    assert!(columns.iter().any(|c| c == "waived_fee"));
    assert!(!columns.iter().any(|c| c == "disadvantaged"));

    let permits = permit_report_rows(&conn).unwrap();
    let p1 = &permits[0];
    assert!(p1.waived_fee);
    assert!(p1.top_5_poverty && p1.top_5_unemployment);
    assert_eq!(p1.zip_code, "60615");
    assert_eq!(
        p1.point.as_deref(),
        Some(r#"{"type":"Point","coordinates":[-87.6,41.8]}"#)
    );

    let p2 = &permits[1];
    assert!(!p2.waived_fee);
    assert_eq!(p2.point, None);
    assert_eq!(p2.zip_code, "");

    let p3 = &permits[2];
    assert!(p3.waived_fee);
    assert!(!p3.top_5_poverty && p3.top_5_unemployment);
}

#[test]
fn empty_public_health_names_the_missing_dependency() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_permits(&conn);

    match execute_builder(&conn, &builder(&dir)).unwrap_err() {
        ReportError::DependencyNotReady { builder, table, .. } => {
            assert_eq!(builder, "disadvantaged");
            assert_eq!(table, "public_health");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!table_exists(&conn, Table::Disadvantaged.as_str()).unwrap());
}

#[test]
fn missing_crosswalk_fails_before_any_table_is_touched() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_public_health(&conn);
    seed_permits(&conn);

    let missing =
        DisadvantagedBuilder::new(dir.path().join("absent.csv"), PermitZipSource::Crosswalk);
    let err = execute_builder(&conn, &missing).unwrap_err();
    assert!(matches!(
        err,
        ReportError::Crosswalk(CrosswalkError::FileNotFound { .. })
    ));
    assert!(!table_exists(&conn, Table::Disadvantaged.as_str()).unwrap());
    assert!(!table_exists(&conn, Table::DisadvantagedPermits.as_str()).unwrap());
}

/// Resolves only locations north of 41.85; fails everywhere else.
struct NorthSideGeocoder {
    calls: Arc<AtomicUsize>,
}

impl ReverseGeocoder for NorthSideGeocoder {
    fn postal_code(&self, latitude: f64, _longitude: f64) -> Result<Option<String>, ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if latitude > 41.85 {
            Ok(Some("60647".to_string()))
        } else {
            Err(ReportError::Geocoding {
                message: "ZERO_RESULTS".to_string(),
            })
        }
    }
}

#[test]
fn geocoding_skips_failed_lookups_and_keeps_going() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_public_health(&conn);
    seed_permits(&conn);

    let calls = Arc::new(AtomicUsize::new(0));
    let geocoder = Arc::new(GeocodingBackfill::new(NorthSideGeocoder {
        calls: calls.clone(),
    }));
    let builder = DisadvantagedBuilder::new(
        write_crosswalk(&dir),
        PermitZipSource::Geocoding(geocoder),
    );
    execute_builder(&conn, &builder).unwrap();
    // p2 has no location and is never looked up.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let permits = permit_report_rows(&conn).unwrap();
    assert_eq!(permits[0].zip_code, "");
    assert_eq!(permits[1].zip_code, "");
    assert_eq!(permits[2].zip_code, "60647");

    // The crosswalk still fills the area table.
    let areas = disadvantaged_rows(&conn).unwrap();
    assert!(areas.iter().any(|r| r.zip_code == "60615"));
}

#[test]
fn rebuilding_replaces_previous_flags() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_public_health(&conn);
    seed_permits(&conn);
    execute_builder(&conn, &builder(&dir)).unwrap();

    // Area 8 becomes the poorest; area 5 drops off the poverty list.
    upsert_public_health(
        &conn,
        &PublicHealthRecord {
            community_area: "8".into(),
            below_poverty_level: Some(90.0),
            unemployment: Some(1.0),
            per_capita_income: None,
        },
    )
    .unwrap();
    execute_builder(&conn, &builder(&dir)).unwrap();

    let rows = disadvantaged_rows(&conn).unwrap();
    let five = rows.iter().find(|r| r.community_area == "5").unwrap();
    let eight = rows.iter().find(|r| r.community_area == "8").unwrap();
    assert!(!five.top_5_poverty);
    assert!(five.top_5_unemployment);
    assert!(eight.top_5_poverty && eight.disadvantaged);
}
