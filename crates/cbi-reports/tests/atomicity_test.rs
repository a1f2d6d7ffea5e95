//! Builder transactions: all-or-nothing and repeatable.

use std::fs;
use std::path::PathBuf;

use cbi_core::errors::ReportError;
use cbi_core::events::EventDispatcher;
use cbi_core::{Table, REPORT_TABLES};
use cbi_reports::builders::{
    default_builders, execute_builder, BuilderSettings, CovidCategoriesBuilder, ReportBuilder,
    Step, StepPlan,
};
use cbi_reports::pipeline::{run_all_reports, ExecutionPlan};
use cbi_storage::migrations::run_migrations;
use cbi_storage::queries::catalog::{table_exists, table_snapshot, TableSnapshot};
use cbi_storage::queries::sources::*;
use cbi_storage::sql::Statement;
use rusqlite::Connection;
use tempfile::TempDir;

fn setup_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
}

fn write_crosswalk(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("community_area_to_zip_code.csv");
    fs::write(&path, "community_area,zip_code\n1,60601\n2,60602\n").unwrap();
    path
}

/// One row or more in every source table.
fn seed_sources(conn: &Connection) {
    for (id, start, pickup, dropoff) in [
        ("t1", "2024-01-10T08:00:00", "60601", "60666"),
        ("t2", "2024-01-11T09:00:00", "60666", "60602"),
        ("t3", "2024-01-17T10:00:00", "60602", "60601"),
    ] {
        insert_taxi_trip(
            conn,
            &TaxiTripRecord {
                trip_id: id.into(),
                trip_start_timestamp: Some(start.into()),
                pickup_zip_code: Some(pickup.into()),
                dropoff_zip_code: Some(dropoff.into()),
                ..Default::default()
            },
        )
        .unwrap();
    }
    for (zip, week_start, week_end, rate) in [
        ("60601", "2024-01-07", "2024-01-13", 120.0),
        ("60602", "2024-01-07", "2024-01-13", 60.0),
        ("60601", "2024-01-14", "2024-01-20", 30.0),
    ] {
        upsert_covid(
            conn,
            &CovidRecord {
                zip_code: zip.into(),
                week_start: week_start.into(),
                week_end: week_end.into(),
                case_rate_weekly: Some(rate),
                percent_tested_positive_weekly: None,
            },
        )
        .unwrap();
    }
    upsert_ccvi(
        conn,
        &CcviRecord {
            geography_type: Some("ZIP".into()),
            community_area_or_zip: "60601".into(),
            community_area_name: None,
            ccvi_score: Some(48.0),
            ccvi_category: Some("HIGH".into()),
        },
    )
    .unwrap();
    for (area, poverty, unemployment) in [("1", 30.0, 12.0), ("2", 8.0, 4.0)] {
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
    insert_building_permit(
        conn,
        &BuildingPermitRecord {
            id: "p1".into(),
            community_area: Some("1".into()),
            latitude: Some(41.88),
            longitude: Some(-87.63),
            ..Default::default()
        },
    )
    .unwrap();
}

fn snapshots(conn: &Connection) -> Vec<(Table, Option<TableSnapshot>)> {
    REPORT_TABLES
        .iter()
        .map(|&t| (t, table_snapshot(conn, t.as_str()).unwrap()))
        .collect()
}

/// Drops and recreates `covid_rep_cats`, then fails.
struct BrokenRebuild;

const BROKEN_DEPS: [Table; 1] = [Table::Covid];
const BROKEN_OUTS: [Table; 1] = [Table::CovidCategories];

impl ReportBuilder for BrokenRebuild {
    fn name(&self) -> &'static str {
        "broken_rebuild"
    }

    fn dependencies(&self) -> &[Table] {
        &BROKEN_DEPS
    }

    fn outputs(&self) -> &[Table] {
        &BROKEN_OUTS
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        Ok(StepPlan::new()
            .sql(
                "drop_target",
                Statement::new("DROP TABLE IF EXISTS ").table(Table::CovidCategories),
            )
            .sql(
                "recreate",
                Statement::new("CREATE TABLE ")
                    .table(Table::CovidCategories)
                    .kw(" AS SELECT zip_code FROM ")
                    .table(Table::Covid),
            )
            .sql(
                "bogus",
                Statement::new("UPDATE ")
                    .table(Table::CovidCategories)
                    .kw(" SET no_such_column = 1"),
            )
            .into_steps())
    }
}

#[test]
fn failed_step_leaves_the_previous_table_in_place() {
    let conn = setup_db();
    seed_sources(&conn);
    execute_builder(&conn, &CovidCategoriesBuilder).unwrap();
    let before = table_snapshot(&conn, Table::CovidCategories.as_str()).unwrap();
    assert!(before.is_some());

    match execute_builder(&conn, &BrokenRebuild).unwrap_err() {
        ReportError::StatementFailed {
            builder,
            step,
            statement,
            ..
        } => {
            assert_eq!(builder, "broken_rebuild");
            assert_eq!(step, "bogus");
            assert!(statement.contains("no_such_column"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let after = table_snapshot(&conn, Table::CovidCategories.as_str()).unwrap();
    assert_eq!(before, after);
    assert!(conn.is_autocommit());
}

#[test]
fn failed_first_build_creates_nothing() {
    let conn = setup_db();
    seed_sources(&conn);
    execute_builder(&conn, &BrokenRebuild).unwrap_err();
    assert!(!table_exists(&conn, Table::CovidCategories.as_str()).unwrap());
}

#[test]
fn rebuilding_unchanged_sources_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let conn = setup_db();
    seed_sources(&conn);
    let settings = BuilderSettings::new(write_crosswalk(&dir));
    let plan = ExecutionPlan::resolve(default_builders(&settings)).unwrap();
    let events = EventDispatcher::new();

    let first = run_all_reports(&conn, &plan, &events);
    assert!(first.is_clean(), "{:?}", first.errors);
    let after_first = snapshots(&conn);
    assert!(after_first.iter().all(|(_, s)| s.is_some()));

    let second = run_all_reports(&conn, &plan, &events);
    assert!(second.is_clean(), "{:?}", second.errors);
    assert_eq!(after_first, snapshots(&conn));

    for &table in &REPORT_TABLES {
        assert!(!table_exists(&conn, &table.sorted_scratch_name()).unwrap());
    }
}
