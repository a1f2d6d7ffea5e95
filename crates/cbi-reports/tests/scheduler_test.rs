//! Orchestrator lifecycle: once mode, triggers, shutdown, failure isolation.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cbi_core::errors::ReportError;
use cbi_core::events::types::{BuilderFailedEvent, CycleCompletedEvent};
use cbi_core::events::{EventDispatcher, ReportEventHandler};
use cbi_core::Table;
use cbi_reports::builders::{
    default_builders, BuilderSettings, CovidCategoriesBuilder, ReportBuilder, Step, StepPlan,
};
use cbi_reports::pipeline::{
    run_all_reports, BuilderOutcome, ExecutionPlan, Orchestrator, Schedule,
};
use cbi_storage::queries::catalog::table_exists;
use cbi_storage::queries::sources::*;
use cbi_storage::sql::Statement;
use cbi_storage::DatabaseManager;
use rusqlite::Connection;
use tempfile::TempDir;

#[derive(Default)]
struct Counter {
    cycles: AtomicUsize,
    failures: AtomicUsize,
}

impl ReportEventHandler for Counter {
    fn on_builder_failed(&self, _event: &BuilderFailedEvent) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cycle_completed(&self, _event: &CycleCompletedEvent) {
        self.cycles.fetch_add(1, Ordering::SeqCst);
    }
}

fn write_crosswalk(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("community_area_to_zip_code.csv");
    fs::write(&path, "community_area,zip_code\n1,60601\n").unwrap();
    path
}

fn seed_sources(conn: &Connection, with_public_health: bool) {
    insert_taxi_trip(
        conn,
        &TaxiTripRecord {
            trip_id: "t1".into(),
            trip_start_timestamp: Some("2024-01-10T08:00:00".into()),
            pickup_zip_code: Some("60601".into()),
            dropoff_zip_code: Some("60666".into()),
            ..Default::default()
        },
    )
    .unwrap();
    upsert_covid(
        conn,
        &CovidRecord {
            zip_code: "60601".into(),
            week_start: "2024-01-07".into(),
            week_end: "2024-01-13".into(),
            case_rate_weekly: Some(55.0),
            percent_tested_positive_weekly: None,
        },
    )
    .unwrap();
    upsert_ccvi(
        conn,
        &CcviRecord {
            geography_type: Some("ZIP".into()),
            community_area_or_zip: "60601".into(),
            community_area_name: None,
            ccvi_score: Some(40.0),
            ccvi_category: Some("HIGH".into()),
        },
    )
    .unwrap();
    insert_building_permit(
        conn,
        &BuildingPermitRecord {
            id: "p1".into(),
            community_area: Some("1".into()),
            ..Default::default()
        },
    )
    .unwrap();
    if with_public_health {
        upsert_public_health(
            conn,
            &PublicHealthRecord {
                community_area: "1".into(),
                below_poverty_level: Some(20.0),
                unemployment: Some(10.0),
                per_capita_income: None,
            },
        )
        .unwrap();
    }
}

fn seeded_db(with_public_health: bool) -> Arc<DatabaseManager> {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.with_writer(|conn| {
        seed_sources(conn, with_public_health);
        Ok::<_, cbi_core::errors::StorageError>(())
    })
    .unwrap();
    Arc::new(db)
}

fn default_plan(dir: &TempDir) -> ExecutionPlan {
    let settings = BuilderSettings::new(write_crosswalk(dir));
    ExecutionPlan::resolve(default_builders(&settings)).unwrap()
}

fn wait_until(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

#[test]
fn once_mode_runs_a_single_cycle() {
    let dir = TempDir::new().unwrap();
    let db = seeded_db(true);
    let orchestrator = Orchestrator::new(db.clone(), default_plan(&dir), Schedule::Once)
        .with_poll_interval(Duration::from_millis(10));

    assert_eq!(orchestrator.run().unwrap(), 1);
    db.with_writer(|conn| {
        assert!(table_exists(conn, Table::DisadvantagedPermits.as_str())?);
        assert!(table_exists(conn, Table::MonthlyTrips.as_str())?);
        Ok::<_, cbi_core::errors::StorageError>(())
    })
    .unwrap();
}

#[test]
fn shutdown_interrupts_the_readiness_wait() {
    let dir = TempDir::new().unwrap();
    // Nothing seeded: the gate never opens.
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let schedule = Schedule::Every(Duration::from_secs(3600));
    let orchestrator = Orchestrator::new(db, default_plan(&dir), schedule)
        .with_poll_interval(Duration::from_secs(30));
    let handle = orchestrator.trigger_handle();

    let worker = thread::spawn(move || orchestrator.run());
    thread::sleep(Duration::from_millis(100));
    let asked = Instant::now();
    handle.shutdown();

    assert_eq!(worker.join().unwrap().unwrap(), 0);
    assert!(asked.elapsed() < Duration::from_secs(5));
    assert!(handle.is_shutdown());
}

#[test]
fn writer_stays_available_while_waiting_for_sources() {
    let dir = TempDir::new().unwrap();
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let orchestrator = Orchestrator::new(db.clone(), default_plan(&dir), Schedule::Once)
        .with_poll_interval(Duration::from_millis(20));

    let worker = thread::spawn(move || orchestrator.run());
    thread::sleep(Duration::from_millis(100));
    db.with_writer(|conn| {
        seed_sources(conn, true);
        Ok::<_, cbi_core::errors::StorageError>(())
    })
    .unwrap();

    assert_eq!(worker.join().unwrap().unwrap(), 1);
}

#[test]
fn oversized_interval_waits_for_a_trigger() {
    let dir = TempDir::new().unwrap();
    let counter = Arc::new(Counter::default());
    let mut events = EventDispatcher::new();
    events.register(counter.clone());

    let orchestrator = Orchestrator::new(
        seeded_db(true),
        default_plan(&dir),
        Schedule::Every(Duration::MAX),
    )
    .with_poll_interval(Duration::from_millis(10))
    .with_events(events);
    let handle = orchestrator.trigger_handle();

    let worker = thread::spawn(move || orchestrator.run());
    assert!(wait_until(Duration::from_secs(10), || {
        counter.cycles.load(Ordering::SeqCst) >= 1
    }));
    assert!(handle.trigger());
    assert!(wait_until(Duration::from_secs(10), || {
        counter.cycles.load(Ordering::SeqCst) >= 2
    }));

    handle.shutdown();
    assert_eq!(worker.join().unwrap().unwrap(), 2);
}

#[test]
fn shutdown_during_startup_delay_returns_immediately() {
    let dir = TempDir::new().unwrap();
    let orchestrator = Orchestrator::new(seeded_db(true), default_plan(&dir), Schedule::Once)
        .with_startup_delay(Duration::from_secs(600));
    let handle = orchestrator.trigger_handle();

    let worker = thread::spawn(move || orchestrator.run());
    thread::sleep(Duration::from_millis(50));
    handle.shutdown();
    assert_eq!(worker.join().unwrap().unwrap(), 0);
}

#[test]
fn pending_triggers_coalesce_into_one_cycle() {
    let dir = TempDir::new().unwrap();
    let counter = Arc::new(Counter::default());
    let mut events = EventDispatcher::new();
    events.register(counter.clone());

    let orchestrator = Orchestrator::new(
        seeded_db(true),
        default_plan(&dir),
        Schedule::Every(Duration::from_secs(3600)),
    )
    .with_poll_interval(Duration::from_millis(10))
    .with_events(events);
    let handle = orchestrator.trigger_handle();
    assert!(handle.trigger());
    assert!(!handle.trigger());

    let worker = thread::spawn(move || orchestrator.run());
    assert!(wait_until(Duration::from_secs(10), || {
        counter.cycles.load(Ordering::SeqCst) >= 2
    }));
    thread::sleep(Duration::from_millis(200));
    assert_eq!(counter.cycles.load(Ordering::SeqCst), 2);

    handle.shutdown();
    assert_eq!(worker.join().unwrap().unwrap(), 2);
}

#[test]
fn failing_builder_does_not_stop_its_siblings() {
    let dir = TempDir::new().unwrap();
    let counter = Arc::new(Counter::default());
    let mut events = EventDispatcher::new();
    events.register(counter.clone());

    let db = seeded_db(false);
    let report = db
        .with_writer(|conn| {
            Ok::<_, cbi_core::errors::StorageError>(run_all_reports(
                conn,
                &default_plan(&dir),
                &events,
            ))
        })
        .unwrap();

    assert_eq!(report.error_count(), 1);
    assert_eq!(report.data.succeeded(), 6);
    assert!(matches!(
        report.data.outcome("disadvantaged"),
        Some(BuilderOutcome::Failed { error_code, .. }) if error_code == "DEPENDENCY_NOT_READY"
    ));
    assert!(report.data.outcome("trip_forecasts").unwrap().is_built());
    assert_eq!(counter.failures.load(Ordering::SeqCst), 1);
    assert_eq!(counter.cycles.load(Ordering::SeqCst), 1);
}

/// Fails on its last step.
struct AlwaysFails;

const FAILS_DEPS: [Table; 1] = [Table::Covid];
const FAILS_OUTS: [Table; 1] = [Table::DailyTrips];

impl ReportBuilder for AlwaysFails {
    fn name(&self) -> &'static str {
        "always_fails"
    }

    fn dependencies(&self) -> &[Table] {
        &FAILS_DEPS
    }

    fn outputs(&self) -> &[Table] {
        &FAILS_OUTS
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        Ok(StepPlan::new()
            .sql("select_missing", Statement::new("DELETE FROM missing_table"))
            .into_steps())
    }
}

#[test]
fn statement_failures_are_collected_and_the_cycle_continues() {
    let db = seeded_db(true);
    let plan = ExecutionPlan::resolve(vec![
        Box::new(AlwaysFails) as Box<dyn ReportBuilder>,
        Box::new(CovidCategoriesBuilder),
    ])
    .unwrap();

    let report = db
        .with_writer(|conn| {
            Ok::<_, cbi_core::errors::StorageError>(run_all_reports(
                conn,
                &plan,
                &EventDispatcher::new(),
            ))
        })
        .unwrap();

    assert_eq!(report.data.outcomes.len(), 2);
    assert!(!report.data.outcomes[0].is_built());
    assert!(report.data.outcomes[1].is_built());
    assert_eq!(report.error_count(), 1);
}
