//! Execution plan resolution.

use cbi_core::errors::{PlanError, ReportError};
use cbi_core::Table;
use cbi_reports::builders::{default_builders, BuilderSettings, ReportBuilder, Step};
use cbi_reports::pipeline::ExecutionPlan;
use rusqlite::Connection;

struct Fake {
    name: &'static str,
    deps: Vec<Table>,
    outs: Vec<Table>,
}

impl ReportBuilder for Fake {
    fn name(&self) -> &'static str {
        self.name
    }

    fn dependencies(&self) -> &[Table] {
        &self.deps
    }

    fn outputs(&self) -> &[Table] {
        &self.outs
    }

    fn steps(&self, _conn: &Connection) -> Result<Vec<Box<dyn Step>>, ReportError> {
        Ok(Vec::new())
    }
}

fn fake(name: &'static str, deps: &[Table], outs: &[Table]) -> Box<dyn ReportBuilder> {
    Box::new(Fake {
        name,
        deps: deps.to_vec(),
        outs: outs.to_vec(),
    })
}

#[test]
fn default_builders_resolve_in_dependency_order() {
    let settings = BuilderSettings::new("unused.csv");
    let plan = ExecutionPlan::resolve(default_builders(&settings)).unwrap();
    assert_eq!(
        plan.names(),
        [
            "covid_categories",
            "driver_alerts",
            "resident_alerts",
            "airport_trips",
            "ccvi_trips",
            "trip_forecasts",
            "disadvantaged",
        ]
    );

    let described = plan.describe();
    assert_eq!(described[1].dependencies, ["taxi_trips", "covid_rep_cats"]);
    assert_eq!(described[1].outputs, ["req_1a_covid_alerts_drivers"]);
}

#[test]
fn dependents_move_after_their_writer() {
    let plan = ExecutionPlan::resolve(vec![
        fake("reads_alerts", &[Table::DriverAlerts], &[Table::AirportTrips]),
        fake("writes_alerts", &[Table::TaxiTrips], &[Table::DriverAlerts]),
    ])
    .unwrap();
    assert_eq!(plan.names(), ["writes_alerts", "reads_alerts"]);
}

#[test]
fn independent_builders_keep_registration_order() {
    let plan = ExecutionPlan::resolve(vec![
        fake("b", &[Table::Covid], &[Table::CovidCategories]),
        fake("a", &[Table::Ccvi], &[Table::CcviTrips]),
    ])
    .unwrap();
    assert_eq!(plan.names(), ["b", "a"]);
}

#[test]
fn cycles_are_rejected_with_every_member() {
    let err = ExecutionPlan::resolve(vec![
        fake("ok", &[Table::Covid], &[Table::CovidCategories]),
        fake("x", &[Table::ResidentAlerts], &[Table::DriverAlerts]),
        fake("y", &[Table::DriverAlerts], &[Table::ResidentAlerts]),
    ])
    .err()
    .unwrap();
    match err {
        PlanError::Cycle { builders } => assert_eq!(builders, ["x", "y"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = ExecutionPlan::resolve(vec![fake(
        "loop",
        &[Table::AirportTrips],
        &[Table::AirportTrips],
    )])
    .err()
    .unwrap();
    assert!(matches!(err, PlanError::Cycle { .. }));
}

#[test]
fn two_writers_of_one_table_are_rejected() {
    let err = ExecutionPlan::resolve(vec![
        fake("first", &[Table::Covid], &[Table::CovidCategories]),
        fake("second", &[Table::Covid], &[Table::CovidCategories]),
    ])
    .err()
    .unwrap();
    match err {
        PlanError::DuplicateWriter {
            table,
            first,
            second,
        } => {
            assert_eq!(table, "covid_rep_cats");
            assert_eq!((first.as_str(), second.as_str()), ("first", "second"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = ExecutionPlan::resolve(vec![fake(
        "orphan",
        &[Table::WeeklyPickups],
        &[Table::ResidentAlerts],
    )])
    .err()
    .unwrap();
    assert!(matches!(
        err,
        PlanError::UnknownDependency { ref builder, ref table }
            if builder == "orphan" && table == "weekly_trips_by_pickup_and_zip"
    ));
}

#[test]
fn writing_a_source_table_is_rejected() {
    let err = ExecutionPlan::resolve(vec![fake("rogue", &[], &[Table::TaxiTrips])])
        .err()
        .unwrap();
    assert!(matches!(err, PlanError::WritesSourceTable { .. }));
}
