//! One pipeline cycle.

use std::time::Instant;

use cbi_core::errors::{CbiErrorCode, PipelineResult};
use cbi_core::events::types::{
    BuilderCompletedEvent, BuilderFailedEvent, BuilderStartedEvent, CycleCompletedEvent,
    CycleStartedEvent,
};
use cbi_core::events::EventDispatcher;
use rusqlite::Connection;
use serde::Serialize;

use super::ExecutionPlan;
use crate::builders::{execute_builder, BuildSummary};

/// What happened to one builder in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BuilderOutcome {
    Built(BuildSummary),
    Failed { builder: String, error_code: String },
}

impl BuilderOutcome {
    pub fn builder(&self) -> &str {
        match self {
            Self::Built(summary) => &summary.builder,
            Self::Failed { builder, .. } => builder,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub cycle: u64,
    /// One entry per planned builder, in plan order.
    pub outcomes: Vec<BuilderOutcome>,
    pub duration_ms: u64,
}

impl CycleSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_built()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn outcome(&self, builder: &str) -> Option<&BuilderOutcome> {
        self.outcomes.iter().find(|o| o.builder() == builder)
    }
}

/// Summary plus the errors of the builders that failed.
pub type CycleReport = PipelineResult<CycleSummary>;

/// Run every planned builder once. A failing builder is recorded and the
/// cycle moves on to the next one.
pub fn run_all_reports(
    conn: &Connection,
    plan: &ExecutionPlan,
    events: &EventDispatcher,
) -> CycleReport {
    run_cycle(conn, plan, events, 1)
}

pub fn run_cycle(
    conn: &Connection,
    plan: &ExecutionPlan,
    events: &EventDispatcher,
    cycle: u64,
) -> CycleReport {
    let start = Instant::now();
    let mut report = CycleReport::new(CycleSummary {
        cycle,
        ..CycleSummary::default()
    });

    events.emit_cycle_started(&CycleStartedEvent {
        cycle,
        builder_count: plan.len(),
    });
    tracing::info!(cycle, builders = plan.len(), "report cycle started");

    for builder in plan.builders() {
        let name = builder.name();
        events.emit_builder_started(&BuilderStartedEvent {
            builder: name.to_string(),
            outputs: builder.outputs().iter().map(|t| t.to_string()).collect(),
        });

        match execute_builder(conn, builder.as_ref()) {
            Ok(summary) => {
                events.emit_builder_completed(&BuilderCompletedEvent {
                    builder: name.to_string(),
                    steps: summary.steps,
                    duration_ms: summary.duration_ms,
                });
                report.data.outcomes.push(BuilderOutcome::Built(summary));
            }
            Err(e) => {
                let code = e.error_code();
                tracing::error!(builder = name, code, error = %e, "report builder failed");
                events.emit_builder_failed(&BuilderFailedEvent {
                    builder: name.to_string(),
                    error_code: code.to_string(),
                    message: e.to_string(),
                });
                report.data.outcomes.push(BuilderOutcome::Failed {
                    builder: name.to_string(),
                    error_code: code.to_string(),
                });
                report.add_error(e.into());
            }
        }
    }

    report.data.duration_ms = start.elapsed().as_millis() as u64;
    events.emit_cycle_completed(&CycleCompletedEvent {
        cycle,
        succeeded: report.data.succeeded(),
        failed: report.data.failed(),
        duration_ms: report.data.duration_ms,
    });
    tracing::info!(
        cycle,
        succeeded = report.data.succeeded(),
        failed = report.data.failed(),
        duration_ms = report.data.duration_ms,
        "report cycle completed"
    );
    report
}
