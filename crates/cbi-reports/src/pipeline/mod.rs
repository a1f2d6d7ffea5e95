//! Pipeline: plan resolution, the per-cycle runner and the orchestrator.

mod plan;
mod runner;
mod scheduler;

pub use plan::{ExecutionPlan, PlannedBuilder};
pub use runner::{run_all_reports, run_cycle, BuilderOutcome, CycleReport, CycleSummary};
pub use scheduler::{Orchestrator, Schedule, TriggerHandle};
