//! cbi-reports: derives the Chicago BI report tables from collector data.
//!
//! - `crosswalk`: static geography lookups loaded from the data directory
//! - `zip`: ZIP backfill strategies (crosswalk, reverse geocoding)
//! - `builders`: the transactional report builders
//! - `pipeline`: execution plan, per-cycle runner, orchestrator

pub mod builders;
pub mod crosswalk;
pub mod pipeline;
pub mod zip;

pub use builders::{default_builders, execute_builder, BuildSummary, BuilderSettings, ReportBuilder};
pub use pipeline::{run_all_reports, ExecutionPlan, Orchestrator, Schedule, TriggerHandle};
