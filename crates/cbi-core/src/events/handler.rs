//! ReportEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for observing pipeline progress.
///
/// Handlers only override the events they care about. `Send + Sync` so a
/// handler can be shared with the orchestrator thread.
pub trait ReportEventHandler: Send + Sync {
    fn on_cycle_started(&self, _event: &CycleStartedEvent) {}
    fn on_builder_started(&self, _event: &BuilderStartedEvent) {}
    fn on_builder_completed(&self, _event: &BuilderCompletedEvent) {}
    fn on_builder_failed(&self, _event: &BuilderFailedEvent) {}
    fn on_cycle_completed(&self, _event: &CycleCompletedEvent) {}
}
