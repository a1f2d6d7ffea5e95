//! EventDispatcher: synchronous event dispatch.

use std::sync::Arc;

use super::handler::ReportEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn ReportEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn ReportEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler does not prevent later handlers from receiving
    /// the event.
    fn emit<F: Fn(&dyn ReportEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!("report event handler panicked");
            }
        }
    }

    pub fn emit_cycle_started(&self, event: &CycleStartedEvent) {
        self.emit(|h| h.on_cycle_started(event));
    }

    pub fn emit_builder_started(&self, event: &BuilderStartedEvent) {
        self.emit(|h| h.on_builder_started(event));
    }

    pub fn emit_builder_completed(&self, event: &BuilderCompletedEvent) {
        self.emit(|h| h.on_builder_completed(event));
    }

    pub fn emit_builder_failed(&self, event: &BuilderFailedEvent) {
        self.emit(|h| h.on_builder_failed(event));
    }

    pub fn emit_cycle_completed(&self, event: &CycleCompletedEvent) {
        self.emit(|h| h.on_cycle_completed(event));
    }
}
