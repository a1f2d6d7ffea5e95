//! Tests for the report event system.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cbi_core::events::types::*;
use cbi_core::events::{EventDispatcher, ReportEventHandler};

#[derive(Default)]
struct CountingHandler {
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl ReportEventHandler for CountingHandler {
    fn on_builder_started(&self, _event: &BuilderStartedEvent) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn on_builder_completed(&self, _event: &BuilderCompletedEvent) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_builder_failed(&self, _event: &BuilderFailedEvent) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

struct PanickingHandler;

impl ReportEventHandler for PanickingHandler {
    fn on_builder_started(&self, _event: &BuilderStartedEvent) {
        panic!("handler bug");
    }
}

fn started(name: &str) -> BuilderStartedEvent {
    BuilderStartedEvent {
        builder: name.to_string(),
        outputs: vec!["covid_rep_cats".to_string()],
    }
}

#[test]
fn empty_dispatcher_is_a_no_op() {
    let dispatcher = EventDispatcher::new();
    assert_eq!(dispatcher.handler_count(), 0);
    dispatcher.emit_builder_started(&started("covid_categories"));
}

#[test]
fn events_reach_every_handler() {
    let a = Arc::new(CountingHandler::default());
    let b = Arc::new(CountingHandler::default());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(a.clone());
    dispatcher.register(b.clone());

    dispatcher.emit_builder_started(&started("covid_categories"));
    dispatcher.emit_builder_completed(&BuilderCompletedEvent {
        builder: "covid_categories".to_string(),
        steps: 4,
        duration_ms: 3,
    });
    dispatcher.emit_builder_failed(&BuilderFailedEvent {
        builder: "disadvantaged".to_string(),
        error_code: "DEPENDENCY_NOT_READY".to_string(),
        message: "public_health".to_string(),
    });

    for h in [&a, &b] {
        assert_eq!(h.started.load(Ordering::Relaxed), 1);
        assert_eq!(h.completed.load(Ordering::Relaxed), 1);
        assert_eq!(h.failed.load(Ordering::Relaxed), 1);
    }
}

#[test]
fn panicking_handler_does_not_block_later_handlers() {
    let counter = Arc::new(CountingHandler::default());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(PanickingHandler));
    dispatcher.register(counter.clone());

    dispatcher.emit_builder_started(&started("driver_alerts"));
    assert_eq!(counter.started.load(Ordering::Relaxed), 1);
}
