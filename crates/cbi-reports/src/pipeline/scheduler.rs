//! The long-running orchestrator.
//!
//! Lifecycle: startup delay, readiness gate over every source table, one
//! cycle, then wait for the next tick, a trigger or shutdown. Shutdown is
//! observed during the delay, at each gate poll and between cycles. A cycle
//! that has started always finishes its current builder transaction.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cbi_core::config::ScheduleConfig;
use cbi_core::errors::{GateError, PipelineError};
use cbi_core::events::EventDispatcher;
use cbi_core::traits::{Cancellable, CancellationToken};
use cbi_core::SOURCE_TABLES;
use cbi_storage::{DatabaseManager, ReadinessGate};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use super::runner::{run_cycle, CycleReport};
use super::ExecutionPlan;

/// How often cycles run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// One cycle, then return.
    Once,
    Every(Duration),
}

impl Schedule {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        if config.effective_run_once() {
            Self::Once
        } else {
            Self::Every(config.effective_interval())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    RunNow,
    Shutdown,
}

/// Requests an immediate cycle or shutdown from another thread.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    wake: Sender<Wake>,
    cancel: CancellationToken,
}

impl TriggerHandle {
    /// Ask for a cycle now. Returns false when one is already pending, in
    /// which case the two requests run as a single cycle.
    pub fn trigger(&self) -> bool {
        match self.wake.try_send(Wake::RunNow) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("trigger ignored, orchestrator has stopped");
                false
            }
        }
    }

    /// Stop the orchestrator at the next boundary.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        // The token is authoritative; the message only wakes a sleeping wait.
        let _ = self.wake.try_send(Wake::Shutdown);
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

pub struct Orchestrator {
    db: Arc<DatabaseManager>,
    plan: ExecutionPlan,
    events: EventDispatcher,
    schedule: Schedule,
    startup_delay: Duration,
    poll_interval: Duration,
    cancel: CancellationToken,
    wake_tx: Sender<Wake>,
    wake_rx: Receiver<Wake>,
}

impl Orchestrator {
    /// No startup delay and the gate's default poll interval until
    /// configured otherwise.
    pub fn new(db: Arc<DatabaseManager>, plan: ExecutionPlan, schedule: Schedule) -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        Self {
            db,
            plan,
            events: EventDispatcher::new(),
            schedule,
            startup_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            cancel: CancellationToken::new(),
            wake_tx,
            wake_rx,
        }
    }

    pub fn from_config(
        db: Arc<DatabaseManager>,
        plan: ExecutionPlan,
        config: &ScheduleConfig,
    ) -> Self {
        Self::new(db, plan, Schedule::from_config(config))
            .with_startup_delay(config.effective_startup_delay())
            .with_poll_interval(config.effective_poll_interval())
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle {
            wake: self.wake_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Run until shutdown, or for one cycle under `Schedule::Once`.
    ///
    /// Returns the number of completed cycles. Shutdown is a normal return.
    pub fn run(&self) -> Result<u64, PipelineError> {
        tracing::info!(
            schedule = ?self.schedule,
            startup_delay_s = self.startup_delay.as_secs(),
            builders = self.plan.len(),
            "orchestrator starting"
        );

        if !self.startup_delay.is_zero() && self.cancel.wait_timeout(self.startup_delay) {
            tracing::info!("shutdown requested during startup delay");
            return Ok(0);
        }

        let mut cycles = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            match self.wait_for_sources() {
                Ok(()) => {}
                Err(PipelineError::Gate(GateError::Cancelled { .. })) => {
                    tracing::info!("shutdown requested while waiting for source tables");
                    break;
                }
                Err(e) => return Err(e),
            }

            cycles += 1;
            let report = self.run_one(cycles)?;
            if !report.is_clean() {
                tracing::warn!(
                    cycle = cycles,
                    errors = report.error_count(),
                    "cycle finished with failed builders; they retry next cycle"
                );
            }

            match self.schedule {
                Schedule::Once => break,
                Schedule::Every(interval) => {
                    if !self.wait_for_next(interval) {
                        break;
                    }
                }
            }
        }

        tracing::info!(cycles, "orchestrator stopped");
        Ok(cycles)
    }

    fn wait_for_sources(&self) -> Result<(), PipelineError> {
        let mut gate = ReadinessGate::new(SOURCE_TABLES, self.poll_interval);
        // Taken per poll: the writer stays free while sources are missing.
        gate.wait_polling(&self.cancel, |gate| {
            self.db
                .with_writer(|conn| Ok::<_, GateError>(gate.poll(conn)))
        })
        .map_err(PipelineError::from)
    }

    fn run_one(&self, cycle: u64) -> Result<CycleReport, PipelineError> {
        let report = self.db.with_writer(|conn| {
            Ok::<_, PipelineError>(run_cycle(conn, &self.plan, &self.events, cycle))
        })?;
        if let Err(e) = self.db.checkpoint() {
            tracing::warn!(error = %e, "wal checkpoint failed");
        }
        Ok(report)
    }

    /// Sleep until the next tick or a trigger. Returns false on shutdown.
    fn wait_for_next(&self, interval: Duration) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tracing::debug!(interval_s = interval.as_secs(), "waiting for next cycle");
        // An interval too large for `Instant` waits for a trigger or shutdown.
        let Some(deadline) = Instant::now().checked_add(interval) else {
            return match self.wake_rx.recv() {
                Ok(Wake::RunNow) => !self.cancel.is_cancelled(),
                Ok(Wake::Shutdown) | Err(_) => false,
            };
        };
        match self.wake_rx.recv_deadline(deadline) {
            Ok(Wake::RunNow) => {
                if self.cancel.is_cancelled() {
                    return false;
                }
                tracing::info!("cycle triggered");
                true
            }
            Ok(Wake::Shutdown) => false,
            Err(RecvTimeoutError::Timeout) => !self.cancel.is_cancelled(),
            Err(RecvTimeoutError::Disconnected) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                !self.cancel.wait_timeout(remaining)
            }
        }
    }
}
