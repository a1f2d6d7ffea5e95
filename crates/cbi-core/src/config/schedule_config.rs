//! Orchestrator cadence configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_INTERVAL_HOURS, DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_STARTUP_DELAY_MINUTES,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Run a single cycle and exit. Default: false.
    pub run_once: Option<bool>,
    /// Hours between cycles. Default: 24.
    pub interval_hours: Option<u64>,
    /// Minutes to wait before the first readiness poll. Default: 4.
    pub startup_delay_minutes: Option<u64>,
    /// Seconds between readiness polls. Default: 60.
    pub poll_interval_seconds: Option<u64>,
}

impl ScheduleConfig {
    pub fn effective_run_once(&self) -> bool {
        self.run_once.unwrap_or(false)
    }

    /// Saturates rather than overflowing; `CbiConfig::validate` rejects
    /// values above `MAX_INTERVAL_HOURS`.
    pub fn effective_interval(&self) -> Duration {
        let hours = self.interval_hours.unwrap_or(DEFAULT_INTERVAL_HOURS);
        Duration::from_secs(hours.saturating_mul(3600))
    }

    pub fn effective_startup_delay(&self) -> Duration {
        let minutes = self
            .startup_delay_minutes
            .unwrap_or(DEFAULT_STARTUP_DELAY_MINUTES);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    pub fn effective_poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_seconds
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS),
        )
    }
}
