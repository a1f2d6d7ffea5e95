//! Event payload types.

/// Payload for `on_cycle_started`.
#[derive(Debug, Clone)]
pub struct CycleStartedEvent {
    pub cycle: u64,
    pub builder_count: usize,
}

/// Payload for `on_builder_started`.
#[derive(Debug, Clone)]
pub struct BuilderStartedEvent {
    pub builder: String,
    pub outputs: Vec<String>,
}

/// Payload for `on_builder_completed`.
#[derive(Debug, Clone)]
pub struct BuilderCompletedEvent {
    pub builder: String,
    pub steps: usize,
    pub duration_ms: u64,
}

/// Payload for `on_builder_failed`.
#[derive(Debug, Clone)]
pub struct BuilderFailedEvent {
    pub builder: String,
    pub error_code: String,
    pub message: String,
}

/// Payload for `on_cycle_completed`.
#[derive(Debug, Clone)]
pub struct CycleCompletedEvent {
    pub cycle: u64,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}
