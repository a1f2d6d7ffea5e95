//! Pipeline errors and non-fatal error collection.

use super::error_code::{self, CbiErrorCode};
use super::{ConfigError, CrosswalkError, GateError, PlanError, ReportError, StorageError};

/// Errors surfaced by the orchestrator.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Readiness error: {0}")]
    Gate(#[from] GateError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Reference data error: {0}")]
    Crosswalk(#[from] CrosswalkError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline cancelled")]
    Cancelled,
}

impl CbiErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Gate(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Crosswalk(e) => e.error_code(),
            Self::Plan(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

/// Result of a pipeline cycle that accumulates non-fatal errors.
/// One failing builder does not prevent the others from running.
#[derive(Debug, Default)]
pub struct PipelineResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the cycle.
    pub errors: Vec<PipelineError>,
}

impl<T: Default> PipelineResult<T> {
    /// Create a new pipeline result with no errors.
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Add a non-fatal error to the result.
    pub fn add_error(&mut self, error: PipelineError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
