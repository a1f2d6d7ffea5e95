//! Report builder errors.

use super::error_code::{self, CbiErrorCode};
use super::{CrosswalkError, StorageError};

/// Errors from a single builder invocation. None of these abort sibling
/// builders in the same cycle.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{builder}: dependency \"{table}\" not ready: {reason}")]
    DependencyNotReady {
        builder: String,
        table: String,
        reason: String,
    },

    #[error("{builder}: step `{step}` failed executing statement {statement:?}: {message}")]
    StatementFailed {
        builder: String,
        step: String,
        statement: String,
        message: String,
    },

    #[error("reverse geocoding failed: {message}")]
    Geocoding { message: String },

    #[error("reference data error: {0}")]
    Crosswalk(#[from] CrosswalkError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ReportError {
    /// The builder that produced this error, when known.
    pub fn builder(&self) -> Option<&str> {
        match self {
            Self::DependencyNotReady { builder, .. } | Self::StatementFailed { builder, .. } => {
                Some(builder)
            }
            _ => None,
        }
    }
}

impl CbiErrorCode for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DependencyNotReady { .. } => error_code::DEPENDENCY_NOT_READY,
            Self::StatementFailed { .. } => error_code::STATEMENT_FAILED,
            Self::Geocoding { .. } => error_code::GEOCODING_ERROR,
            Self::Crosswalk(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
