//! Reference-data (geography crosswalk) errors. All of these are fatal
//! configuration errors.

use super::error_code::{self, CbiErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum CrosswalkError {
    #[error("could not locate the project root containing '{marker}' (searched upward from {start})")]
    ProjectRootNotFound { marker: String, start: String },

    #[error("crosswalk file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to read crosswalk {path}: {message}")]
    Io { path: String, message: String },

    #[error("crosswalk {path} contained no data rows")]
    Empty { path: String },

    #[error("invalid row {row} in {path}: {message}")]
    MalformedRow {
        path: String,
        row: usize,
        message: String,
    },

    #[error("invalid area code {value:?} at row {row} in {path}")]
    InvalidAreaCode {
        path: String,
        row: usize,
        value: String,
    },

    #[error("required geography crosswalk files missing or empty: {}. Regenerate them with the geography map builder", .files.join(", "))]
    MissingFiles { files: Vec<String> },
}

impl CbiErrorCode for CrosswalkError {
    fn error_code(&self) -> &'static str {
        error_code::REFERENCE_DATA_ERROR
    }
}
