//! Configuration errors.

use super::error_code::{self, CbiErrorCode};

/// Loading or validating `CbiConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {path} does not exist or cannot be read")]
    FileNotFound { path: String },

    #[error("cannot parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

impl ConfigError {
    /// The offending field for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationFailed { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl CbiErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
