//! CbiErrorCode trait: stable machine-readable codes for every error enum.

/// Every error enum implements this to expose a structured code string for
/// logs and the command-line exit path.
pub trait CbiErrorCode {
    /// Returns the error code string (e.g., "DEPENDENCY_NOT_READY").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_BUSY: &str = "DB_BUSY";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CAPABILITY_MISSING: &str = "CAPABILITY_MISSING";
pub const DEPENDENCY_NOT_READY: &str = "DEPENDENCY_NOT_READY";
pub const STATEMENT_FAILED: &str = "STATEMENT_FAILED";
pub const REFERENCE_DATA_ERROR: &str = "REFERENCE_DATA_ERROR";
pub const GEOCODING_ERROR: &str = "GEOCODING_ERROR";
pub const PLAN_ERROR: &str = "PLAN_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CANCELLED: &str = "CANCELLED";
