//! cbi-core: shared foundation for the Chicago BI report pipeline.
//!
//! - `tables`: the typed registry of source and report table names
//! - `errors`: one error enum per subsystem, `thiserror` only
//! - `config`: TOML configuration with layered resolution
//! - `events`: report lifecycle events with no-op default handlers
//! - `tracing`: subscriber setup and span field names
//! - `traits`: cooperative cancellation

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tables;
pub mod tracing;
pub mod traits;

pub use tables::{Table, REPORT_TABLES, SOURCE_TABLES};
