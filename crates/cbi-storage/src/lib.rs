//! cbi-storage: SQLite persistence for the Chicago BI report pipeline.
//!
//! Write-serialized, read-pooled connections in WAL mode, the collector
//! source schema, the identifier sanitizer every builder statement goes
//! through, the readiness gate, and typed read queries.

pub mod capabilities;
pub mod connection;
pub mod migrations;
pub mod queries;
pub mod readiness;
pub mod sql;

pub use connection::DatabaseManager;
pub use readiness::{check_table_ready, ReadinessGate};
pub use sql::{quote_identifier, Ident, Literal, Statement};
