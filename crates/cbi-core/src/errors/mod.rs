//! Error handling for the report pipeline.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod crosswalk_error;
pub mod error_code;
pub mod gate_error;
pub mod pipeline_error;
pub mod plan_error;
pub mod report_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use crosswalk_error::CrosswalkError;
pub use error_code::CbiErrorCode;
pub use gate_error::GateError;
pub use pipeline_error::{PipelineError, PipelineResult};
pub use plan_error::PlanError;
pub use report_error::ReportError;
pub use storage_error::StorageError;
