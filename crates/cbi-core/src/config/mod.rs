//! Configuration system for the report pipeline.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod cbi_config;
pub mod data_config;
pub mod database_config;
pub mod geocoding_config;
pub mod schedule_config;

pub use cbi_config::{CbiConfig, CliOverrides};
pub use data_config::DataConfig;
pub use database_config::DatabaseConfig;
pub use geocoding_config::GeocodingConfig;
pub use schedule_config::ScheduleConfig;
