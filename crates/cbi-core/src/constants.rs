//! Shared constants for the report pipeline.

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ZIP codes adjacent to O'Hare and Midway. Trips starting or ending in one of
/// these count as airport trips.
pub const AIRPORT_ZIP_CODES: [&str; 4] = ["60666", "60656", "60665", "60638"];

/// Weekly case rate at or above which a ZIP/week is `medium`.
pub const COVID_MEDIUM_THRESHOLD: f64 = 50.0;

/// Weekly case rate at or above which a ZIP/week is `high`.
pub const COVID_HIGH_THRESHOLD: f64 = 100.0;

/// Size of the poverty and unemployment cohorts.
pub const TOP_N_COMMUNITY_AREAS: u32 = 5;

/// CCVI category marking a high-risk geography.
pub const CCVI_HIGH_CATEGORY: &str = "HIGH";

/// CCVI geography type for ZIP-level rows.
pub const CCVI_ZIP_GEOGRAPHY: &str = "ZIP";

// ---- Scheduling defaults ----

/// Hours between pipeline cycles.
pub const DEFAULT_INTERVAL_HOURS: u64 = 24;

/// Minutes to wait after start-up before polling source tables.
pub const DEFAULT_STARTUP_DELAY_MINUTES: u64 = 4;

/// Longest accepted cycle interval: one leap year.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

/// Longest accepted startup delay: one day.
pub const MAX_STARTUP_DELAY_MINUTES: u64 = 24 * 60;

/// Longest accepted readiness poll interval: one hour.
pub const MAX_POLL_INTERVAL_SECONDS: u64 = 60 * 60;

/// Seconds between readiness polls while waiting for source tables.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 60;

/// Poll interval used when a caller passes a zero interval.
pub const FALLBACK_POLL_INTERVAL_SECONDS: u64 = 5;

/// Seconds between "still waiting" log lines from the readiness gate.
pub const READINESS_STATUS_LOG_SECONDS: u64 = 30;

// ---- Storage defaults ----

/// Default database file.
pub const DEFAULT_DATABASE_PATH: &str = "chicago_bi.db";

/// Default number of read-only connections.
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// Upper bound for the read pool.
pub const MAX_READ_POOL_SIZE: usize = 8;

// ---- Reference data ----

/// Data directory, relative to the project root.
pub const DEFAULT_DATA_DIR: &str = "src/data";

/// Community area to ZIP crosswalk.
pub const COMMUNITY_AREA_TO_ZIP_FILE: &str = "community_area_to_zip_code.csv";

/// ZIP to community area crosswalk.
pub const ZIP_TO_COMMUNITY_AREA_FILE: &str = "zip_code_to_community_area.csv";

/// Census tract to ZIP crosswalk.
pub const CENSUS_TRACT_TO_ZIP_FILE: &str = "census_tract_to_zip_code.csv";

/// Project config file name, looked up in the working root.
pub const PROJECT_CONFIG_FILE: &str = "chicago_bi.toml";
