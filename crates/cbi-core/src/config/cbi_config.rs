//! Top-level pipeline configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DataConfig, DatabaseConfig, GeocodingConfig, ScheduleConfig};
use crate::constants::{
    MAX_INTERVAL_HOURS, MAX_POLL_INTERVAL_SECONDS, MAX_READ_POOL_SIZE, MAX_STARTUP_DELAY_MINUTES,
    PROJECT_CONFIG_FILE,
};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`CBI_*`, plus the legacy unprefixed names)
/// 3. Project config (`chicago_bi.toml` in the root)
/// 4. User config (`~/.chicago-bi/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CbiConfig {
    pub database: DatabaseConfig,
    pub schedule: ScheduleConfig,
    pub geocoding: GeocodingConfig,
    pub data: DataConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub run_once: Option<bool>,
    pub use_geocoding: Option<bool>,
}

impl CbiConfig {
    /// Load configuration with layered resolution rooted at `root`.
    ///
    /// An explicit `--config` file replaces the project config layer and must
    /// exist.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config (or the explicit file)
        match cli_overrides.and_then(|c| c.config_file.as_deref()) {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Self::merge_toml_file(&mut config, explicit)?;
            }
            None => {
                let project_config_path = root.join(PROJECT_CONFIG_FILE);
                if project_config_path.exists() {
                    Self::merge_toml_file(&mut config, &project_config_path)?;
                }
            }
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &CbiConfig) -> Result<(), ConfigError> {
        if let Some(size) = config.database.read_pool_size {
            if size == 0 || size > MAX_READ_POOL_SIZE {
                return Err(ConfigError::ValidationFailed {
                    field: "database.read_pool_size".to_string(),
                    message: format!("must be between 1 and {MAX_READ_POOL_SIZE}"),
                });
            }
        }
        check_range(
            "schedule.interval_hours",
            config.schedule.interval_hours,
            1,
            MAX_INTERVAL_HOURS,
        )?;
        check_range(
            "schedule.startup_delay_minutes",
            config.schedule.startup_delay_minutes,
            0,
            MAX_STARTUP_DELAY_MINUTES,
        )?;
        check_range(
            "schedule.poll_interval_seconds",
            config.schedule.poll_interval_seconds,
            1,
            MAX_POLL_INTERVAL_SECONDS,
        )?;
        if config.geocoding.effective_use_geocoding()
            && config
                .geocoding
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            return Err(ConfigError::ValidationFailed {
                field: "geocoding.api_key".to_string(),
                message: "required when use_geocoding is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.chicago-bi/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".chicago-bi").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut CbiConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: CbiConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut CbiConfig, other: &CbiConfig) {
        // Database
        if other.database.path.is_some() {
            base.database.path = other.database.path.clone();
        }
        if other.database.read_pool_size.is_some() {
            base.database.read_pool_size = other.database.read_pool_size;
        }

        // Schedule
        if other.schedule.run_once.is_some() {
            base.schedule.run_once = other.schedule.run_once;
        }
        if other.schedule.interval_hours.is_some() {
            base.schedule.interval_hours = other.schedule.interval_hours;
        }
        if other.schedule.startup_delay_minutes.is_some() {
            base.schedule.startup_delay_minutes = other.schedule.startup_delay_minutes;
        }
        if other.schedule.poll_interval_seconds.is_some() {
            base.schedule.poll_interval_seconds = other.schedule.poll_interval_seconds;
        }

        // Geocoding
        if other.geocoding.use_geocoding.is_some() {
            base.geocoding.use_geocoding = other.geocoding.use_geocoding;
        }
        if other.geocoding.api_key.is_some() {
            base.geocoding.api_key = other.geocoding.api_key.clone();
        }

        // Data
        if other.data.data_dir.is_some() {
            base.data.data_dir = other.data.data_dir.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `CBI_SCHEDULE_...`; the unprefixed names are accepted for
    /// deployments that predate the prefix, with the prefixed name winning.
    fn apply_env_overrides(config: &mut CbiConfig) {
        if let Some(val) = env_first(&["CBI_DATABASE_PATH", "DATABASE_URL"]) {
            if let Some(path) = database_path_from_env(&val) {
                config.database.path = Some(path);
            } else {
                tracing::warn!(value = %val, "ignoring database setting that is not a file path");
            }
        }
        if let Some(val) = env_first(&["CBI_RUN_ONCE", "RUN_ONCE"]) {
            if let Some(v) = parse_bool(&val) {
                config.schedule.run_once = Some(v);
            }
        }
        if let Some(val) = env_first(&["CBI_INTERVAL_HOURS"]) {
            if let Ok(v) = val.trim().parse::<u64>() {
                config.schedule.interval_hours = Some(v);
            }
        }
        if let Some(val) = env_first(&["CBI_STARTUP_DELAY_MINUTES", "STARTUP_DELAY_MINUTES"]) {
            match val.trim().parse::<i64>() {
                Ok(v) if v >= 0 => config.schedule.startup_delay_minutes = Some(v as u64),
                Ok(v) => {
                    tracing::warn!(minutes = v, "startup delay is negative; using default");
                }
                Err(_) => {
                    tracing::warn!(value = %val, "invalid startup delay; using default");
                }
            }
        }
        if let Some(val) = env_first(&["CBI_POLL_INTERVAL_SECONDS"]) {
            if let Ok(v) = val.trim().parse::<u64>() {
                config.schedule.poll_interval_seconds = Some(v);
            }
        }
        if let Some(val) = env_first(&["CBI_USE_GEOCODING", "USE_GEOCODING"]) {
            if let Some(v) = parse_bool(&val) {
                config.geocoding.use_geocoding = Some(v);
            }
        }
        if let Some(val) = env_first(&["CBI_API_KEY", "API_KEY"]) {
            config.geocoding.api_key = Some(val);
        }
        if let Some(val) = env_first(&["CBI_DATA_DIR"]) {
            config.data.data_dir = Some(PathBuf::from(val));
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut CbiConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.database_path {
            config.database.path = Some(v.clone());
        }
        if let Some(ref v) = cli.data_dir {
            config.data.data_dir = Some(v.clone());
        }
        if let Some(v) = cli.run_once {
            config.schedule.run_once = Some(v);
        }
        if let Some(v) = cli.use_geocoding {
            config.geocoding.use_geocoding = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn check_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<(), ConfigError> {
    match value {
        Some(v) if v < min || v > max => Err(ConfigError::ValidationFailed {
            field: field.to_string(),
            message: format!("must be between {min} and {max}, got {v}"),
        }),
        _ => Ok(()),
    }
}

/// First non-empty value among the given environment variables.
fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}

/// Accepts `true`/`false` in any case.
fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// `DATABASE_URL` may hold a server connection string in older deployments;
/// only plain paths and `sqlite://` / `file:` URLs name a database file.
fn database_path_from_env(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("sqlite://") {
        return Some(PathBuf::from(rest));
    }
    if let Some(rest) = raw.strip_prefix("file:") {
        return Some(PathBuf::from(rest));
    }
    if raw.contains("://") || raw.contains('=') {
        return None;
    }
    Some(PathBuf::from(raw))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
