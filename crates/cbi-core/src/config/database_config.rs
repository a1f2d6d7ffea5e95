//! Database configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DATABASE_PATH, DEFAULT_READ_POOL_SIZE};

/// Where the SQLite database lives and how many readers to open.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path. Default: `chicago_bi.db`.
    pub path: Option<PathBuf>,
    /// Read-only connections in the pool. Default: 4.
    pub read_pool_size: Option<usize>,
}

impl DatabaseConfig {
    pub fn effective_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
    }

    pub fn effective_read_pool_size(&self) -> usize {
        self.read_pool_size.unwrap_or(DEFAULT_READ_POOL_SIZE)
    }
}
