//! Reference data location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DATA_DIR;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the crosswalk CSVs. Relative paths are resolved
    /// against the discovered project root. Default: `src/data`.
    pub data_dir: Option<PathBuf>,
}

impl DataConfig {
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }
}
