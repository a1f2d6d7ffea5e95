//! Locating the data directory.

use std::path::{Path, PathBuf};

use cbi_core::errors::CrosswalkError;

use super::CrosswalkKind;

/// The directory tree that holds the reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    root: PathBuf,
    data_dir: PathBuf,
}

impl ProjectRoot {
    /// Walk up from `start` until a directory containing `data_dir` is found.
    ///
    /// An absolute `data_dir` is used as-is, with `start` as the root.
    pub fn discover(start: &Path, data_dir: &Path) -> Result<Self, CrosswalkError> {
        if data_dir.is_absolute() {
            if data_dir.is_dir() {
                return Ok(Self {
                    root: start.to_path_buf(),
                    data_dir: data_dir.to_path_buf(),
                });
            }
            return Err(CrosswalkError::ProjectRootNotFound {
                marker: data_dir.display().to_string(),
                start: start.display().to_string(),
            });
        }

        for dir in start.ancestors() {
            let candidate = dir.join(data_dir);
            if candidate.is_dir() {
                tracing::debug!(root = %dir.display(), "located project root");
                return Ok(Self {
                    root: dir.to_path_buf(),
                    data_dir: candidate,
                });
            }
        }

        Err(CrosswalkError::ProjectRootNotFound {
            marker: data_dir.display().to_string(),
            start: start.display().to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of a crosswalk file.
    pub fn crosswalk_path(&self, kind: CrosswalkKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    /// Path shown in messages: relative to the root when possible.
    pub(crate) fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
