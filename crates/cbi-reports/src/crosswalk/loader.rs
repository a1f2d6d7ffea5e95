//! Crosswalk CSV parsing.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cbi_core::constants::{
    CENSUS_TRACT_TO_ZIP_FILE, COMMUNITY_AREA_TO_ZIP_FILE, ZIP_TO_COMMUNITY_AREA_FILE,
};
use cbi_core::errors::CrosswalkError;

use super::ProjectRoot;

/// The three reference files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrosswalkKind {
    CommunityAreaToZip,
    ZipToCommunityArea,
    CensusTractToZip,
}

impl CrosswalkKind {
    pub const ALL: [CrosswalkKind; 3] = [
        Self::CensusTractToZip,
        Self::ZipToCommunityArea,
        Self::CommunityAreaToZip,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::CommunityAreaToZip => COMMUNITY_AREA_TO_ZIP_FILE,
            Self::ZipToCommunityArea => ZIP_TO_COMMUNITY_AREA_FILE,
            Self::CensusTractToZip => CENSUS_TRACT_TO_ZIP_FILE,
        }
    }

    /// First-column header name, used to recognise the header row.
    pub const fn header(self) -> &'static str {
        match self {
            Self::CommunityAreaToZip => "community_area",
            Self::ZipToCommunityArea => "zip_code",
            Self::CensusTractToZip => "census_tract",
        }
    }
}

/// A loaded crosswalk, keyed by the first column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crosswalk {
    kind: CrosswalkKind,
    entries: BTreeMap<String, String>,
}

impl Crosswalk {
    pub fn load(path: &Path, kind: CrosswalkKind) -> Result<Self, CrosswalkError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CrosswalkError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => CrosswalkError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })?;
        let crosswalk = Self::parse(&content, &path.display().to_string(), kind)?;
        tracing::debug!(
            path = %path.display(),
            entries = crosswalk.len(),
            "loaded crosswalk"
        );
        Ok(crosswalk)
    }

    /// Parse CSV text. `source` names the input in errors.
    ///
    /// Rows are 1-based. Later rows overwrite earlier rows with the same key.
    pub fn parse(content: &str, source: &str, kind: CrosswalkKind) -> Result<Self, CrosswalkError> {
        let mut entries = BTreeMap::new();
        let mut header_seen = false;

        for (idx, line) in content.lines().enumerate() {
            let row = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut cells = line.split(',').map(str::trim);
            let first = cells.next().unwrap_or_default();
            let second = cells.next();

            if !header_seen && entries.is_empty() && first.eq_ignore_ascii_case(kind.header()) {
                header_seen = true;
                continue;
            }

            let Some(second) = second else {
                return Err(CrosswalkError::MalformedRow {
                    path: source.to_string(),
                    row,
                    message: format!("expected {} and a second column", kind.header()),
                });
            };
            // Tracts whose ZIP the generator could not resolve keep an empty
            // value; the tract file is only presence-checked.
            let blank_allowed = kind == CrosswalkKind::CensusTractToZip;
            if first.is_empty() || (second.is_empty() && !blank_allowed) {
                return Err(CrosswalkError::MalformedRow {
                    path: source.to_string(),
                    row,
                    message: "empty cell".to_string(),
                });
            }

            let (key, value) = match kind {
                CrosswalkKind::CommunityAreaToZip => {
                    (normalize_area(first, source, row)?, second.to_string())
                }
                CrosswalkKind::ZipToCommunityArea => {
                    (first.to_string(), normalize_area(second, source, row)?)
                }
                CrosswalkKind::CensusTractToZip => {
                    if !first.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(CrosswalkError::InvalidAreaCode {
                            path: source.to_string(),
                            row,
                            value: first.to_string(),
                        });
                    }
                    (first.to_string(), second.to_string())
                }
            };
            entries.insert(key, value);
        }

        if entries.is_empty() {
            return Err(CrosswalkError::Empty {
                path: source.to_string(),
            });
        }

        Ok(Self { kind, entries })
    }

    pub fn kind(&self) -> CrosswalkKind {
        self.kind
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `"05"` and `"5"` name the same community area.
fn normalize_area(raw: &str, source: &str, row: usize) -> Result<String, CrosswalkError> {
    raw.parse::<u32>()
        .map(|n| n.to_string())
        .map_err(|_| CrosswalkError::InvalidAreaCode {
            path: source.to_string(),
            row,
            value: raw.to_string(),
        })
}

/// Start-up check that every crosswalk file exists and is non-empty.
pub fn ensure_crosswalks_present(root: &ProjectRoot) -> Result<(), CrosswalkError> {
    let missing: Vec<String> = CrosswalkKind::ALL
        .iter()
        .map(|&kind| root.crosswalk_path(kind))
        .filter(|path| !is_non_empty_file(path))
        .map(|path: PathBuf| root.display_path(&path))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CrosswalkError::MissingFiles { files: missing })
    }
}

fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).map_or(false, |m| m.is_file() && m.len() > 0)
}
