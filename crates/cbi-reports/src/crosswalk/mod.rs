//! Geography crosswalks: static lookups between community areas, ZIP codes
//! and census tracts, read from two-column CSV files.

mod loader;
mod project_root;

pub use loader::{ensure_crosswalks_present, Crosswalk, CrosswalkKind};
pub use project_root::ProjectRoot;
