//! Output writers for profile data.
//!
//! This module handles writing data to disk in various formats:
//! - JSON snapshots (the persisted profile format)
//! - Collapsed stacks for flamegraph tools

pub mod collapsed;
pub mod json;

// Re-export main functions
pub use collapsed::{to_collapsed, write_collapsed};
pub use json::{read_snapshot, snapshot_from_str, snapshot_to_string, validate_path, write_snapshot};
