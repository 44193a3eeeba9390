//! Delta reporting between two runs.
//!
//! This module compares two profile snapshots or two benchmark result sets
//! (old vs new) and produces per-key and aggregate deltas with threshold
//! violation detection. It never mutates its inputs.
//!
//! # Example
//! ```ignore
//! use heapdelta::diff::{check_thresholds, generate_diff, MetricTable, ThresholdConfig};
//! use heapdelta::output::read_snapshot;
//!
//! let old = MetricTable::from(&read_snapshot("before.json")?);
//! let new = MetricTable::from(&read_snapshot("after.json")?);
//! let mut diff = generate_diff(&old, &new)?;
//!
//! let thresholds = ThresholdConfig::with_max_increase_percent(5.0);
//! let violations = check_thresholds(&mut diff, &thresholds);
//! ```

mod engine;
mod normalizer;
mod output;
mod schema;
mod table;
mod threshold;

// Public API exports
pub use engine::{diff_benchmarks, diff_snapshots, generate_diff, DIFF_VERSION};
pub use normalizer::{compare_values, percent_change};
pub use output::{render_section, render_terminal_diff};
pub use schema::{
    Change, DeltaRow, DeltaSection, DiffReport, DiffStatus, DiffSummary, InputMetadata, Severity,
    ThresholdViolation,
};
pub use table::{MetricTable, TableKind, BENCHMARK_DIMENSIONS};
pub use threshold::{
    check_thresholds, load_thresholds, parse_thresholds, KeyThresholds, ThresholdConfig,
};

// Error type
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Cannot compare inputs with different schemas: old={old}, new={new}")]
    KeyMismatch { old: String, new: String },

    #[error("Invalid threshold configuration: {0}")]
    InvalidThresholds(String),

    #[error("Threshold TOML parse error: {0}")]
    ThresholdParseFailed(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
