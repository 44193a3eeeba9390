//! Schema definitions for diff reports.
//!
//! Defines the structures that represent differences between two inputs.

use super::table::TableKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete diff report comparing an old and a new input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffReport {
    /// Schema version for the diff format
    pub diff_version: String,

    /// Timestamp when diff was generated
    pub generated_at: String,

    /// Kind of inputs compared
    pub kind: TableKind,

    /// Metadata from the old input
    pub old: InputMetadata,

    /// Metadata from the new input
    pub new: InputMetadata,

    /// One section per compared dimension
    pub sections: Vec<DeltaSection>,

    /// List of threshold violations (if any)
    pub threshold_violations: Vec<ThresholdViolation>,

    /// Summary of diff results
    pub summary: DiffSummary,
}

impl DiffReport {
    /// True when neither input had any keys
    pub fn is_empty(&self) -> bool {
        self.old.key_count == 0 && self.new.key_count == 0
    }

    pub fn section(&self, dimension: &str) -> Option<&DeltaSection> {
        self.sections.iter().find(|s| s.dimension == dimension)
    }
}

/// Metadata describing one side of the comparison
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputMetadata {
    /// Where the input came from (file path or label)
    pub source: String,

    /// Number of distinct keys
    pub key_count: usize,

    /// Sampling rate (profiles only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<u64>,

    /// When the snapshot was taken (profiles only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<String>,
}

/// Rows and aggregate for one dimension (e.g. alloc_bytes or ns/op)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaSection {
    /// Dimension name
    pub dimension: String,

    /// Per-key rows sorted by key
    pub rows: Vec<DeltaRow>,

    /// Aggregate row computed from the sums over all keys
    pub total: DeltaRow,
}

impl DeltaSection {
    pub fn row(&self, key: &str) -> Option<&DeltaRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

/// Change of one key in one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRow {
    /// Entity key (collapsed stack or benchmark name)
    pub key: String,

    /// Value in the old input; None when the key is absent there
    pub old: Option<f64>,

    /// Value in the new input; None when the key is absent there
    pub new: Option<f64>,

    /// Relative change
    pub change: Change,
}

impl DeltaRow {
    /// Old value, treating an absent key as zero
    pub fn old_value(&self) -> f64 {
        self.old.unwrap_or(0.0)
    }

    /// New value, treating an absent key as zero
    pub fn new_value(&self) -> f64 {
        self.new.unwrap_or(0.0)
    }

    /// new - old
    pub fn absolute_change(&self) -> f64 {
        self.new_value() - self.old_value()
    }
}

/// Relative change between an old and a new value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum Change {
    /// Finite percentage; 0 when both values are zero
    Percent(f64),
    /// Present in both, old value zero, new value positive
    FromZero,
    /// Key only present in the new input
    Added,
    /// Key only present in the old input
    Removed,
}

impl Change {
    /// Finite percentage, if there is one
    pub fn percent(&self) -> Option<f64> {
        match self {
            Change::Percent(p) => Some(*p),
            _ => None,
        }
    }

    /// Whether the change is an increase without a finite baseline
    pub fn is_unbounded_increase(&self) -> bool {
        matches!(self, Change::FromZero)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Change::Percent(p) if *p == 0.0)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Percent(p) => write!(f, "{:+.2}%", p),
            Change::FromZero => f.write_str("+∞%"),
            Change::Added => f.write_str("new"),
            Change::Removed => f.write_str("removed"),
        }
    }
}

/// How serious a threshold violation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single threshold violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdViolation {
    /// Name of the metric that violated threshold (e.g. "alloc_bytes.[total]")
    pub metric: String,

    /// Threshold value in percent
    pub threshold: f64,

    /// Actual change in percent; None for increases from zero and new keys
    pub actual: Option<f64>,

    pub severity: Severity,
}

/// Overall outcome of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiffStatus {
    Passed,
    Warning,
    Failed,
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffStatus::Passed => f.write_str("PASSED"),
            DiffStatus::Warning => f.write_str("WARNING"),
            DiffStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Summary of diff results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Whether there are any regressions
    pub has_regressions: bool,

    /// Number of threshold violations
    pub violation_count: usize,

    /// Overall status
    pub status: DiffStatus,

    /// Optional warning message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Default for DiffSummary {
    fn default() -> Self {
        Self {
            has_regressions: false,
            violation_count: 0,
            status: DiffStatus::Passed,
            warning: None,
        }
    }
}
