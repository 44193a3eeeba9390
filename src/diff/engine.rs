//! Core diff engine implementation.
//! Generates complete diff reports by comparing two metric tables.

use crate::bench::BenchmarkResultStore;
use crate::snapshot::ProfileSnapshot;
use chrono::Utc;
use log::debug;

use super::normalizer::{are_sections_identical, check_compatibility, compare_dimension};
use super::schema::{DiffReport, DiffSummary, InputMetadata};
use super::table::MetricTable;
use super::DiffError;

/// Version of the diff report format
pub const DIFF_VERSION: &str = "1.0.0";

/// Generate a complete diff report comparing two tables
///
/// Pure function of its inputs: neither table is modified, and the same
/// inputs always produce the same sections in the same order.
///
/// # Arguments
/// * `old` - The baseline table
/// * `new` - The table compared against the baseline
///
/// # Errors
/// * `DiffError::KeyMismatch` - If the tables have incompatible schemas
///
/// # Example
/// ```ignore
/// let old = MetricTable::from(&read_snapshot("before.json")?);
/// let new = MetricTable::from(&read_snapshot("after.json")?);
/// let report = generate_diff(&old, &new)?;
/// ```
pub fn generate_diff(old: &MetricTable, new: &MetricTable) -> Result<DiffReport, DiffError> {
    // Step 1: Check compatibility
    check_compatibility(old, new)?;

    // Step 2: One section per dimension
    let sections: Vec<_> = (0..old.dimensions().len())
        .map(|dimension| compare_dimension(old, new, dimension))
        .collect();

    debug!(
        "Compared {} old / {} new keys across {} dimensions",
        old.len(),
        new.len(),
        sections.len()
    );

    // Step 3: Summary (no thresholds yet)
    let mut summary = DiffSummary::default();
    if old.is_empty() && new.is_empty() {
        summary.warning = Some("No data in either input".to_string());
    } else if are_sections_identical(&sections) {
        summary.warning = Some("Old and new inputs are identical".to_string());
    }

    Ok(DiffReport {
        diff_version: DIFF_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        kind: old.kind(),
        old: metadata(old),
        new: metadata(new),
        sections,
        threshold_violations: Vec::new(), // Populated by check_thresholds
        summary,
    })
}

/// Diff two profile snapshots
pub fn diff_snapshots(old: &ProfileSnapshot, new: &ProfileSnapshot) -> Result<DiffReport, DiffError> {
    generate_diff(
        &MetricTable::from(old).with_source("old"),
        &MetricTable::from(new).with_source("new"),
    )
}

/// Diff two benchmark result stores
pub fn diff_benchmarks(
    old: &BenchmarkResultStore,
    new: &BenchmarkResultStore,
) -> Result<DiffReport, DiffError> {
    generate_diff(
        &MetricTable::from(old).with_source("old"),
        &MetricTable::from(new).with_source("new"),
    )
}

fn metadata(table: &MetricTable) -> InputMetadata {
    InputMetadata {
        source: table.source().to_string(),
        key_count: table.len(),
        sampling_rate: table.sampling_rate(),
        taken_at: table.taken_at().map(str::to_string),
    }
}
