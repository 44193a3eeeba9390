//! Delta calculation between two metric tables.
//!
//! Handles the math for computing differences, including the zero-baseline
//! and missing-key cases.

use super::schema::{Change, DeltaRow, DeltaSection};
use super::table::MetricTable;
use super::DiffError;
use crate::utils::config::TOTAL_ROW_KEY;
use std::collections::BTreeSet;

/// Relative change from `old` to `new`
///
/// * old == 0, new == 0 -> 0%
/// * old == 0, new > 0 -> `Change::FromZero` (no division)
/// * otherwise (new - old) / old * 100
pub fn percent_change(old: f64, new: f64) -> Change {
    if old == 0.0 {
        if new == 0.0 {
            Change::Percent(0.0)
        } else {
            Change::FromZero
        }
    } else {
        Change::Percent((new - old) / old * 100.0)
    }
}

/// Build the row for one key present in at least one side
pub fn compare_values(key: &str, old: Option<f64>, new: Option<f64>) -> DeltaRow {
    let change = match (old, new) {
        (Some(o), Some(n)) => percent_change(o, n),
        (Some(_), None) => Change::Removed,
        (None, _) => Change::Added,
    };

    DeltaRow {
        key: key.to_string(),
        old,
        new,
        change,
    }
}

/// Compare one dimension of two tables.
///
/// Rows come out sorted by key, with keys present on both sides at zero
/// elided. The total row compares the column sums; it is never derived
/// from the per-row percentages.
pub fn compare_dimension(old: &MetricTable, new: &MetricTable, dimension: usize) -> DeltaSection {
    let keys: BTreeSet<&str> = old.keys().chain(new.keys()).collect();

    let mut rows = Vec::with_capacity(keys.len());
    let mut old_sum = 0.0;
    let mut new_sum = 0.0;

    for key in keys {
        let old_value = old.value(key, dimension);
        let new_value = new.value(key, dimension);

        old_sum += old_value.unwrap_or(0.0);
        new_sum += new_value.unwrap_or(0.0);

        if old_value == Some(0.0) && new_value == Some(0.0) {
            continue;
        }

        rows.push(compare_values(key, old_value, new_value));
    }

    let total = DeltaRow {
        key: TOTAL_ROW_KEY.to_string(),
        old: Some(old_sum),
        new: Some(new_sum),
        change: percent_change(old_sum, new_sum),
    };

    DeltaSection {
        dimension: old.dimensions()[dimension].clone(),
        rows,
        total,
    }
}

/// Check if two tables can be compared
///
/// Tables must be of the same kind, share the same dimensions and, for
/// profiles, be recorded at the same sampling rate.
pub fn check_compatibility(old: &MetricTable, new: &MetricTable) -> Result<(), DiffError> {
    if old.kind() != new.kind()
        || old.dimensions() != new.dimensions()
        || old.sampling_rate() != new.sampling_rate()
    {
        return Err(DiffError::KeyMismatch {
            old: old.schema_label(),
            new: new.schema_label(),
        });
    }

    Ok(())
}

/// Check if every row in every section is unchanged
pub fn are_sections_identical(sections: &[DeltaSection]) -> bool {
    sections.iter().all(|section| {
        section.total.change.is_zero() && section.rows.iter().all(|row| row.change.is_zero())
    })
}
