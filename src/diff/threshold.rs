//! Threshold configuration and violation detection.
//!
//! Loads regression policies from TOML and checks diff reports
//! for violations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::schema::{
    Change, DeltaSection, DiffReport, DiffStatus, DiffSummary, Severity, ThresholdViolation,
};
use super::DiffError;

/// Complete threshold configuration
///
/// ```toml
/// max_increase_percent = 10.0
/// fail_on_new = false
///
/// [dimensions]
/// alloc_bytes = 5.0
///
/// [keys]
/// warn_individual_increase_percent = 50.0
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ThresholdConfig {
    /// Maximum allowed increase of any dimension's total, in percent
    pub max_increase_percent: Option<f64>,

    /// Per-dimension overrides of `max_increase_percent`
    #[serde(default)]
    pub dimensions: HashMap<String, f64>,

    /// Treat keys that only exist in the new input as errors
    #[serde(default)]
    pub fail_on_new: bool,

    /// Per-key thresholds (optional)
    #[serde(default)]
    pub keys: Option<KeyThresholds>,
}

/// Per-key thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyThresholds {
    /// Warn if any single key increases by more than this percentage
    pub warn_individual_increase_percent: Option<f64>,
}

impl ThresholdConfig {
    /// Config with a single limit applied to every dimension's total
    pub fn with_max_increase_percent(percent: f64) -> Self {
        Self {
            max_increase_percent: Some(percent),
            ..Self::default()
        }
    }

    /// Limit that applies to `dimension`'s total, if any
    pub fn limit_for(&self, dimension: &str) -> Option<f64> {
        self.dimensions
            .get(dimension)
            .copied()
            .or(self.max_increase_percent)
    }

    /// Whether any threshold is configured at all
    pub fn is_empty(&self) -> bool {
        self.max_increase_percent.is_none()
            && self.dimensions.is_empty()
            && !self.fail_on_new
            && self
                .keys
                .as_ref()
                .map_or(true, |k| k.warn_individual_increase_percent.is_none())
    }

    fn validate(&self) -> Result<(), DiffError> {
        let negative = self
            .max_increase_percent
            .into_iter()
            .chain(self.dimensions.values().copied())
            .chain(
                self.keys
                    .as_ref()
                    .and_then(|k| k.warn_individual_increase_percent),
            )
            .find(|v| !v.is_finite() || *v < 0.0);

        match negative {
            Some(value) => Err(DiffError::InvalidThresholds(format!(
                "threshold {} must be a finite, non-negative percentage",
                value
            ))),
            None => Ok(()),
        }
    }
}

/// Load thresholds from a TOML file
///
/// # Errors
/// * `DiffError::IoError` - If file cannot be read
/// * `DiffError::ThresholdParseFailed` - If TOML is invalid
/// * `DiffError::InvalidThresholds` - If a threshold is negative or not finite
///
/// # Example
/// ```ignore
/// let thresholds = load_thresholds("thresholds.toml")?;
/// ```
pub fn load_thresholds(path: impl AsRef<Path>) -> Result<ThresholdConfig, DiffError> {
    let contents = fs::read_to_string(path)?;
    parse_thresholds(&contents)
}

/// Parse thresholds from TOML text
pub fn parse_thresholds(contents: &str) -> Result<ThresholdConfig, DiffError> {
    let config: ThresholdConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Check a diff report against thresholds and update violations
///
/// # Returns
/// Vector of violations (also updates diff.threshold_violations and diff.summary)
///
/// # Example
/// ```ignore
/// let mut diff = generate_diff(&old, &new)?;
/// let thresholds = load_thresholds("thresholds.toml")?;
/// check_thresholds(&mut diff, &thresholds);
/// ```
pub fn check_thresholds(diff: &mut DiffReport, config: &ThresholdConfig) -> Vec<ThresholdViolation> {
    let mut violations = Vec::new();

    for section in &diff.sections {
        check_total_threshold(section, config, &mut violations);

        if config.fail_on_new {
            check_new_keys(section, &mut violations);
        }

        if let Some(max_percent) = config
            .keys
            .as_ref()
            .and_then(|k| k.warn_individual_increase_percent)
        {
            check_key_thresholds(section, max_percent, &mut violations);
        }
    }

    // Keep the warning from generate_diff (e.g. identical inputs)
    let warning = diff.summary.warning.take();
    diff.threshold_violations = violations.clone();
    diff.summary = create_summary(&violations);
    diff.summary.warning = warning;

    violations
}

/// Check a section's aggregate row
fn check_total_threshold(
    section: &DeltaSection,
    config: &ThresholdConfig,
    violations: &mut Vec<ThresholdViolation>,
) {
    let Some(limit) = config.limit_for(&section.dimension) else {
        return;
    };

    if let Some(actual) = exceeds(&section.total.change, limit) {
        violations.push(ThresholdViolation {
            metric: format!("{}.{}", section.dimension, section.total.key),
            threshold: limit,
            actual,
            severity: Severity::Error,
        });
    }
}

/// Flag keys only present in the new input
fn check_new_keys(section: &DeltaSection, violations: &mut Vec<ThresholdViolation>) {
    for row in &section.rows {
        if row.change == Change::Added {
            violations.push(ThresholdViolation {
                metric: format!("{}.{}.new", section.dimension, row.key),
                threshold: 0.0,
                actual: None,
                severity: Severity::Error,
            });
        }
    }
}

/// Check individual key rows
fn check_key_thresholds(
    section: &DeltaSection,
    max_percent: f64,
    violations: &mut Vec<ThresholdViolation>,
) {
    for row in &section.rows {
        if let Some(actual) = exceeds(&row.change, max_percent) {
            violations.push(ThresholdViolation {
                metric: format!("{}.{}", section.dimension, row.key),
                threshold: max_percent,
                actual,
                severity: Severity::Warning,
            });
        }
    }
}

/// Some(actual) when `change` is above `limit`; actual is None for unbounded increases
fn exceeds(change: &Change, limit: f64) -> Option<Option<f64>> {
    match change {
        Change::Percent(p) if *p > limit => Some(Some(*p)),
        Change::FromZero => Some(None),
        _ => None,
    }
}

/// Create summary based on violations
fn create_summary(violations: &[ThresholdViolation]) -> DiffSummary {
    let error_count = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    let warning_count = violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .count();

    let status = if error_count > 0 {
        DiffStatus::Failed
    } else if warning_count > 0 {
        DiffStatus::Warning
    } else {
        DiffStatus::Passed
    };

    DiffSummary {
        has_regressions: error_count > 0,
        violation_count: violations.len(),
        status,
        warning: None,
    }
}
