use crate::snapshot::Metric;
use crate::utils::config::DEFAULT_TOP_ENTRIES;
use std::path::PathBuf;

/// Arguments for the diff command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct DiffArgs {
    /// Baseline input (snapshot JSON or benchmark results)
    pub old: PathBuf,

    /// Input compared against the baseline
    pub new: PathBuf,

    /// TOML threshold file (optional)
    pub threshold_file: Option<PathBuf>,

    /// Single limit applied to every dimension's total, in percent
    pub threshold_percent: Option<f64>,

    /// Output path for the JSON diff report (optional)
    pub output: Option<PathBuf>,

    /// Print the table summary to stdout
    pub summary: bool,
}

impl Default for DiffArgs {
    fn default() -> Self {
        Self {
            old: PathBuf::from("old.json"),
            new: PathBuf::from("new.json"),
            threshold_file: None,
            threshold_percent: None,
            output: None,
            summary: true,
        }
    }
}

/// Arguments for the top command
#[derive(Debug, Clone)]
pub struct TopArgs {
    /// Snapshot JSON to inspect
    pub file: PathBuf,

    /// Metric to rank by
    pub metric: Metric,

    /// Number of entries to show
    pub top_n: usize,

    /// Read counters as population estimates instead of raw samples
    pub scaled: bool,
}

impl Default for TopArgs {
    fn default() -> Self {
        Self {
            file: PathBuf::from("profile.json"),
            metric: Metric::AllocBytes,
            top_n: DEFAULT_TOP_ENTRIES,
            scaled: false,
        }
    }
}

/// Arguments for the collapse command
#[derive(Debug, Clone)]
pub struct CollapseArgs {
    /// Snapshot JSON to convert
    pub file: PathBuf,

    /// Metric used as the stack weight
    pub metric: Metric,

    /// Output path; stdout when absent
    pub output: Option<PathBuf>,

    /// Scale counters by the sampling rate first
    pub scaled: bool,
}
