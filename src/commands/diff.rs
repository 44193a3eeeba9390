//! Diff command implementation.
//! Orchestrates the comparison of two inputs and reports deltas/violations.

use super::models::DiffArgs;
use crate::bench::{parse_results, BenchmarkResultStore};
use crate::diff::{
    check_thresholds, generate_diff, load_thresholds, render_terminal_diff, DiffStatus,
    MetricTable, ThresholdConfig,
};
use crate::output::snapshot_from_str;
use crate::snapshot::ProfileSnapshot;
use anyhow::{Context, Result};
use colored::*;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// A parsed diff input of either kind
#[derive(Debug, Clone)]
pub enum LoadedInput {
    Snapshot(ProfileSnapshot),
    Benchmarks(BenchmarkResultStore),
}

impl LoadedInput {
    pub fn to_table(&self) -> MetricTable {
        match self {
            LoadedInput::Snapshot(snapshot) => MetricTable::from(snapshot),
            LoadedInput::Benchmarks(store) => MetricTable::from(store),
        }
    }
}

/// Read and parse one input file.
///
/// JSON objects are read as profile snapshots, anything else as benchmark
/// result lines.
pub fn load_input(path: &Path) -> Result<LoadedInput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source = path.display().to_string();

    if text.trim_start().starts_with('{') {
        debug!("{} looks like a profile snapshot", source);
        Ok(LoadedInput::Snapshot(snapshot_from_str(&source, &text)?))
    } else {
        debug!("{} looks like benchmark results", source);
        Ok(LoadedInput::Benchmarks(parse_results(&source, &text)?))
    }
}

/// Load either input kind into a metric table whose source is the file path
pub fn load_table(path: &Path) -> Result<MetricTable> {
    let table = load_input(path)?.to_table();
    Ok(table.with_source(path.display().to_string()))
}

/// Execute the diff command
///
/// Returns an error when the report status is FAILED so the process exits
/// non-zero.
pub fn execute_diff(args: DiffArgs) -> Result<()> {
    // Step 1: Load inputs
    let old = load_table(&args.old).context("Failed to read old input")?;
    let new = load_table(&args.new).context("Failed to read new input")?;

    info!(
        "Comparing {} ({} keys) against {} ({} keys)",
        old.source(),
        old.len(),
        new.source(),
        new.len()
    );

    // Step 2: Generate diff
    let mut report = generate_diff(&old, &new).context("Failed to generate diff")?;

    // Step 3: Handle thresholds
    let mut thresholds = if let Some(path) = &args.threshold_file {
        load_thresholds(path).context("Failed to load threshold file")?
    } else {
        ThresholdConfig::default()
    };

    // Override with simple percent if provided
    if let Some(percent) = args.threshold_percent {
        if !percent.is_finite() || percent < 0.0 {
            anyhow::bail!("Threshold percent must be a non-negative number, got {}", percent);
        }
        thresholds.max_increase_percent = Some(percent);
    }

    // Step 4: Check violations only if thresholds are set
    if !thresholds.is_empty() {
        check_thresholds(&mut report, &thresholds);
    }

    // Step 5: Write output if requested
    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).context("Failed to write diff report JSON")?;
        println!(
            "Diff report written to {}",
            path.display().to_string().cyan()
        );
    }

    // Step 6: Terminal summary
    if args.summary {
        println!("{}", render_terminal_diff(&report));
    }

    // Step 7: Exit status
    if report.summary.status == DiffStatus::Failed {
        return Err(anyhow::anyhow!(
            "Regression detected against thresholds ({} violations)",
            report.summary.violation_count
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::TableKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_table_detects_benchmarks() {
        let file = temp_with("BenchmarkParse 1000 52.0 128 3\n");
        let table = load_table(file.path()).unwrap();

        assert_eq!(table.kind(), TableKind::Benchmark);
        assert_eq!(table.value("BenchmarkParse", 0), Some(52.0));
        assert_eq!(table.source(), file.path().display().to_string());
    }

    #[test]
    fn test_load_table_detects_snapshot() {
        let json = r#"{
            "version": "1.0.0",
            "taken_at": "2024-01-01T00:00:00Z",
            "sampling_rate": 1,
            "entries": []
        }"#;
        let file = temp_with(json);
        let table = load_table(file.path()).unwrap();

        assert_eq!(table.kind(), TableKind::Profile);
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_input_parses_once_into_kind() {
        let json = r#"{
            "version": "1.0.0",
            "taken_at": "2024-01-01T00:00:00Z",
            "sampling_rate": 64,
            "entries": [
                {"frames": [{"function": "main"}], "alloc_objects": 2, "alloc_bytes": 96, "live_objects": 1, "live_bytes": 48}
            ]
        }"#;
        let file = temp_with(json);

        match load_input(file.path()).unwrap() {
            LoadedInput::Snapshot(snapshot) => {
                assert_eq!(snapshot.sampling_rate(), 64);
                assert_eq!(snapshot.totals().live_bytes, 48);
            }
            other => panic!("expected a snapshot, got {other:?}"),
        }

        let bench = temp_with("BenchmarkA 1 2 3 4
");
        assert!(matches!(
            load_input(bench.path()).unwrap(),
            LoadedInput::Benchmarks(store) if store.len() == 1
        ));
    }

    #[test]
    fn test_validate_rejects_inconsistent_snapshot() {
        let json = r#"{
            "version": "1.0.0",
            "taken_at": "2024-01-01T00:00:00Z",
            "sampling_rate": 1,
            "entries": [
                {"frames": [{"function": "main"}], "alloc_objects": 1, "alloc_bytes": 10, "live_objects": 1, "live_bytes": 999}
            ]
        }"#;
        let file = temp_with(json);

        assert!(crate::commands::validate_input_file(file.path()).is_err());
    }

    #[test]
    fn test_load_table_malformed() {
        let file = temp_with("{ not json");
        assert!(load_table(file.path()).is_err());
    }

    #[test]
    fn test_execute_diff_threshold_failure() {
        let old = temp_with("BenchmarkA 100 10 0 0\n");
        let new = temp_with("BenchmarkA 100 20 0 0\n");

        let args = DiffArgs {
            old: old.path().to_path_buf(),
            new: new.path().to_path_buf(),
            threshold_percent: Some(10.0),
            summary: false,
            ..DiffArgs::default()
        };

        assert!(execute_diff(args).is_err());
    }

    #[test]
    fn test_execute_diff_writes_report() {
        let old = temp_with("BenchmarkA 100 10 0 0\n");
        let new = temp_with("BenchmarkA 100 9 0 0\n");
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("diff.json");

        let args = DiffArgs {
            old: old.path().to_path_buf(),
            new: new.path().to_path_buf(),
            threshold_percent: Some(10.0),
            output: Some(report_path.clone()),
            summary: false,
            ..DiffArgs::default()
        };

        execute_diff(args).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(written["summary"]["status"], "PASSED");
    }

    #[test]
    fn test_negative_threshold_percent_rejected() {
        let old = temp_with("BenchmarkA 100 10 0 0\n");
        let args = DiffArgs {
            old: old.path().to_path_buf(),
            new: old.path().to_path_buf(),
            threshold_percent: Some(-5.0),
            summary: false,
            ..DiffArgs::default()
        };

        assert!(execute_diff(args).is_err());
    }
}
