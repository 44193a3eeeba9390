//! Snapshot inspection commands: `top` and `collapse`.

use super::models::{CollapseArgs, TopArgs};
use crate::aggregator::{allocation_distribution, top_entries};
use crate::output::{read_snapshot, to_collapsed, write_collapsed};
use crate::snapshot::ProfileSnapshot;
use crate::utils::config::MAX_TOP_ENTRIES;
use anyhow::{Context, Result};
use colored::*;
use log::info;
use std::path::Path;

/// Validate top command arguments before doing any work
pub fn validate_top_args(args: &TopArgs) -> Result<()> {
    if args.top_n == 0 {
        anyhow::bail!("--top must be at least 1");
    }
    if args.top_n > MAX_TOP_ENTRIES {
        anyhow::bail!("--top cannot exceed {}", MAX_TOP_ENTRIES);
    }
    ensure_file(&args.file)
}

/// Validate collapse command arguments
pub fn validate_collapse_args(args: &CollapseArgs) -> Result<()> {
    ensure_file(&args.file)?;
    if let Some(output) = &args.output {
        crate::output::validate_path(output)?;
    }
    Ok(())
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

fn load(path: &Path, scaled: bool) -> Result<ProfileSnapshot> {
    let snapshot = read_snapshot(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    Ok(if scaled { snapshot.scaled() } else { snapshot })
}

/// Print the hottest signatures of a snapshot
pub fn execute_top(args: TopArgs) -> Result<()> {
    let snapshot = load(&args.file, args.scaled)?;
    let hot = top_entries(&snapshot, args.metric, args.top_n);

    info!("{}", allocation_distribution(&snapshot).summary());

    println!(
        "{}",
        format!("Top {} by {}", hot.len(), args.metric).bold()
    );
    if hot.is_empty() {
        println!("  (no entries)");
    }
    for (i, entry) in hot.iter().enumerate() {
        println!(
            "{:>4}. {:>12} {:>6.2}%  {}",
            i + 1,
            entry.value,
            entry.percentage,
            entry.stack
        );
    }

    Ok(())
}

/// Convert a snapshot to collapsed stacks, to a file or stdout
pub fn execute_collapse(args: CollapseArgs) -> Result<()> {
    let snapshot = load(&args.file, args.scaled)?;

    match &args.output {
        Some(path) => {
            write_collapsed(&snapshot, args.metric, path)
                .context("Failed to write collapsed stacks")?;
        }
        None => print!("{}", to_collapsed(&snapshot, args.metric)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Aggregator, CallStackSignature};
    use crate::output::write_snapshot;
    use crate::snapshot::Metric;

    fn snapshot_file(dir: &Path) -> std::path::PathBuf {
        let aggregator = Aggregator::new();
        aggregator
            .alloc(CallStackSignature::from_functions(["main", "load"]), 2, 64)
            .unwrap();
        let path = dir.join("profile.json");
        write_snapshot(&aggregator.snapshot(), &path).unwrap();
        path
    }

    #[test]
    fn test_validate_top_args_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let file = snapshot_file(dir.path());

        let mut args = TopArgs {
            file,
            ..TopArgs::default()
        };
        assert!(validate_top_args(&args).is_ok());

        args.top_n = 0;
        assert!(validate_top_args(&args).is_err());

        args.top_n = MAX_TOP_ENTRIES + 1;
        assert!(validate_top_args(&args).is_err());
    }

    #[test]
    fn test_validate_missing_file() {
        let args = TopArgs {
            file: "/nonexistent/profile.json".into(),
            ..TopArgs::default()
        };
        assert!(validate_top_args(&args).is_err());
    }

    #[test]
    fn test_collapse_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = snapshot_file(dir.path());
        let output = dir.path().join("stacks.txt");

        execute_collapse(CollapseArgs {
            file,
            metric: Metric::AllocBytes,
            output: Some(output.clone()),
            scaled: false,
        })
        .unwrap();

        let text = std::fs::read_to_string(output).unwrap();
        assert_eq!(text, "main;load 64\n");
    }
}
