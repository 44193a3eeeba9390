//! Collapsed stack export.
//!
//! Format: "parent;child;grandchild weight", one stack per line.
//! This is the input format of common flamegraph renderers; rendering
//! itself happens outside this crate.

use crate::snapshot::{Metric, ProfileSnapshot};
use crate::utils::error::StoreError;
use log::info;
use std::path::Path;

/// Render a snapshot as collapsed stacks weighted by `metric`.
///
/// Lines follow the snapshot's signature order; zero-weight stacks are skipped.
pub fn to_collapsed(snapshot: &ProfileSnapshot, metric: Metric) -> String {
    let mut out = String::new();
    for entry in snapshot.entries() {
        let weight = entry.value(metric);
        if weight == 0 {
            continue;
        }
        out.push_str(&entry.signature.key());
        out.push(' ');
        out.push_str(&weight.to_string());
        out.push('\n');
    }
    out
}

/// Write collapsed stacks to a file
pub fn write_collapsed(
    snapshot: &ProfileSnapshot,
    metric: Metric,
    output_path: impl AsRef<Path>,
) -> Result<(), StoreError> {
    let output_path = output_path.as_ref();
    super::json::validate_path(output_path)?;

    let text = to_collapsed(snapshot, metric);
    std::fs::write(output_path, &text)?;

    info!(
        "Collapsed stacks ({}) written to: {}",
        metric,
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::CallStackSignature;
    use crate::snapshot::AggregateEntry;
    use chrono::Utc;

    #[test]
    fn test_collapsed_lines() {
        let snapshot = ProfileSnapshot::new(
            Utc::now(),
            1,
            vec![
                AggregateEntry {
                    signature: CallStackSignature::from_functions(["main", "read"]),
                    alloc_objects: 3,
                    alloc_bytes: 300,
                    live_objects: 0,
                    live_bytes: 0,
                },
                AggregateEntry {
                    signature: CallStackSignature::from_functions(["main", "encode"]),
                    alloc_objects: 1,
                    alloc_bytes: 50,
                    live_objects: 1,
                    live_bytes: 50,
                },
            ],
        );

        assert_eq!(
            to_collapsed(&snapshot, Metric::AllocBytes),
            "main;encode 50\nmain;read 300\n"
        );
        // live view skips the fully freed stack
        assert_eq!(to_collapsed(&snapshot, Metric::LiveBytes), "main;encode 50\n");
    }
}
