//! Hot signatures and allocation distribution for snapshot inspection.
//!
//! Hot signatures are the call stacks that allocate the most.
//! These are the primary targets for pooling or reuse.

use crate::snapshot::{AggregateEntry, Metric, ProfileSnapshot};
use log::debug;
use serde::Serialize;

/// A signature ranked by one metric
#[derive(Debug, Clone, Serialize)]
pub struct HotEntry {
    /// Collapsed stack key
    pub stack: String,

    /// Value of the ranking metric
    pub value: u64,

    /// Share of the snapshot-wide total for that metric
    pub percentage: f64,
}

/// Rank the snapshot's entries by `metric` and keep the top `top_n`
///
/// **Public** - main entry point for the `top` command
///
/// Ties are broken by stack key so output is deterministic.
pub fn top_entries(snapshot: &ProfileSnapshot, metric: Metric, top_n: usize) -> Vec<HotEntry> {
    debug!(
        "Ranking {} entries by {} (top {})",
        snapshot.entries().len(),
        metric,
        top_n
    );

    let total: u64 = snapshot.entries().iter().map(|e| e.value(metric)).sum();

    let mut ranked: Vec<&AggregateEntry> = snapshot.entries().iter().collect();
    ranked.sort_by(|a, b| {
        b.value(metric)
            .cmp(&a.value(metric))
            .then_with(|| a.signature.cmp(&b.signature))
    });

    ranked
        .into_iter()
        .take(top_n)
        .map(|entry| create_hot_entry(entry, metric, total))
        .collect()
}

/// Create a HotEntry from an AggregateEntry
///
/// **Private** - internal conversion
fn create_hot_entry(entry: &AggregateEntry, metric: Metric, total: u64) -> HotEntry {
    let value = entry.value(metric);
    let percentage = if total > 0 {
        (value as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    HotEntry {
        stack: entry.signature.key(),
        value,
        percentage,
    }
}

/// Allocation distribution statistics
#[derive(Debug, Clone, Default)]
pub struct AllocationDistribution {
    /// Bytes allocated across all signatures
    pub total_bytes: u64,

    /// Objects allocated across all signatures
    pub total_objects: u64,

    /// Number of distinct signatures
    pub signature_count: usize,

    /// Mean object size in bytes
    pub mean_object_size: f64,

    /// Median allocated bytes per signature
    pub median_bytes_per_signature: u64,

    /// Share of bytes allocated by the top 10% of signatures
    pub top_10_percent_percentage: f64,
}

impl AllocationDistribution {
    /// Check if allocation is highly concentrated
    ///
    /// Returns true if top 10% of signatures allocate >80% of bytes
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Total: {} bytes / {} objects | Signatures: {} | Mean object: {:.1} B | Median: {} B | Top 10%: {:.1}%",
            self.total_bytes,
            self.total_objects,
            self.signature_count,
            self.mean_object_size,
            self.median_bytes_per_signature,
            self.top_10_percent_percentage
        )
    }
}

/// Calculate allocated-bytes distribution statistics
pub fn allocation_distribution(snapshot: &ProfileSnapshot) -> AllocationDistribution {
    if snapshot.is_empty() {
        return AllocationDistribution::default();
    }

    let totals = snapshot.totals();
    let count = snapshot.entries().len();

    let mut bytes: Vec<u64> = snapshot.entries().iter().map(|e| e.alloc_bytes).collect();
    bytes.sort_unstable();
    let median = bytes[bytes.len() / 2];

    let top_count = (count as f64 * 0.1).ceil() as usize;
    let top_bytes: u64 = bytes.iter().rev().take(top_count).sum();

    AllocationDistribution {
        total_bytes: totals.alloc_bytes,
        total_objects: totals.alloc_objects,
        signature_count: count,
        mean_object_size: if totals.alloc_objects > 0 {
            totals.alloc_bytes as f64 / totals.alloc_objects as f64
        } else {
            0.0
        },
        median_bytes_per_signature: median,
        top_10_percent_percentage: if totals.alloc_bytes > 0 {
            (top_bytes as f64 / totals.alloc_bytes as f64) * 100.0
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::signature::CallStackSignature;
    use chrono::Utc;

    fn snapshot(rows: &[(&str, u64, u64)]) -> ProfileSnapshot {
        let entries = rows
            .iter()
            .map(|(name, bytes, objects)| AggregateEntry {
                signature: CallStackSignature::from_functions(name.split(';')),
                alloc_objects: *objects,
                alloc_bytes: *bytes,
                live_objects: 0,
                live_bytes: 0,
            })
            .collect();
        ProfileSnapshot::new(Utc::now(), 1, entries)
    }

    #[test]
    fn test_top_entries() {
        let snap = snapshot(&[
            ("main;execute", 5000, 5),
            ("main;storage", 3000, 3),
            ("main;compute", 2000, 2),
        ]);

        let top = top_entries(&snap, Metric::AllocBytes, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].stack, "main;execute");
        assert_eq!(top[0].value, 5000);
        assert_eq!(top[0].percentage, 50.0);
        assert_eq!(top[1].stack, "main;storage");
    }

    #[test]
    fn test_top_entries_tie_break_by_key() {
        let snap = snapshot(&[("b", 10, 1), ("a", 10, 1)]);
        let top = top_entries(&snap, Metric::AllocBytes, 10);
        assert_eq!(top[0].stack, "a");
        assert_eq!(top[1].stack, "b");
    }

    #[test]
    fn test_allocation_distribution() {
        let snap = snapshot(&[
            ("stack1", 8500, 10),
            ("stack2", 1000, 5),
            ("stack3", 250, 3),
            ("stack4", 250, 2),
        ]);

        let dist = allocation_distribution(&snap);

        assert_eq!(dist.total_bytes, 10000);
        assert_eq!(dist.total_objects, 20);
        assert_eq!(dist.signature_count, 4);
        assert_eq!(dist.mean_object_size, 500.0);
        assert!(dist.is_highly_concentrated());
    }

    #[test]
    fn test_distribution_empty() {
        let dist = allocation_distribution(&snapshot(&[]));
        assert_eq!(dist.total_bytes, 0);
        assert_eq!(dist.signature_count, 0);
    }
}
