//! Snapshot schema definitions.
//!
//! A snapshot is the unit exchanged between profiling runs. Its JSON form is
//! versioned and keeps entries sorted by signature so two files diff cleanly
//! with ordinary text tools.

use crate::aggregator::signature::CallStackSignature;
use crate::utils::config::SCHEMA_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Running totals for one call-stack signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateEntry {
    /// Where the allocations happened
    #[serde(rename = "frames")]
    pub signature: CallStackSignature,

    /// Objects allocated since the session started
    pub alloc_objects: u64,

    /// Bytes allocated since the session started
    pub alloc_bytes: u64,

    /// Objects allocated and not yet freed
    pub live_objects: u64,

    /// Bytes allocated and not yet freed
    pub live_bytes: u64,
}

impl AggregateEntry {
    pub fn new(signature: CallStackSignature) -> Self {
        Self {
            signature,
            alloc_objects: 0,
            alloc_bytes: 0,
            live_objects: 0,
            live_bytes: 0,
        }
    }

    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::AllocObjects => self.alloc_objects,
            Metric::AllocBytes => self.alloc_bytes,
            Metric::LiveObjects => self.live_objects,
            Metric::LiveBytes => self.live_bytes,
        }
    }

    /// Live counters never exceed the allocated ones
    pub fn is_consistent(&self) -> bool {
        self.live_objects <= self.alloc_objects && self.live_bytes <= self.alloc_bytes
    }
}

/// The four counters tracked per signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AllocObjects,
    AllocBytes,
    LiveObjects,
    LiveBytes,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AllocObjects,
        Metric::AllocBytes,
        Metric::LiveObjects,
        Metric::LiveBytes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::AllocObjects => "alloc_objects",
            Metric::AllocBytes => "alloc_bytes",
            Metric::LiveObjects => "live_objects",
            Metric::LiveBytes => "live_bytes",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown metric '{}' (expected one of alloc_objects, alloc_bytes, live_objects, live_bytes)",
                    s
                )
            })
    }
}

/// Snapshot as written on disk, before validation
#[derive(Deserialize)]
struct RawSnapshot {
    version: String,
    taken_at: DateTime<Utc>,
    sampling_rate: u64,
    entries: Vec<AggregateEntry>,
}

impl TryFrom<RawSnapshot> for ProfileSnapshot {
    type Error = String;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let mut entries = raw.entries;
        entries.sort_by(|a, b| a.signature.cmp(&b.signature));

        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].signature == pair[1].signature)
        {
            return Err(format!(
                "duplicate entry for signature '{}'",
                pair[0].signature.key()
            ));
        }

        if let Some(entry) = entries.iter().find(|e| !e.is_consistent()) {
            return Err(format!(
                "live counters exceed allocated counters for '{}' (live {}/{}, alloc {}/{})",
                entry.signature.key(),
                entry.live_objects,
                entry.live_bytes,
                entry.alloc_objects,
                entry.alloc_bytes
            ));
        }

        Ok(Self {
            version: raw.version,
            taken_at: raw.taken_at,
            sampling_rate: raw.sampling_rate,
            entries,
        })
    }
}

/// Sum of every entry's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotTotals {
    pub alloc_objects: u64,
    pub alloc_bytes: u64,
    pub live_objects: u64,
    pub live_bytes: u64,
}

/// Immutable, timestamped copy of an aggregator's state
///
/// Deserialized snapshots go through the same checks as aggregator output:
/// entries are sorted, signatures are unique and live counters never exceed
/// allocated ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct ProfileSnapshot {
    version: String,
    taken_at: DateTime<Utc>,
    sampling_rate: u64,
    entries: Vec<AggregateEntry>,
}

impl ProfileSnapshot {
    /// Build a snapshot; entries are sorted by signature
    pub fn new(taken_at: DateTime<Utc>, sampling_rate: u64, mut entries: Vec<AggregateEntry>) -> Self {
        entries.sort_by(|a, b| a.signature.cmp(&b.signature));
        Self {
            version: SCHEMA_VERSION.to_string(),
            taken_at,
            sampling_rate,
            entries,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn sampling_rate(&self) -> u64 {
        self.sampling_rate
    }

    pub fn entries(&self) -> &[AggregateEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the entry for a signature
    pub fn entry(&self, signature: &CallStackSignature) -> Option<&AggregateEntry> {
        self.entries
            .binary_search_by(|e| e.signature.cmp(signature))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn totals(&self) -> SnapshotTotals {
        self.entries
            .iter()
            .fold(SnapshotTotals::default(), |mut acc, e| {
                acc.alloc_objects = acc.alloc_objects.saturating_add(e.alloc_objects);
                acc.alloc_bytes = acc.alloc_bytes.saturating_add(e.alloc_bytes);
                acc.live_objects = acc.live_objects.saturating_add(e.live_objects);
                acc.live_bytes = acc.live_bytes.saturating_add(e.live_bytes);
                acc
            })
    }

    /// Estimate true totals from sampled counters.
    ///
    /// An allocation of average size `s` recorded at rate `r` had probability
    /// `1 - exp(-s / r)` of being sampled; counters are divided by it.
    /// One factor per entry, taken from the allocated average, applies to all
    /// four counters so live stays within alloc. The result carries a
    /// sampling rate of 1. At rate 1 this is a copy.
    pub fn scaled(&self) -> ProfileSnapshot {
        let rate = self.sampling_rate;
        let entries = self
            .entries
            .iter()
            .map(|e| {
                let scale = scale_factor(e.alloc_objects, e.alloc_bytes, rate);
                AggregateEntry {
                    signature: e.signature.clone(),
                    alloc_objects: apply_scale(e.alloc_objects, scale),
                    alloc_bytes: apply_scale(e.alloc_bytes, scale),
                    live_objects: apply_scale(e.live_objects, scale),
                    live_bytes: apply_scale(e.live_bytes, scale),
                }
            })
            .collect();

        ProfileSnapshot {
            version: self.version.clone(),
            taken_at: self.taken_at,
            sampling_rate: 1,
            entries,
        }
    }
}

fn scale_factor(objects: u64, bytes: u64, rate: u64) -> f64 {
    if objects == 0 || bytes == 0 || rate <= 1 {
        return 1.0;
    }

    let avg_size = bytes as f64 / objects as f64;
    let probability = 1.0 - (-avg_size / rate as f64).exp();
    if probability <= 0.0 {
        return 1.0;
    }

    1.0 / probability
}

// rounding is monotonic, so a <= b still holds after scaling both
fn apply_scale(value: u64, scale: f64) -> u64 {
    (value as f64 * scale).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(functions: &[&str], alloc_bytes: u64, alloc_objects: u64) -> AggregateEntry {
        AggregateEntry {
            signature: CallStackSignature::from_functions(functions.iter().copied()),
            alloc_objects,
            alloc_bytes,
            live_objects: alloc_objects,
            live_bytes: alloc_bytes,
        }
    }

    #[test]
    fn test_entries_sorted_and_searchable() {
        let snapshot = ProfileSnapshot::new(
            Utc::now(),
            1,
            vec![entry(&["main", "z"], 10, 1), entry(&["main", "a"], 20, 2)],
        );

        assert_eq!(snapshot.entries()[0].signature.key(), "main;a");
        let sig = CallStackSignature::from_functions(["main", "z"]);
        assert_eq!(snapshot.entry(&sig).unwrap().alloc_bytes, 10);
    }

    #[test]
    fn test_totals() {
        let snapshot = ProfileSnapshot::new(
            Utc::now(),
            1,
            vec![entry(&["a"], 10, 1), entry(&["b"], 20, 4)],
        );

        let totals = snapshot.totals();
        assert_eq!(totals.alloc_bytes, 30);
        assert_eq!(totals.alloc_objects, 5);
        assert_eq!(totals.live_bytes, 30);
    }

    #[test]
    fn test_scaled_is_identity_at_rate_one() {
        let snapshot = ProfileSnapshot::new(Utc::now(), 1, vec![entry(&["a"], 1000, 10)]);
        assert_eq!(snapshot.scaled().entries(), snapshot.entries());
    }

    #[test]
    fn test_scaled_inflates_small_allocations() {
        // 16-byte objects at a 512 byte rate are rarely sampled
        let snapshot = ProfileSnapshot::new(Utc::now(), 512, vec![entry(&["a"], 160, 10)]);
        let scaled = snapshot.scaled();

        assert_eq!(scaled.sampling_rate(), 1);
        assert!(scaled.entries()[0].alloc_bytes > 160 * 30);
        assert!(scaled.entries()[0].alloc_objects > 10 * 30);
    }

    #[test]
    fn test_scaled_keeps_live_within_alloc() {
        // few large objects still live, many small ones already freed
        let snapshot = ProfileSnapshot::new(
            Utc::now(),
            512,
            vec![AggregateEntry {
                signature: CallStackSignature::from_functions(["main", "a"]),
                alloc_objects: 10,
                alloc_bytes: 1000,
                live_objects: 10,
                live_bytes: 10,
            }],
        );

        let scaled = snapshot.scaled();
        let e = &scaled.entries()[0];
        assert!(e.is_consistent());
        assert_eq!(e.live_objects, e.alloc_objects);
        assert!(e.live_bytes < e.alloc_bytes);
    }

    #[test]
    fn test_scaled_entries_stay_consistent() {
        let entries = vec![
            AggregateEntry {
                signature: CallStackSignature::from_functions(["a"]),
                alloc_objects: 3,
                alloc_bytes: 3_000_000,
                live_objects: 1,
                live_bytes: 8,
            },
            AggregateEntry {
                signature: CallStackSignature::from_functions(["b"]),
                alloc_objects: 500,
                alloc_bytes: 4000,
                live_objects: 499,
                live_bytes: 3999,
            },
        ];
        let scaled = ProfileSnapshot::new(Utc::now(), 512 * 1024, entries).scaled();

        assert!(scaled.entries().iter().all(AggregateEntry::is_consistent));
    }

    #[test]
    fn test_deserialize_sorts_entries() {
        let text = r#"{
            "version": "1.0.0",
            "taken_at": "2024-01-01T00:00:00Z",
            "sampling_rate": 1,
            "entries": [
                {"frames": [{"function": "c"}], "alloc_objects": 1, "alloc_bytes": 3, "live_objects": 0, "live_bytes": 0},
                {"frames": [{"function": "a"}], "alloc_objects": 1, "alloc_bytes": 1, "live_objects": 1, "live_bytes": 1}
            ]
        }"#;
        let snapshot: ProfileSnapshot = serde_json::from_str(text).unwrap();

        assert_eq!(snapshot.entries()[0].signature.key(), "a");
        let c = CallStackSignature::from_functions(["c"]);
        assert_eq!(snapshot.entry(&c).unwrap().alloc_bytes, 3);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("live_bytes".parse::<Metric>().unwrap(), Metric::LiveBytes);
        assert!("heap".parse::<Metric>().is_err());
    }
}
