//! Key-indexed metric tables, the common input shape of the diff engine.
//!
//! Snapshots and benchmark stores are flattened into a table of
//! `key -> [value per dimension]` before comparison, so the engine has a
//! single code path for both.

use crate::bench::BenchmarkResultStore;
use crate::snapshot::{Metric, ProfileSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which kind of source a table was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Profile,
    Benchmark,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Profile => f.write_str("profile"),
            TableKind::Benchmark => f.write_str("benchmark"),
        }
    }
}

/// Dimensions compared for benchmark results
pub const BENCHMARK_DIMENSIONS: [&str; 3] = ["ns/op", "B/op", "allocs/op"];

/// Flattened, immutable view of one diff input
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    kind: TableKind,
    source: String,
    sampling_rate: Option<u64>,
    taken_at: Option<String>,
    dimensions: Vec<String>,
    rows: BTreeMap<String, Vec<f64>>,
}

impl MetricTable {
    /// Table built from a profile snapshot (one row per signature)
    pub fn from_snapshot(snapshot: &ProfileSnapshot) -> Self {
        let mut rows: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for entry in snapshot.entries() {
            let values = rows
                .entry(entry.signature.key())
                .or_insert_with(|| vec![0.0; Metric::ALL.len()]);
            // distinct signatures rendering to the same key are folded together
            for (slot, metric) in values.iter_mut().zip(Metric::ALL) {
                *slot += entry.value(metric) as f64;
            }
        }

        Self {
            kind: TableKind::Profile,
            source: "profile".to_string(),
            sampling_rate: Some(snapshot.sampling_rate()),
            taken_at: Some(snapshot.taken_at().to_rfc3339()),
            dimensions: Metric::ALL.iter().map(|m| m.name().to_string()).collect(),
            rows,
        }
    }

    /// Table built from benchmark results (one row per benchmark name)
    pub fn from_benchmarks(store: &BenchmarkResultStore) -> Self {
        let rows = store
            .list()
            .map(|m| {
                (
                    m.name.clone(),
                    vec![m.ns_per_op, m.bytes_per_op, m.allocs_per_op],
                )
            })
            .collect();

        Self {
            kind: TableKind::Benchmark,
            source: "benchmarks".to_string(),
            sampling_rate: None,
            taken_at: None,
            dimensions: BENCHMARK_DIMENSIONS.iter().map(|d| d.to_string()).collect(),
            rows,
        }
    }

    /// Label shown in reports (usually the file path)
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sampling_rate(&self) -> Option<u64> {
        self.sampling_rate
    }

    pub fn taken_at(&self) -> Option<&str> {
        self.taken_at.as_deref()
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `key` in dimension number `dimension`
    pub fn value(&self, key: &str, dimension: usize) -> Option<f64> {
        self.rows.get(key).and_then(|values| values.get(dimension).copied())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.keys().map(String::as_str)
    }

    /// Short schema description used in mismatch errors
    pub fn schema_label(&self) -> String {
        match self.sampling_rate {
            Some(rate) => format!("{} [{}] @ rate {}", self.kind, self.dimensions.join(", "), rate),
            None => format!("{} [{}]", self.kind, self.dimensions.join(", ")),
        }
    }
}

impl From<&ProfileSnapshot> for MetricTable {
    fn from(snapshot: &ProfileSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

impl From<&BenchmarkResultStore> for MetricTable {
    fn from(store: &BenchmarkResultStore) -> Self {
        Self::from_benchmarks(store)
    }
}
