//! In-memory benchmark result store.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One benchmark's per-operation figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMeasurement {
    /// Benchmark identifier, unique within a store
    pub name: String,

    /// Iterations the figures were averaged over
    pub iterations: u64,

    /// Wall time per operation in nanoseconds
    pub ns_per_op: f64,

    /// Bytes allocated per operation
    pub bytes_per_op: f64,

    /// Heap allocations per operation
    pub allocs_per_op: f64,
}

/// Named benchmark measurements, last write wins.
///
/// A benchmark re-run in the same session replaces its earlier figures
/// instead of accumulating. Iteration is ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkResultStore {
    measurements: BTreeMap<String, BenchmarkMeasurement>,
}

impl BenchmarkResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the measurement for `name`
    pub fn record(
        &mut self,
        name: impl Into<String>,
        iterations: u64,
        ns_per_op: f64,
        bytes_per_op: f64,
        allocs_per_op: f64,
    ) {
        self.insert(BenchmarkMeasurement {
            name: name.into(),
            iterations,
            ns_per_op,
            bytes_per_op,
            allocs_per_op,
        });
    }

    /// Insert or overwrite a complete measurement
    pub fn insert(&mut self, measurement: BenchmarkMeasurement) {
        if let Some(previous) = self
            .measurements
            .insert(measurement.name.clone(), measurement)
        {
            debug!("Benchmark {} re-recorded, superseding earlier result", previous.name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkMeasurement> {
        self.measurements.get(name)
    }

    /// Measurements ordered by name.
    ///
    /// The iterator is lazy and `Clone`, so it can be restarted.
    pub fn list(&self) -> impl Iterator<Item = &BenchmarkMeasurement> + Clone + '_ {
        self.measurements.values()
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

impl FromIterator<BenchmarkMeasurement> for BenchmarkResultStore {
    fn from_iter<I: IntoIterator<Item = BenchmarkMeasurement>>(iter: I) -> Self {
        let mut store = Self::new();
        for measurement in iter {
            store.insert(measurement);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_overwrites() {
        let mut store = BenchmarkResultStore::new();
        store.record("BenchmarkX", 100, 50.0, 16.0, 1.0);
        store.record("BenchmarkX", 200, 40.0, 8.0, 0.0);

        let all: Vec<_> = store.list().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].iterations, 200);
        assert_eq!(all[0].ns_per_op, 40.0);
    }

    #[test]
    fn test_list_is_ordered_and_restartable() {
        let mut store = BenchmarkResultStore::new();
        store.record("c", 1, 1.0, 0.0, 0.0);
        store.record("a", 1, 1.0, 0.0, 0.0);
        store.record("b", 1, 1.0, 0.0, 0.0);

        let listing = store.list();
        let first: Vec<&str> = listing.clone().map(|m| m.name.as_str()).collect();
        let second: Vec<&str> = listing.map(|m| m.name.as_str()).collect();

        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }
}
