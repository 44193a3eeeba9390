//! Immutable profile snapshots.
//!
//! Snapshots are produced by the aggregator, persisted through
//! [`crate::output::json`], and compared through [`crate::diff`].
//! Two snapshots are never merged; they are only diffed.

pub mod schema;

pub use schema::{AggregateEntry, Metric, ProfileSnapshot, SnapshotTotals};
