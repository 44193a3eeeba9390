//! Aggregation of allocation samples into per-signature counters.
//!
//! This module turns the recorder's sample stream into:
//! - Cumulative counters keyed by call-stack signature
//! - Point-in-time snapshots of those counters
//! - Hot signature rankings and allocation distribution

pub mod metrics;
pub mod profile;
pub mod sample;
pub mod signature;

// Re-export main types and functions
pub use metrics::{allocation_distribution, top_entries, AllocationDistribution, HotEntry};
pub use profile::Aggregator;
pub use sample::{AllocationSample, SampleKind};
pub use signature::{CallStackSignature, Frame};
