//! Allocation samples handed from the recorder to the aggregator.

use super::signature::CallStackSignature;
use std::time::Instant;

/// Whether a sample adds to or releases from the live counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Alloc,
    Free,
}

/// One observed allocation (or free) event
#[derive(Debug, Clone)]
pub struct AllocationSample {
    pub signature: CallStackSignature,
    pub object_count: u64,
    pub byte_size: u64,
    pub kind: SampleKind,
    pub timestamp: Instant,
}

impl AllocationSample {
    pub fn alloc(signature: CallStackSignature, object_count: u64, byte_size: u64) -> Self {
        Self {
            signature,
            object_count,
            byte_size,
            kind: SampleKind::Alloc,
            timestamp: Instant::now(),
        }
    }

    pub fn free(signature: CallStackSignature, object_count: u64, byte_size: u64) -> Self {
        Self {
            kind: SampleKind::Free,
            ..Self::alloc(signature, object_count, byte_size)
        }
    }
}
