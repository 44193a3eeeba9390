//! Per-signature allocation counters.
//!
//! The map is sharded: ingesting into an existing signature only takes a
//! shard read lock and bumps atomic counters, so concurrent writers never
//! serialize on a single global lock. Creating a new signature takes the
//! shard write lock briefly.

use super::sample::{AllocationSample, SampleKind};
use super::signature::CallStackSignature;
use crate::snapshot::{AggregateEntry, ProfileSnapshot};
use crate::utils::config::DEFAULT_MAX_SIGNATURES;
use crate::utils::error::RecordError;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct EntryCounters {
    alloc_objects: AtomicU64,
    alloc_bytes: AtomicU64,
    live_objects: AtomicU64,
    live_bytes: AtomicU64,
}

impl EntryCounters {
    // alloc counters are bumped before live ones and read after them,
    // which keeps live <= alloc in every copy
    fn on_alloc(&self, objects: u64, bytes: u64) {
        self.alloc_objects.fetch_add(objects, Ordering::AcqRel);
        self.alloc_bytes.fetch_add(bytes, Ordering::AcqRel);
        self.live_objects.fetch_add(objects, Ordering::AcqRel);
        self.live_bytes.fetch_add(bytes, Ordering::AcqRel);
    }

    fn on_free(&self, objects: u64, bytes: u64) {
        saturating_decrement(&self.live_objects, objects);
        saturating_decrement(&self.live_bytes, bytes);
    }

    fn copy(&self, signature: CallStackSignature) -> AggregateEntry {
        let live_objects = self.live_objects.load(Ordering::Acquire);
        let live_bytes = self.live_bytes.load(Ordering::Acquire);
        let alloc_objects = self.alloc_objects.load(Ordering::Acquire);
        let alloc_bytes = self.alloc_bytes.load(Ordering::Acquire);

        AggregateEntry {
            signature,
            alloc_objects,
            alloc_bytes,
            live_objects: live_objects.min(alloc_objects),
            live_bytes: live_bytes.min(alloc_bytes),
        }
    }
}

fn saturating_decrement(counter: &AtomicU64, amount: u64) {
    // fetch_update only fails when the closure returns None, which it never does
    let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        Some(current.saturating_sub(amount))
    });
}

/// Aggregates allocation samples keyed by call-stack signature.
///
/// An aggregator is an owned value: independent sessions use independent
/// instances, and [`Aggregator::reset`] starts a new measurement window.
///
/// The signature capacity is a hard bound: a slot is reserved before a new
/// entry is inserted, under the shard lock that owns the signature.
#[derive(Debug)]
pub struct Aggregator {
    entries: DashMap<CallStackSignature, EntryCounters>,
    max_signatures: usize,
    reserved: AtomicUsize,
    sampling_rate: AtomicU64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIGNATURES)
    }

    /// Aggregator that refuses to track more than `max_signatures` stacks
    pub fn with_capacity(max_signatures: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_signatures,
            reserved: AtomicUsize::new(0),
            sampling_rate: AtomicU64::new(1),
        }
    }

    /// Apply one sample to its signature's counters.
    ///
    /// # Errors
    /// * `RecordError::SamplingDropped` - a new signature would exceed capacity
    pub fn ingest(&self, sample: AllocationSample) -> Result<(), RecordError> {
        match sample.kind {
            SampleKind::Alloc => self.alloc(sample.signature, sample.object_count, sample.byte_size),
            SampleKind::Free => {
                self.free(&sample.signature, sample.object_count, sample.byte_size);
                Ok(())
            }
        }
    }

    /// Count `objects` / `bytes` as allocated (and live) at `signature`
    pub fn alloc(
        &self,
        signature: CallStackSignature,
        objects: u64,
        bytes: u64,
    ) -> Result<(), RecordError> {
        if let Some(counters) = self.entries.get(&signature) {
            counters.on_alloc(objects, bytes);
            return Ok(());
        }

        // re-checked under the shard write lock: another writer may have
        // inserted the signature since the read above
        match self.entries.entry(signature) {
            Entry::Occupied(occupied) => occupied.get().on_alloc(objects, bytes),
            Entry::Vacant(vacant) => {
                if !self.reserve_slot() {
                    return Err(RecordError::SamplingDropped {
                        capacity: self.max_signatures,
                    });
                }
                vacant.insert(EntryCounters::default()).on_alloc(objects, bytes);
            }
        }
        Ok(())
    }

    fn reserve_slot(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.max_signatures).then_some(used + 1)
            })
            .is_ok()
    }

    /// Release live counters for `signature`, clamped at zero.
    ///
    /// Frees for signatures never seen in this window are ignored.
    pub fn free(&self, signature: &CallStackSignature, objects: u64, bytes: u64) {
        if let Some(counters) = self.entries.get(signature) {
            counters.on_free(objects, bytes);
        }
    }

    /// Deep copy of the current state.
    ///
    /// Later ingestion never touches a returned snapshot.
    pub fn snapshot(&self) -> ProfileSnapshot {
        let entries: Vec<AggregateEntry> = self
            .entries
            .iter()
            .map(|item| item.value().copy(item.key().clone()))
            .collect();

        debug!("Snapshot taken: {} signatures", entries.len());

        ProfileSnapshot::new(Utc::now(), self.sampling_rate(), entries)
    }

    /// Drop every entry, starting a fresh measurement window.
    ///
    /// Samples ingested while a reset is running may land in either window.
    pub fn reset(&self) {
        self.entries.clear();
        self.reserved.store(0, Ordering::Release);
        debug!("Aggregator reset");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_signatures(&self) -> usize {
        self.max_signatures
    }

    /// Sampling rate stamped on snapshots
    pub fn sampling_rate(&self) -> u64 {
        self.sampling_rate.load(Ordering::Relaxed)
    }

    pub(crate) fn set_sampling_rate(&self, rate: u64) {
        self.sampling_rate.store(rate, Ordering::Relaxed);
    }
}
