//! Sampling allocation recorder.
//!
//! The recorder sits on the allocation path. It decides whether an
//! allocation is sampled, turns sampled ones into [`AllocationSample`]s and
//! hands them to the shared [`Aggregator`]. Recording never fails the
//! caller: samples that cannot be stored are counted and dropped.

pub mod sampler;

use crate::aggregator::{Aggregator, AllocationSample, CallStackSignature};
use crate::utils::config::{DEFAULT_MAX_SIGNATURES, DEFAULT_SAMPLING_RATE};
use log::{debug, trace, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use sampler::{sample_probability, should_sample, SAMPLE_EVERYTHING, SAMPLING_DISABLED};

/// Controls how the recorder samples allocations.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Average number of bytes between samples (0 = off, 1 = every allocation)
    pub sampling_rate: u64,
    /// Maximum distinct signatures the backing aggregator tracks
    pub max_signatures: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            max_signatures: DEFAULT_MAX_SIGNATURES,
        }
    }
}

impl RecorderConfig {
    /// Record every allocation; totals are exact
    #[must_use]
    pub fn exact() -> Self {
        Self::default().with_sampling_rate(SAMPLE_EVERYTHING)
    }

    #[must_use]
    pub fn with_sampling_rate(mut self, rate: u64) -> Self {
        self.sampling_rate = rate;
        self
    }

    #[must_use]
    pub fn with_max_signatures(mut self, max_signatures: usize) -> Self {
        self.max_signatures = max_signatures;
        self
    }
}

/// Counters describing what the recorder did with incoming allocations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderStats {
    /// Samples handed to the aggregator
    pub recorded: u64,
    /// Allocations not selected by sampling
    pub skipped: u64,
    /// Sampled allocations the aggregator could not store
    pub dropped: u64,
}

/// Entry point for recording allocation events.
///
/// Safe to share across threads; every method takes `&self`.
#[derive(Debug)]
pub struct Recorder {
    aggregator: Arc<Aggregator>,
    sampling_rate: AtomicU64,
    recorded: AtomicU64,
    skipped: AtomicU64,
    dropped: AtomicU64,
}

impl Recorder {
    /// Recorder feeding a fresh aggregator built from `config`
    pub fn new(config: RecorderConfig) -> Self {
        let aggregator = Arc::new(Aggregator::with_capacity(config.max_signatures));
        Self::with_aggregator(aggregator, config.sampling_rate)
    }

    /// Recorder feeding an existing aggregator
    pub fn with_aggregator(aggregator: Arc<Aggregator>, sampling_rate: u64) -> Self {
        aggregator.set_sampling_rate(sampling_rate);
        Self {
            aggregator,
            sampling_rate: AtomicU64::new(sampling_rate),
            recorded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Record an allocation at `signature`.
    ///
    /// Returns whether the allocation was sampled. Callers tracking liveness
    /// should report the matching free through [`Recorder::record_free`] only
    /// when this returned true.
    pub fn record(&self, signature: CallStackSignature, object_count: u64, byte_size: u64) -> bool {
        let rate = self.sampling_rate();
        if !should_sample(&mut rand::thread_rng(), byte_size, rate) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let sample = AllocationSample::alloc(signature, object_count, byte_size);
        match self.aggregator.ingest(sample) {
            Ok(()) => {
                self.recorded.fetch_add(1, Ordering::Relaxed);
                trace!("Recorded {} bytes / {} objects", byte_size, object_count);
                true
            }
            Err(err) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!("{}", err);
                if dropped.is_power_of_two() {
                    debug!("{} samples dropped so far: {}", dropped, err);
                }
                false
            }
        }
    }

    /// Record that a previously sampled allocation was freed
    pub fn record_free(&self, signature: CallStackSignature, object_count: u64, byte_size: u64) {
        let sample = AllocationSample::free(signature, object_count, byte_size);
        // frees never create entries, so they cannot hit the capacity limit
        let _ = self.aggregator.ingest(sample);
    }

    /// Change the sampling rate (0 = off, 1 = every allocation)
    pub fn set_sampling_rate(&self, rate: u64) {
        let previous = self.sampling_rate.swap(rate, Ordering::Relaxed);
        if previous != rate && !self.aggregator.is_empty() {
            warn!(
                "Sampling rate changed from {} to {} mid-session; reset the aggregator for comparable snapshots",
                previous, rate
            );
        }
        self.aggregator.set_sampling_rate(rate);
        debug!("Sampling rate set to {}", rate);
    }

    pub fn sampling_rate(&self) -> u64 {
        self.sampling_rate.load(Ordering::Relaxed)
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn stats(&self) -> RecorderStats {
        RecorderStats {
            recorded: self.recorded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Reset the aggregator and the recorder counters
    pub fn reset(&self) {
        self.aggregator.reset();
        self.recorded.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str) -> CallStackSignature {
        CallStackSignature::from_functions(["main", name])
    }

    #[test]
    fn test_exact_recording() {
        let recorder = Recorder::new(RecorderConfig::exact());
        assert!(recorder.record(sig("a"), 1, 10));
        assert!(recorder.record(sig("a"), 1, 20));

        let snapshot = recorder.aggregator().snapshot();
        assert_eq!(snapshot.sampling_rate(), 1);
        assert_eq!(snapshot.entries()[0].alloc_bytes, 30);
        assert_eq!(recorder.stats().recorded, 2);
    }

    #[test]
    fn test_disabled_records_nothing() {
        let recorder = Recorder::new(RecorderConfig::default().with_sampling_rate(SAMPLING_DISABLED));
        assert!(!recorder.record(sig("a"), 1, 1 << 20));
        assert!(recorder.aggregator().is_empty());
        assert_eq!(recorder.stats().skipped, 1);
    }

    #[test]
    fn test_dropped_samples_do_not_fail_caller() {
        let recorder = Recorder::new(RecorderConfig::exact().with_max_signatures(1));
        assert!(recorder.record(sig("a"), 1, 8));
        assert!(!recorder.record(sig("b"), 1, 8));

        let stats = recorder.stats();
        assert_eq!(stats.recorded, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_record_free_updates_live() {
        let recorder = Recorder::new(RecorderConfig::exact());
        recorder.record(sig("a"), 2, 64);
        recorder.record_free(sig("a"), 1, 32);

        let snapshot = recorder.aggregator().snapshot();
        let entry = &snapshot.entries()[0];
        assert_eq!(entry.live_objects, 1);
        assert_eq!(entry.live_bytes, 32);
        assert_eq!(entry.alloc_bytes, 64);
    }

    #[test]
    fn test_set_sampling_rate_stamps_snapshots() {
        let recorder = Recorder::new(RecorderConfig::exact());
        recorder.set_sampling_rate(4096);
        assert_eq!(recorder.sampling_rate(), 4096);
        assert_eq!(recorder.aggregator().snapshot().sampling_rate(), 4096);
    }

    #[test]
    fn test_reset() {
        let recorder = Recorder::new(RecorderConfig::exact());
        recorder.record(sig("a"), 1, 8);
        recorder.reset();

        assert!(recorder.aggregator().is_empty());
        assert_eq!(recorder.stats(), RecorderStats::default());
    }
}
