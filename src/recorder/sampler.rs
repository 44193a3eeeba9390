//! Byte-weighted sampling decision.
//!
//! With rate `r`, each allocated byte is sampled independently with
//! probability `1/r`, so an allocation of `s` bytes is recorded with
//! probability `1 - exp(-s / r)`. On average one sample is taken per `r`
//! bytes allocated. [`crate::snapshot::ProfileSnapshot::scaled`] inverts this.

use rand::Rng;

/// Sampling rate 0 turns recording off
pub const SAMPLING_DISABLED: u64 = 0;

/// Sampling rate 1 records every allocation
pub const SAMPLE_EVERYTHING: u64 = 1;

/// Probability that an allocation of `byte_size` bytes is recorded
pub fn sample_probability(byte_size: u64, rate: u64) -> f64 {
    match rate {
        SAMPLING_DISABLED => 0.0,
        SAMPLE_EVERYTHING => 1.0,
        _ => 1.0 - (-(byte_size as f64) / rate as f64).exp(),
    }
}

/// Decide whether to record an allocation of `byte_size` bytes
pub fn should_sample<R: Rng>(rng: &mut R, byte_size: u64, rate: u64) -> bool {
    match rate {
        SAMPLING_DISABLED => false,
        SAMPLE_EVERYTHING => true,
        _ => {
            let p = sample_probability(byte_size, rate);
            p > 0.0 && rng.gen::<f64>() < p
        }
    }
}
