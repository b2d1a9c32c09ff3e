//! Test utilities for Vouch development.
//!
//! Check fixtures with observable side effects (see [`fixtures`]) and a
//! seeded workload generator for reproducible randomized rounds.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    AnyCheck, CallCounter, ConstCheck, CountingCheck, PanickingCheck, RecordingCheck, SleepCheck,
    SpinCheck,
};

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic pass/fail verdicts for a randomized round.
///
/// Each of the `n` verdicts is `false` with probability
/// `fail_per_million / 1_000_000`. The same seed always yields the same
/// sequence.
pub fn seeded_verdicts(seed: u64, n: usize, fail_per_million: u32) -> Vec<bool> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| (rng.next_u64() % 1_000_000) as u32 >= fail_per_million)
        .collect()
}

/// Deterministic work sizes in `[min, max]` for [`SpinCheck`]s.
pub fn seeded_spin_iterations(seed: u64, n: usize, min: u32, max: u32) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let span = u64::from(max.saturating_sub(min)) + 1;
    (0..n)
        .map(|_| min + (rng.next_u64() % span) as u32)
        .collect()
}

/// A round of [`CountingCheck`]s with seeded verdicts.
///
/// Returns the checks and the expected aggregate result.
pub fn seeded_round(
    counter: &CallCounter,
    seed: u64,
    n: usize,
    fail_per_million: u32,
) -> (Vec<CountingCheck>, bool) {
    let verdicts = seeded_verdicts(seed, n, fail_per_million);
    let expected = verdicts.iter().all(|&v| v);
    let checks = verdicts.into_iter().map(|v| counter.check(v)).collect();
    (checks, expected)
}
