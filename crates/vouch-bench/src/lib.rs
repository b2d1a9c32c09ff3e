//! Workload profiles for benchmarking the Vouch verification engine.
//!
//! Provides pre-built [`WorkloadProfile`]s for benchmarks and examples:
//!
//! - [`reference_profile`]: 4,000 medium checks, roughly a full block of
//!   signature checks
//! - [`stress_profile`]: 40,000 checks with widely varying cost
//! - [`build_round`]: deterministic round generation from a profile and seed
//! - [`build_early_failure_round`]: the same round led by a failing check

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use vouch_engine::QueueConfig;
use vouch_test_utils::{seeded_spin_iterations, seeded_verdicts, SpinCheck};

/// Shape of one benchmark round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkloadProfile {
    /// Checks per round.
    pub checks: usize,
    /// Minimum spin iterations per check.
    pub min_cost: u32,
    /// Maximum spin iterations per check.
    pub max_cost: u32,
    /// Failing checks per million.
    pub fail_per_million: u32,
}

/// Reference profile: 4,000 checks of 1,000-3,000 spin iterations, all
/// passing.
pub fn reference_profile() -> WorkloadProfile {
    WorkloadProfile {
        checks: 4_000,
        min_cost: 1_000,
        max_cost: 3_000,
        fail_per_million: 0,
    }
}

/// Stress profile: 40,000 checks of 10-20,000 spin iterations, all
/// passing.
pub fn stress_profile() -> WorkloadProfile {
    WorkloadProfile {
        checks: 40_000,
        min_cost: 10,
        max_cost: 20_000,
        fail_per_million: 0,
    }
}

/// Generate a deterministic round of [`SpinCheck`]s for `profile`.
///
/// Returns the checks and the aggregate result a correct engine reports.
pub fn build_round(profile: &WorkloadProfile, seed: u64) -> (Vec<SpinCheck>, bool) {
    let costs = seeded_spin_iterations(seed, profile.checks, profile.min_cost, profile.max_cost);
    let verdicts = seeded_verdicts(seed ^ 0x9e37_79b9_7f4a_7c15, profile.checks, profile.fail_per_million);
    let expected = verdicts.iter().all(|&v| v);
    let checks = costs
        .into_iter()
        .zip(verdicts)
        .map(|(cost, verdict)| SpinCheck::new(cost, verdict))
        .collect();
    (checks, expected)
}

/// [`build_round`] with one cheap failing check queued ahead of the rest.
///
/// The queue hands checks out oldest first, so the failure is seen early
/// and most of the round is skipped.
pub fn build_early_failure_round(profile: &WorkloadProfile, seed: u64) -> Vec<SpinCheck> {
    let (mut checks, _) = build_round(profile, seed);
    checks.insert(0, SpinCheck::new(1, false));
    checks
}

/// Queue config for `participants` with benchmark defaults.
pub fn bench_config(participants: usize) -> QueueConfig {
    QueueConfig {
        thread_name_prefix: "vouch-bench".to_string(),
        ..QueueConfig::with_participants(participants)
    }
}

/// Participant counts worth comparing on this machine: 1, 2, 4, ...
/// up to the available parallelism (at most 16).
pub fn participant_sweep() -> Vec<usize> {
    let max = QueueConfig::default().resolved_participants();
    let mut counts: Vec<usize> = std::iter::successors(Some(1usize), |n| Some(n * 2))
        .take_while(|&n| n < max)
        .collect();
    counts.push(max);
    counts
}
