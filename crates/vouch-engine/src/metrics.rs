//! Per-round metrics for the check queue.
//!
//! [`RoundMetrics`] captures counts and timing for a single round,
//! enabling telemetry and tuning of batch size and participant count.

use vouch_core::RoundId;

/// Counts and timing collected during a single round.
///
/// The queue populates these after each `wait()` call; read them from
/// [`CheckQueue::last_round`](crate::CheckQueue::last_round).
/// `evaluated + skipped == submitted` holds for every completed round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundMetrics {
    /// The round these metrics describe.
    pub round: RoundId,
    /// Aggregate result returned by `wait()`.
    pub result: bool,
    /// Checks submitted via `add()`.
    pub submitted: u64,
    /// Checks actually invoked (including failed and panicked ones).
    pub evaluated: u64,
    /// Checks dropped without invocation after the round had failed.
    pub skipped: u64,
    /// Invoked checks that returned `false`.
    pub failed: u64,
    /// Invoked checks that panicked.
    pub panicked: u64,
    /// Batches claimed across all participants.
    pub batches: u64,
    /// Batches claimed by the master inside `wait()`.
    pub master_batches: u64,
    /// Times the master polled completion flags before the round ended.
    pub completion_polls: u64,
    /// Wall-clock time from the round's first `add()` (or `wait()` for an
    /// empty round) until `wait()` returned, in microseconds.
    pub total_us: u64,
    /// Time spent inside `wait()`, in microseconds.
    pub wait_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = RoundMetrics::default();
        assert_eq!(m.round, RoundId(0));
        assert!(!m.result);
        assert_eq!(m.submitted, 0);
        assert_eq!(m.evaluated, 0);
        assert_eq!(m.skipped, 0);
        assert_eq!(m.failed, 0);
        assert_eq!(m.panicked, 0);
        assert_eq!(m.batches, 0);
        assert_eq!(m.master_batches, 0);
        assert_eq!(m.completion_polls, 0);
        assert_eq!(m.total_us, 0);
        assert_eq!(m.wait_us, 0);
    }
}
