//! Lock-free round coordination state.
//!
//! Provides [`RoundState`]: the aggregate-result flag, one cache-padded
//! completion slot per participant, and per-round outcome counters. All
//! of it is read on the hot path (batch evaluation, completion polling)
//! without touching the queue lock.
//!
//! Ordering contract: a worker publishes its counters and any failure
//! before setting its completion flag (Release); the master observes the
//! flag with Acquire before reading the aggregate or the counters.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use vouch_core::{CheckOutcome, ParticipantId};

/// Per-participant state, padded to avoid false sharing.
///
/// The master polls every worker's `done` flag at round end; without
/// padding, workers flipping adjacent flags would invalidate each
/// other's cache lines while the master spins.
///
/// 128-byte alignment covers both 64-byte (x86) and 128-byte (Apple
/// M-series) cache line sizes.
#[repr(align(128))]
pub(crate) struct ParticipantSlot {
    /// Set once this participant has seen "all submitted" with an empty
    /// queue. Reset by the master when the round is finalized.
    done: AtomicBool,
    /// Set once the participant's thread has left the worker loop. Never
    /// reset; a retired participant counts as done for every later round.
    retired: AtomicBool,
    /// Batches this participant claimed over the queue's lifetime.
    batches: AtomicU64,
}

// Compile-time assertion: ParticipantSlot must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ParticipantSlot>();
};

impl ParticipantSlot {
    fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            retired: AtomicBool::new(false),
            batches: AtomicU64::new(0),
        }
    }
}

/// Outcome counts for one evaluated batch.
///
/// Accumulated locally while a batch runs and folded into the shared
/// counters with one atomic add per field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub evaluated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl Tally {
    /// Count one check's outcome.
    pub fn record(&mut self, outcome: CheckOutcome) {
        if outcome.was_invoked() {
            self.evaluated += 1;
        } else {
            self.skipped += 1;
        }
        match outcome {
            CheckOutcome::Failed => self.failed += 1,
            CheckOutcome::Panicked => self.panicked += 1,
            CheckOutcome::Passed | CheckOutcome::Skipped => {}
        }
    }
}

/// Shared round state: aggregate result, completion flags, counters.
pub(crate) struct RoundState {
    /// Logical AND of every invoked check this round. True at round start.
    all_ok: AtomicBool,
    /// One slot per participant; index 0 is the master.
    slots: Box<[ParticipantSlot]>,
    evaluated: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    batches: AtomicU64,
}

// Compile-time assertion: RoundState must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RoundState>();
};

impl RoundState {
    /// Create state for `participants` participants (master included).
    pub fn new(participants: usize) -> Self {
        Self {
            all_ok: AtomicBool::new(true),
            slots: (0..participants).map(|_| ParticipantSlot::new()).collect(),
            evaluated: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            batches: AtomicU64::new(0),
        }
    }

    /// Number of participant slots.
    pub fn participants(&self) -> usize {
        self.slots.len()
    }

    /// Current aggregate result.
    pub fn aggregate(&self) -> bool {
        self.all_ok.load(Ordering::Acquire)
    }

    /// Fail the round. Permanent until [`reset`](Self::reset).
    pub fn record_failure(&self) {
        self.all_ok.store(false, Ordering::Release);
    }

    /// Fold a finished batch into the round counters.
    pub fn record_batch(&self, id: ParticipantId, tally: &Tally) {
        self.slots[id.index()].batches.fetch_add(1, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.add_tally(tally);
    }

    /// Count checks that were dropped before reaching the queue.
    pub fn record_rejected(&self, count: u64) {
        self.record_failure();
        self.skipped.fetch_add(count, Ordering::Relaxed);
    }

    fn add_tally(&self, tally: &Tally) {
        if tally.evaluated > 0 {
            self.evaluated.fetch_add(tally.evaluated, Ordering::Relaxed);
        }
        if tally.skipped > 0 {
            self.skipped.fetch_add(tally.skipped, Ordering::Relaxed);
        }
        if tally.failed > 0 {
            self.failed.fetch_add(tally.failed, Ordering::Relaxed);
        }
        if tally.panicked > 0 {
            self.panicked.fetch_add(tally.panicked, Ordering::Relaxed);
        }
    }

    /// Mark a participant as finished with the current round.
    ///
    /// Callers hold the queue lock and have observed "all submitted"
    /// with an empty queue.
    pub fn mark_done(&self, id: ParticipantId) {
        self.slots[id.index()].done.store(true, Ordering::Release);
    }

    /// Permanently retire a participant whose thread left the worker loop.
    ///
    /// `failed` also fails the current round, for a participant that died
    /// mid-round. Any failure is published before the retired flag.
    pub fn retire(&self, id: ParticipantId, failed: bool) {
        if failed {
            self.record_failure();
        }
        self.slots[id.index()].retired.store(true, Ordering::Release);
    }

    /// Whether a participant has marked itself done this round.
    #[cfg(test)]
    pub fn is_done(&self, id: ParticipantId) -> bool {
        self.slots[id.index()].done.load(Ordering::Acquire)
    }

    /// Poll every non-master participant's completion flag.
    ///
    /// `seen` caches flags already observed set, so each poll only loads
    /// the flags that were still clear last time. Slot 0 (the master) is
    /// never polled. A retired participant counts as done.
    pub fn workers_done(&self, seen: &mut [bool]) -> bool {
        let mut all = true;
        for (i, slot) in self.slots.iter().enumerate().skip(1) {
            if !seen[i] {
                seen[i] = slot.done.load(Ordering::Acquire)
                    || slot.retired.load(Ordering::Acquire);
                all &= seen[i];
            }
        }
        all
    }

    /// Reset flags for the next round: aggregate back to true, every
    /// completion flag cleared.
    ///
    /// Called by the master with the queue lock held, after every worker
    /// reported done.
    pub fn reset(&self) {
        for slot in self.slots.iter() {
            slot.done.store(false, Ordering::Release);
        }
        self.all_ok.store(true, Ordering::Release);
    }

    /// Read and zero the round counters.
    ///
    /// Returns `(tally, batches)`.
    pub fn take_counts(&self) -> (Tally, u64) {
        let tally = Tally {
            evaluated: self.evaluated.swap(0, Ordering::Relaxed),
            skipped: self.skipped.swap(0, Ordering::Relaxed),
            failed: self.failed.swap(0, Ordering::Relaxed),
            panicked: self.panicked.swap(0, Ordering::Relaxed),
        };
        (tally, self.batches.swap(0, Ordering::Relaxed))
    }

    /// Lifetime batch count for one participant.
    pub fn participant_batches(&self, id: ParticipantId) -> u64 {
        self.slots[id.index()].batches.load(Ordering::Relaxed)
    }
}
