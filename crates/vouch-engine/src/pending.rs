//! The shared work queue: arena plus pending handles, guarded by one lock.
//!
//! [`PendingQueue`] is only ever touched through the engine's mutex.
//! Publishing moves staged checks into the arena and queues their
//! handles; claiming pops handles and moves the checks back out, so a
//! claimed check is owned by exactly one participant before the lock is
//! released.

use std::collections::VecDeque;

use smallvec::SmallVec;
use tracing::error;
use vouch_arena::{CheckArena, CheckHandle};
use vouch_core::RoundId;

/// Checks claimed by one participant in one go.
pub(crate) type Batch<T> = SmallVec<[T; 16]>;

/// Result of publishing staged checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Published {
    /// Checks moved into the arena and queued.
    pub accepted: usize,
    /// Checks the arena refused; dropped unevaluated.
    pub rejected: usize,
}

/// How many checks to claim when `pending` are queued.
///
/// Half the queue, clamped to `[1, max_batch]`: large batches while the
/// queue is deep, single checks near the tail so the last work spreads
/// across participants.
pub(crate) fn batch_size(pending: usize, max_batch: usize) -> usize {
    (pending / 2).max(1).min(max_batch.max(1))
}

/// Lock-protected queue state.
pub(crate) struct PendingQueue<T> {
    arena: CheckArena<T>,
    pending: VecDeque<CheckHandle>,
    /// Set by the master on entering `wait()`; cleared when the round is
    /// finalized.
    all_submitted: bool,
    /// Set once on queue teardown. Workers exit on seeing it.
    shutdown: bool,
    round: RoundId,
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self {
            arena: CheckArena::new(),
            pending: VecDeque::new(),
            all_submitted: false,
            shutdown: false,
            round: RoundId::default(),
        }
    }

    /// Move every staged check into the arena and queue its handle.
    ///
    /// `staged` is left empty. Checks the arena cannot hold are dropped
    /// and counted in [`Published::rejected`].
    pub fn publish(&mut self, staged: &mut Vec<T>) -> Published {
        let mut published = Published::default();
        self.pending.reserve(staged.len());
        for check in staged.drain(..) {
            match self.arena.insert(check) {
                Ok(handle) => {
                    self.pending.push_back(handle);
                    published.accepted += 1;
                }
                Err(e) => {
                    if published.rejected == 0 {
                        error!(round = self.round.0, error = %e, "arena rejected check");
                    }
                    published.rejected += 1;
                }
            }
        }
        published
    }

    /// Claim up to [`batch_size`] checks into `out`, oldest first.
    ///
    /// Returns the number of handles popped. A handle that no longer
    /// resolves is logged and skipped, so the count of checks pushed to
    /// `out` can be lower.
    pub fn claim(&mut self, max_batch: usize, out: &mut Batch<T>) -> usize {
        let n = batch_size(self.pending.len(), max_batch).min(self.pending.len());
        for _ in 0..n {
            let Some(handle) = self.pending.pop_front() else {
                break;
            };
            match self.arena.take(handle) {
                Ok(check) => out.push(check),
                Err(e) => error!(round = self.round.0, %handle, error = %e, "unresolvable check handle"),
            }
        }
        n
    }

    /// Number of queued, unclaimed checks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn mark_all_submitted(&mut self) {
        self.all_submitted = true;
    }

    pub fn all_submitted(&self) -> bool {
        self.all_submitted
    }

    /// Close the current round and advance to the next.
    ///
    /// Drops anything still queued and invalidates every handle issued
    /// this round. Returns the number of checks dropped.
    pub fn finish_round(&mut self) -> usize {
        self.pending.clear();
        let dropped = self.arena.clear();
        self.all_submitted = false;
        self.round = self.round.next();
        dropped
    }

    pub fn begin_shutdown(&mut self) {
        self.shutdown = true;
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// The round currently being collected or evaluated.
    pub fn round(&self) -> RoundId {
        self.round
    }
}
