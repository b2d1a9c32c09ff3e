//! Participant loop and batch evaluation.
//!
//! Every participant runs the same cycle: claim a batch under the queue
//! lock, release the lock, evaluate the batch, repeat. Non-master
//! workers park on the condition variable when the queue is empty and
//! mark themselves done once the master has declared the round fully
//! submitted. The master's side of the cycle lives in
//! [`CheckQueue::wait`](crate::CheckQueue::wait).

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};
use vouch_core::{Check, CheckOutcome, ParticipantId};

use crate::pending::{Batch, PendingQueue};
use crate::round::{RoundState, Tally};

/// State shared by the master and every worker.
pub(crate) struct Shared<T> {
    pub queue: Mutex<PendingQueue<T>>,
    /// Signalled when checks are published, when a round is declared
    /// fully submitted, and on shutdown.
    pub work_available: Condvar,
    pub round: RoundState,
    pub max_batch_size: usize,
}

impl<T> Shared<T> {
    pub fn new(participants: usize, max_batch_size: usize) -> Self {
        Self {
            queue: Mutex::new(PendingQueue::new()),
            work_available: Condvar::new(),
            round: RoundState::new(participants),
            max_batch_size,
        }
    }

    /// Lock the queue.
    ///
    /// Checks never run under this lock, so poisoning can only come from
    /// a bug in the queue itself; the state is still consistent and is
    /// recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, PendingQueue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A worker not yet bound to a thread.
///
/// Returned by [`CheckQueue::with_detached_workers`](crate::CheckQueue::with_detached_workers)
/// for callers that manage their own threads. Each worker must be run on
/// its own thread for rounds to complete.
pub struct Worker<T> {
    shared: Arc<Shared<T>>,
    id: ParticipantId,
}

// Compile-time assertion: Worker must be Send so it can move to a thread.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<Worker<fn() -> bool>>();
};

impl<T: Check> Worker<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>, id: ParticipantId) -> Self {
        Self { shared, id }
    }

    /// This worker's participant id (never the master's).
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Run the worker loop on the current thread.
    ///
    /// Returns once the owning queue has been dropped.
    pub fn run(self) {
        worker_loop(&self.shared, self.id);
    }
}

impl<T> std::fmt::Debug for Worker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").field("id", &self.id).finish()
    }
}

/// Retires a participant when its thread leaves the worker loop.
///
/// On a normal exit this only marks the slot retired. If the thread is
/// unwinding, the current round is failed as well, so the master stops
/// waiting on a worker that will never report done.
struct RetireOnExit<'a> {
    round: &'a RoundState,
    id: ParticipantId,
}

impl Drop for RetireOnExit<'_> {
    fn drop(&mut self) {
        let panicking = std::thread::panicking();
        if panicking {
            error!(participant = self.id.0, "check worker died; failing the round");
        }
        self.round.retire(self.id, panicking);
    }
}

/// Main loop for a non-master participant.
fn worker_loop<T: Check>(shared: &Shared<T>, id: ParticipantId) {
    debug!(participant = id.0, "check worker started");
    let _retire = RetireOnExit {
        round: &shared.round,
        id,
    };
    let mut batch: Batch<T> = Batch::new();
    loop {
        {
            let mut queue = shared.lock();
            loop {
                if queue.is_shutdown() {
                    drop(queue);
                    debug!(participant = id.0, "check worker exiting");
                    return;
                }
                if !queue.is_empty() {
                    queue.claim(shared.max_batch_size, &mut batch);
                    if batch.is_empty() {
                        continue;
                    }
                    break;
                }
                if queue.all_submitted() {
                    // Under the lock: the master resets this flag under
                    // the same lock, so it can never be set for a round
                    // that has already been finalized.
                    shared.round.mark_done(id);
                }
                queue = shared
                    .work_available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        evaluate_batch(&shared.round, id, &mut batch);
    }
}

/// Evaluate a claimed batch, draining it.
///
/// The aggregate is sampled once up front; once this batch sees a failure
/// (or started after one) the remaining checks are dropped unevaluated.
/// A failure is published to the aggregate before the batch's counters.
pub(crate) fn evaluate_batch<T: Check>(round: &RoundState, id: ParticipantId, batch: &mut Batch<T>) {
    let mut ok = round.aggregate();
    let mut tally = Tally::default();
    for check in batch.drain(..) {
        let outcome = if ok {
            run_guarded(check, id)
        } else {
            discard_guarded(check, id);
            CheckOutcome::Skipped
        };
        tally.record(outcome);
        if outcome.fails_round() {
            ok = false;
        }
    }
    if !ok {
        round.record_failure();
    }
    round.record_batch(id, &tally);
}

/// Invoke one check, turning a panic into a failure.
fn run_guarded<T: Check>(check: T, id: ParticipantId) -> CheckOutcome {
    match panic::catch_unwind(AssertUnwindSafe(move || check.verify())) {
        Ok(verdict) => CheckOutcome::from_verdict(verdict),
        Err(payload) => {
            warn!(
                participant = id.0,
                master = id.is_master(),
                reason = panic_message(payload.as_ref()),
                "check panicked; counting as failure"
            );
            CheckOutcome::Panicked
        }
    }
}

/// Drop a skipped check. A panic from its destructor is logged and
/// contained; the round has already failed by the time checks are skipped.
fn discard_guarded<T>(check: T, id: ParticipantId) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || drop(check))) {
        warn!(
            participant = id.0,
            master = id.is_master(),
            reason = panic_message(payload.as_ref()),
            "skipped check panicked on drop"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(verdict: bool, calls: &Arc<AtomicUsize>) -> impl FnOnce() -> bool + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::Relaxed);
            verdict
        }
    }

    #[test]
    fn all_passing_batch() {
        let round = RoundState::new(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut batch: Batch<_> = (0..5).map(|_| counting(true, &calls)).collect();
        evaluate_batch(&round, ParticipantId::MASTER, &mut batch);

        assert!(batch.is_empty());
        assert!(round.aggregate());
        assert_eq!(calls.load(Ordering::Relaxed), 5);
        let (tally, batches) = round.take_counts();
        assert_eq!(tally.evaluated, 5);
        assert_eq!(batches, 1);
    }

    #[test]
    fn failure_skips_rest_of_batch() {
        let round = RoundState::new(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut batch: Batch<_> = [true, false, true, true]
            .into_iter()
            .map(|v| counting(v, &calls))
            .collect();
        evaluate_batch(&round, ParticipantId::MASTER, &mut batch);

        assert!(!round.aggregate());
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        let (tally, _) = round.take_counts();
        assert_eq!(tally.evaluated, 2);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.skipped, 2);
    }

    #[test]
    fn failed_round_skips_whole_batch() {
        let round = RoundState::new(1);
        round.record_failure();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut batch: Batch<_> = (0..3).map(|_| counting(true, &calls)).collect();
        evaluate_batch(&round, ParticipantId::MASTER, &mut batch);

        assert_eq!(calls.load(Ordering::Relaxed), 0);
        let (tally, _) = round.take_counts();
        assert_eq!(tally.skipped, 3);
    }

    #[test]
    fn panic_counts_as_failure() {
        let round = RoundState::new(1);
        let mut batch: Batch<Box<dyn FnOnce() -> bool + Send>> = Batch::new();
        batch.push(Box::new(|| panic!("bad signature encoding")));
        batch.push(Box::new(|| true));
        evaluate_batch(&round, ParticipantId::MASTER, &mut batch);

        assert!(!round.aggregate());
        let (tally, _) = round.take_counts();
        assert_eq!(tally.panicked, 1);
        assert_eq!(tally.evaluated, 1);
        assert_eq!(tally.skipped, 1);
    }

    struct PanicsOnDrop;

    impl Check for PanicsOnDrop {
        fn verify(self) -> bool {
            std::mem::forget(self);
            true
        }
    }

    impl Drop for PanicsOnDrop {
        fn drop(&mut self) {
            panic!("destructor failed");
        }
    }

    #[test]
    fn skipped_check_drop_panic_is_contained() {
        let round = RoundState::new(1);
        round.record_failure();
        let mut batch: Batch<PanicsOnDrop> = (0..4).map(|_| PanicsOnDrop).collect();
        evaluate_batch(&round, ParticipantId(1), &mut batch);

        assert!(batch.is_empty());
        let (tally, batches) = round.take_counts();
        assert_eq!(tally.skipped, 4);
        assert_eq!(tally.evaluated, 0);
        assert_eq!(batches, 1);
    }

    #[test]
    fn dying_thread_retires_and_fails_round() {
        let shared: Arc<Shared<fn() -> bool>> = Arc::new(Shared::new(2, 16));
        let inner = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let _retire = RetireOnExit {
                round: &inner.round,
                id: ParticipantId(1),
            };
            panic!("worker bug");
        });
        assert!(handle.join().is_err());

        let mut seen = vec![false; 2];
        assert!(shared.round.workers_done(&mut seen));
        assert!(!shared.round.aggregate());
    }

    #[test]
    fn panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn worker_exits_on_shutdown() {
        let shared: Arc<Shared<fn() -> bool>> = Arc::new(Shared::new(2, 16));
        let worker = Worker::new(Arc::clone(&shared), ParticipantId(1));
        let handle = std::thread::spawn(move || worker.run());

        shared.lock().begin_shutdown();
        shared.work_available.notify_all();
        handle.join().unwrap();

        let mut seen = vec![false; 2];
        assert!(shared.round.workers_done(&mut seen));
        assert!(shared.round.aggregate());
    }

    #[test]
    fn worker_marks_done_after_all_submitted() {
        let shared: Arc<Shared<Box<dyn FnOnce() -> bool + Send>>> = Arc::new(Shared::new(2, 4));
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let mut staged: Vec<Box<dyn FnOnce() -> bool + Send>> = (0..20)
                .map(|_| Box::new(counting(true, &calls)) as Box<dyn FnOnce() -> bool + Send>)
                .collect();
            let mut q = shared.lock();
            q.publish(&mut staged);
            q.mark_all_submitted();
        }
        let worker = Worker::new(Arc::clone(&shared), ParticipantId(1));
        let handle = std::thread::spawn(move || worker.run());
        shared.work_available.notify_all();

        let mut seen = vec![false; 2];
        while !shared.round.workers_done(&mut seen) {
            std::thread::yield_now();
        }
        assert_eq!(calls.load(Ordering::Relaxed), 20);
        assert!(shared.round.aggregate());

        shared.lock().begin_shutdown();
        shared.work_available.notify_all();
        handle.join().unwrap();
    }
}
