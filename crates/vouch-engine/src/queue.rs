//! User-facing [`CheckQueue`]: round collection, master participation,
//! completion, and teardown.
//!
//! # Architecture
//!
//! ```text
//! Master (owner of CheckQueue)        Workers (participants 1..K)
//!     |                                   |
//!     |--add()                            |
//!     |   stage locally                   |
//!     |   [>= flush_threshold]            |
//!     |   lock; publish to arena; unlock  |
//!     |   notify_all -------------------->| lock; claim batch; unlock
//!     |                                   | evaluate (skip once failed)
//!     |--wait()                           |
//!     |   publish remainder               |
//!     |   lock; all_submitted; unlock     |
//!     |   notify_all -------------------->| queue empty + all_submitted
//!     |   claim + evaluate until empty    |   mark done; park on condvar
//!     |   poll done flags (spin/yield)    |
//!     |   lock; finish round; reset; unlock
//!     |<- aggregate result                |
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};
use vouch_core::{Check, ParticipantId};

use crate::config::{ConfigError, QueueConfig};
use crate::metrics::RoundMetrics;
use crate::pending::Batch;
use crate::worker::{evaluate_batch, Shared, Worker};

/// A parallel batch-verification queue.
///
/// The owner is the round's master: it submits checks with
/// [`add`](Self::add) and collects the aggregate with
/// [`wait`](Self::wait), evaluating checks itself while it waits.
/// Both take `&mut self`, so only one round can be in flight.
///
/// ```
/// use vouch_core::Check;
/// use vouch_engine::{CheckQueue, QueueConfig};
///
/// struct Even(u64);
///
/// impl Check for Even {
///     fn verify(self) -> bool {
///         self.0 % 2 == 0
///     }
/// }
///
/// let mut queue = CheckQueue::new(QueueConfig::with_participants(4)).unwrap();
/// queue.add((0..1000).map(|i| Even(i * 2)));
/// assert!(queue.wait());
///
/// queue.add([Even(2), Even(3)]);
/// assert!(!queue.wait());
/// ```
///
/// Dropping the queue stops its worker threads; checks that were
/// submitted but not yet claimed are dropped without evaluation.
pub struct CheckQueue<T: Check> {
    shared: Arc<Shared<T>>,
    config: QueueConfig,
    participants: usize,
    /// Checks added since the last publish. Master-private.
    staged: Vec<T>,
    /// Owned worker threads; empty for detached-worker queues.
    workers: Vec<JoinHandle<()>>,
    /// A non-empty `add()` happened since the last `wait()`.
    round_open: bool,
    round_started: Option<Instant>,
    submitted: u64,
    last_round: RoundMetrics,
    rounds_completed: u64,
}

impl<T: Check> CheckQueue<T> {
    /// Create a queue and spawn `participants - 1` worker threads.
    ///
    /// Threads are named `{thread_name_prefix}-{n}` for `n` in
    /// `1..participants`.
    pub fn new(config: QueueConfig) -> Result<Self, ConfigError> {
        let (mut queue, workers) = Self::with_detached_workers(config)?;
        for worker in workers {
            let name = format!("{}-{}", queue.config.thread_name_prefix, worker.id());
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker.run())
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("{name}: {e}"),
                })?;
            // On error, dropping `queue` stops and joins the threads
            // spawned so far.
            queue.workers.push(handle);
        }
        debug!(
            participants = queue.participants,
            max_batch_size = queue.config.max_batch_size,
            "check queue started"
        );
        Ok(queue)
    }

    /// Create a queue without spawning threads.
    ///
    /// Returns the queue and one [`Worker`] per non-master participant.
    /// The caller must run each worker (see [`Worker::run`]) on its own
    /// thread; `wait()` does not return until every worker has taken part
    /// in the round. Workers return once the queue is dropped.
    pub fn with_detached_workers(config: QueueConfig) -> Result<(Self, Vec<Worker<T>>), ConfigError> {
        config.validate()?;
        let participants = config.resolved_participants();
        let shared = Arc::new(Shared::new(participants, config.max_batch_size));

        let workers = (1..participants)
            .map(|i| Worker::new(Arc::clone(&shared), ParticipantId(i as u32)))
            .collect();

        let queue = Self {
            shared,
            staged: Vec::with_capacity(config.flush_threshold),
            participants,
            workers: Vec::with_capacity(participants.saturating_sub(1)),
            round_open: false,
            round_started: None,
            submitted: 0,
            last_round: RoundMetrics::default(),
            rounds_completed: 0,
            config,
        };
        Ok((queue, workers))
    }

    /// Submit checks to the current round.
    ///
    /// Opens a round if none is open. An empty input is a no-op. Checks
    /// are staged locally and published to the workers in chunks of
    /// `flush_threshold`; anything still staged is published by `wait()`.
    pub fn add<I>(&mut self, checks: I)
    where
        I: IntoIterator<Item = T>,
    {
        let before = self.staged.len();
        self.staged.extend(checks);
        let added = self.staged.len() - before;
        if added == 0 {
            return;
        }
        if !self.round_open {
            self.round_open = true;
            self.round_started = Some(Instant::now());
            trace!(rounds_completed = self.rounds_completed, "round opened");
        }
        self.submitted += added as u64;
        if self.staged.len() >= self.config.flush_threshold {
            self.flush();
        }
    }

    /// Finish the current round and return its aggregate result.
    ///
    /// The calling thread evaluates checks alongside the workers until the
    /// queue is drained, then waits for every worker to finish its last
    /// batch. Returns `true` iff no invoked check failed or panicked; an
    /// empty round returns `true`. On return the queue is idle and ready
    /// for the next round.
    pub fn wait(&mut self) -> bool {
        let wait_start = Instant::now();
        if !self.round_open {
            return self.finish_empty_round(wait_start);
        }

        self.flush();
        self.shared.lock().mark_all_submitted();
        self.shared.work_available.notify_all();

        let mut master_batches = 0;
        let mut batch: Batch<T> = Batch::new();
        loop {
            let drained = {
                let mut queue = self.shared.lock();
                if queue.is_empty() {
                    true
                } else {
                    queue.claim(self.shared.max_batch_size, &mut batch);
                    false
                }
            };
            if drained {
                break;
            }
            if !batch.is_empty() {
                master_batches += 1;
                evaluate_batch(&self.shared.round, ParticipantId::MASTER, &mut batch);
            }
        }

        let completion_polls = self.await_workers();
        let result = self.shared.round.aggregate();

        let (round, dropped) = {
            let mut queue = self.shared.lock();
            let round = queue.round();
            let dropped = queue.finish_round();
            self.shared.round.reset();
            (round, dropped)
        };
        if dropped > 0 {
            warn!(round = round.0, dropped, "round finished with unclaimed checks");
        }

        let (tally, batches) = self.shared.round.take_counts();
        let now = Instant::now();
        let metrics = RoundMetrics {
            round,
            result,
            submitted: self.submitted,
            evaluated: tally.evaluated,
            skipped: tally.skipped,
            failed: tally.failed,
            panicked: tally.panicked,
            batches,
            master_batches,
            completion_polls,
            total_us: micros_since(self.round_started.unwrap_or(wait_start), now),
            wait_us: micros_since(wait_start, now),
        };
        debug!(
            round = round.0,
            result,
            submitted = metrics.submitted,
            evaluated = metrics.evaluated,
            skipped = metrics.skipped,
            batches,
            wait_us = metrics.wait_us,
            "round complete"
        );
        self.close_round(metrics);
        result
    }

    /// Whether no round is open and nothing is queued.
    pub fn is_idle(&self) -> bool {
        !self.round_open && self.staged.is_empty() && self.shared.lock().is_empty()
    }

    /// Total participants, including the master.
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// The configuration this queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Metrics from the most recently completed round.
    pub fn last_round(&self) -> &RoundMetrics {
        &self.last_round
    }

    /// Number of `wait()` calls that have returned.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Batches claimed by one participant over the queue's lifetime.
    ///
    /// Returns `None` for an id outside `0..participants`.
    pub fn participant_batches(&self, id: ParticipantId) -> Option<u64> {
        (id.index() < self.participants).then(|| self.shared.round.participant_batches(id))
    }

    /// Publish staged checks to the shared queue and wake workers.
    fn flush(&mut self) {
        if self.staged.is_empty() {
            return;
        }
        let published = self.shared.lock().publish(&mut self.staged);
        if published.rejected > 0 {
            self.shared.round.record_rejected(published.rejected as u64);
        }
        trace!(accepted = published.accepted, rejected = published.rejected, "checks published");
        if published.accepted > 0 {
            self.shared.work_available.notify_all();
        }
    }

    /// Poll worker completion flags until every worker is done.
    ///
    /// Returns the number of polls.
    fn await_workers(&self) -> u64 {
        let mut seen: SmallVec<[bool; 16]> =
            SmallVec::from_elem(false, self.shared.round.participants());
        let spin = u64::from(self.config.spin_before_yield.max(1));
        let mut polls = 0u64;
        while !self.shared.round.workers_done(&mut seen) {
            polls += 1;
            if polls % spin == 0 {
                thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }
        polls
    }

    /// Complete a round that never received a check.
    ///
    /// Workers were never given anything to do this round, so there is
    /// nothing to wait for.
    fn finish_empty_round(&mut self, wait_start: Instant) -> bool {
        let round = {
            let mut queue = self.shared.lock();
            let round = queue.round();
            queue.finish_round();
            round
        };
        let wait_us = micros_since(wait_start, Instant::now());
        trace!(round = round.0, "empty round");
        self.close_round(RoundMetrics {
            round,
            result: true,
            total_us: wait_us,
            wait_us,
            ..RoundMetrics::default()
        });
        true
    }

    fn close_round(&mut self, metrics: RoundMetrics) {
        self.last_round = metrics;
        self.rounds_completed += 1;
        self.round_open = false;
        self.round_started = None;
        self.submitted = 0;
    }
}

impl<T: Check> Drop for CheckQueue<T> {
    fn drop(&mut self) {
        self.staged.clear();
        let unclaimed = {
            let mut queue = self.shared.lock();
            queue.begin_shutdown();
            queue.len()
        };
        if self.round_open {
            debug!(
                submitted = self.submitted,
                unclaimed, "check queue dropped with an open round; unclaimed checks are discarded"
            );
        }
        self.shared.work_available.notify_all();

        let mut joined = 0usize;
        for handle in self.workers.drain(..) {
            match handle.join() {
                Ok(()) => joined += 1,
                Err(_) => warn!("check worker thread panicked"),
            }
        }
        debug!(workers_joined = joined, "check queue stopped");
    }
}

impl<T: Check> std::fmt::Debug for CheckQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckQueue")
            .field("participants", &self.participants)
            .field("round_open", &self.round_open)
            .field("staged", &self.staged.len())
            .field("rounds_completed", &self.rounds_completed)
            .finish_non_exhaustive()
    }
}

fn micros_since(start: Instant, end: Instant) -> u64 {
    u64::try_from(end.saturating_duration_since(start).as_micros()).unwrap_or(u64::MAX)
}
