//! Scoped round controller.

use tracing::warn;
use vouch_core::Check;

use crate::queue::CheckQueue;

/// Guard that finishes a round when it goes out of scope.
///
/// Borrows a queue mutably for its whole lifetime, so nothing else can
/// submit to that queue meanwhile. If [`wait`](Self::wait) was not
/// called, dropping the controller calls it and discards the result;
/// a round is never left half-finished.
///
/// Built with `None`, the controller is a no-op: `add` drops its input
/// unevaluated and `wait` returns `true`. This lets callers keep one code
/// path whether or not parallel verification is enabled.
///
/// ```
/// use vouch_core::Check;
/// use vouch_engine::{CheckQueue, CheckQueueControl, QueueConfig};
///
/// struct Nonzero(u32);
///
/// impl Check for Nonzero {
///     fn verify(self) -> bool {
///         self.0 != 0
///     }
/// }
///
/// let mut queue = CheckQueue::new(QueueConfig::with_participants(2)).unwrap();
/// {
///     let mut control = CheckQueueControl::new(Some(&mut queue));
///     control.add((1..=64).map(Nonzero));
///     assert!(control.wait());
/// }
/// assert!(queue.is_idle());
/// ```
#[must_use = "dropping the controller immediately finishes the round"]
pub struct CheckQueueControl<'a, T: Check> {
    queue: Option<&'a mut CheckQueue<T>>,
    /// Result of the round, once `wait` has run.
    result: Option<bool>,
}

impl<'a, T: Check> CheckQueueControl<'a, T> {
    /// Take control of `queue` for one round.
    ///
    /// The queue should be idle. If a round is already open its checks
    /// are adopted into this controller's round.
    pub fn new(queue: Option<&'a mut CheckQueue<T>>) -> Self {
        if let Some(q) = queue.as_deref() {
            if !q.is_idle() {
                warn!("controller adopting a round that is already open");
            }
        }
        Self {
            queue,
            result: None,
        }
    }

    /// Submit checks to the controlled round.
    ///
    /// Adding after [`wait`](Self::wait) opens a new round, which this
    /// controller also finishes on drop.
    pub fn add<I>(&mut self, checks: I)
    where
        I: IntoIterator<Item = T>,
    {
        if let Some(q) = self.queue.as_deref_mut() {
            q.add(checks);
            if self.result.is_some() && !q.is_idle() {
                self.result = None;
            }
        }
    }

    /// Finish the round and return its aggregate result.
    ///
    /// Idempotent: later calls return the first result without touching
    /// the queue.
    pub fn wait(&mut self) -> bool {
        if let Some(result) = self.result {
            return result;
        }
        let result = match self.queue.as_deref_mut() {
            Some(q) => q.wait(),
            None => true,
        };
        self.result = Some(result);
        result
    }

    /// Whether the round has been finished.
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Whether this controller drives a real queue.
    pub fn is_active(&self) -> bool {
        self.queue.is_some()
    }
}

impl<T: Check> Drop for CheckQueueControl<'_, T> {
    fn drop(&mut self) {
        if self.result.is_none() {
            let _ = self.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueueConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Boxed = Box<dyn FnOnce() -> bool + Send>;

    fn counted(calls: &Arc<AtomicUsize>, verdict: bool) -> Boxed {
        let calls = Arc::clone(calls);
        Box::new(move || {
            calls.fetch_add(1, Ordering::Relaxed);
            verdict
        })
    }

    fn queue(participants: usize) -> CheckQueue<Boxed> {
        CheckQueue::new(QueueConfig::with_participants(participants)).unwrap()
    }

    #[test]
    fn none_queue_is_noop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut control: CheckQueueControl<'_, Boxed> = CheckQueueControl::new(None);
        assert!(!control.is_active());
        control.add([counted(&calls, false)]);
        assert!(control.wait());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn drop_finishes_round() {
        let mut q = queue(3);
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let mut control = CheckQueueControl::new(Some(&mut q));
            control.add((0..50).map(|_| counted(&calls, true)));
        }
        assert_eq!(calls.load(Ordering::Relaxed), 50);
        assert!(q.is_idle());
        assert_eq!(q.rounds_completed(), 1);
        assert!(q.last_round().result);
    }

    #[test]
    fn wait_is_idempotent() {
        let mut q = queue(2);
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let mut control = CheckQueueControl::new(Some(&mut q));
            control.add([counted(&calls, false)]);
            assert!(!control.wait());
            assert!(control.is_finished());
            assert!(!control.wait());
        }
        // Drop after an explicit wait does not run another round.
        assert_eq!(q.rounds_completed(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn add_after_wait_opens_new_round() {
        let mut q = queue(2);
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let mut control = CheckQueueControl::new(Some(&mut q));
            control.add([counted(&calls, true)]);
            assert!(control.wait());
            control.add([counted(&calls, false)]);
            assert!(!control.is_finished());
        }
        assert_eq!(q.rounds_completed(), 2);
        assert!(!q.last_round().result);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn adopts_open_round() {
        let mut q = queue(2);
        let calls = Arc::new(AtomicUsize::new(0));
        q.add([counted(&calls, true)]);
        {
            let mut control = CheckQueueControl::new(Some(&mut q));
            control.add([counted(&calls, true)]);
            assert!(control.wait());
        }
        assert_eq!(q.last_round().submitted, 2);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
