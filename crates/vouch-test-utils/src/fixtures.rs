//! Reusable check fixtures.
//!
//! - [`ConstCheck`]: returns a fixed verdict.
//! - [`CountingCheck`]: counts invocations through a shared [`CallCounter`].
//! - [`PanickingCheck`]: panics when invoked.
//! - [`RecordingCheck`]: reports its id over a channel when invoked.
//! - [`SpinCheck`]: burns a fixed amount of CPU before answering.
//! - [`SleepCheck`]: sleeps before answering.
//!
//! [`AnyCheck`] wraps all of them so one queue can mix fixture kinds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use vouch_core::Check;

/// Returns a fixed verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstCheck(pub bool);

impl Check for ConstCheck {
    fn verify(self) -> bool {
        self.0
    }
}

/// Shared invocation counter for [`CountingCheck`]s.
#[derive(Clone, Debug, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A check that bumps this counter and returns `verdict`.
    pub fn check(&self, verdict: bool) -> CountingCheck {
        CountingCheck {
            verdict,
            calls: Arc::clone(&self.0),
        }
    }

    /// Number of checks invoked so far.
    pub fn calls(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts its own invocation, then returns a fixed verdict.
#[derive(Debug)]
pub struct CountingCheck {
    pub verdict: bool,
    calls: Arc<AtomicUsize>,
}

impl Check for CountingCheck {
    fn verify(self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

/// Panics when invoked.
#[derive(Clone, Copy, Debug)]
pub struct PanickingCheck {
    pub message: &'static str,
}

impl PanickingCheck {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl Check for PanickingCheck {
    fn verify(self) -> bool {
        panic!("{}", self.message)
    }
}

/// Sends its id on a channel when invoked.
///
/// Lets tests see exactly which checks ran, e.g. to assert that nothing
/// ran more than once.
#[derive(Debug)]
pub struct RecordingCheck {
    pub id: u64,
    pub verdict: bool,
    log: Sender<u64>,
}

impl RecordingCheck {
    pub fn new(id: u64, verdict: bool, log: &Sender<u64>) -> Self {
        Self {
            id,
            verdict,
            log: log.clone(),
        }
    }
}

impl Check for RecordingCheck {
    fn verify(self) -> bool {
        // The receiver may already be gone in teardown tests.
        let _ = self.log.send(self.id);
        self.verdict
    }
}

/// Busy-loops for `iterations` rounds of integer mixing, then answers.
///
/// Stands in for a signature check in benchmarks and stress tests.
#[derive(Clone, Copy, Debug)]
pub struct SpinCheck {
    pub iterations: u32,
    pub verdict: bool,
}

impl SpinCheck {
    pub fn new(iterations: u32, verdict: bool) -> Self {
        Self {
            iterations,
            verdict,
        }
    }
}

impl Check for SpinCheck {
    fn verify(self) -> bool {
        let mut x = u64::from(self.iterations) | 1;
        for _ in 0..self.iterations {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
        }
        std::hint::black_box(x);
        self.verdict
    }
}

/// Sleeps for `duration`, then answers.
#[derive(Clone, Copy, Debug)]
pub struct SleepCheck {
    pub duration: Duration,
    pub verdict: bool,
}

impl Check for SleepCheck {
    fn verify(self) -> bool {
        std::thread::sleep(self.duration);
        self.verdict
    }
}

/// Any fixture, so a single queue type can carry a mix.
#[derive(Debug)]
pub enum AnyCheck {
    Const(ConstCheck),
    Counting(CountingCheck),
    Panicking(PanickingCheck),
    Recording(RecordingCheck),
    Spin(SpinCheck),
    Sleep(SleepCheck),
}

impl Check for AnyCheck {
    fn verify(self) -> bool {
        match self {
            Self::Const(c) => c.verify(),
            Self::Counting(c) => c.verify(),
            Self::Panicking(c) => c.verify(),
            Self::Recording(c) => c.verify(),
            Self::Spin(c) => c.verify(),
            Self::Sleep(c) => c.verify(),
        }
    }
}

impl From<ConstCheck> for AnyCheck {
    fn from(c: ConstCheck) -> Self {
        Self::Const(c)
    }
}

impl From<CountingCheck> for AnyCheck {
    fn from(c: CountingCheck) -> Self {
        Self::Counting(c)
    }
}

impl From<PanickingCheck> for AnyCheck {
    fn from(c: PanickingCheck) -> Self {
        Self::Panicking(c)
    }
}

impl From<RecordingCheck> for AnyCheck {
    fn from(c: RecordingCheck) -> Self {
        Self::Recording(c)
    }
}

impl From<SpinCheck> for AnyCheck {
    fn from(c: SpinCheck) -> Self {
        Self::Spin(c)
    }
}

impl From<SleepCheck> for AnyCheck {
    fn from(c: SleepCheck) -> Self {
        Self::Sleep(c)
    }
}
