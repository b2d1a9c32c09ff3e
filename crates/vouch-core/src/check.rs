//! The [`Check`] trait and its outcome classification.

use std::fmt;

/// A single verification submitted to the engine.
///
/// A check is consumed by [`verify`](Check::verify), so the type system
/// guarantees it runs at most once. Checks must be `Send + 'static`:
/// they are moved into the engine's arena and may be evaluated on any
/// participant thread.
///
/// Any `FnOnce() -> bool + Send + 'static` closure is a check:
///
/// ```
/// use vouch_core::Check;
///
/// let sig_ok = || 2 + 2 == 4;
/// assert!(sig_ok.verify());
/// ```
///
/// Implementations should return `false` on failure rather than panic.
/// The engine catches panics and treats them as failures, but unwinding
/// is far slower than returning.
pub trait Check: Send + 'static {
    /// Run the verification, returning `true` on success.
    fn verify(self) -> bool;
}

impl<F> Check for F
where
    F: FnOnce() -> bool + Send + 'static,
{
    fn verify(self) -> bool {
        self()
    }
}

/// What happened to a check during a round.
///
/// Only the aggregate result of a round is reported to callers; outcomes
/// exist for metrics and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckOutcome {
    /// The check was invoked and returned `true`.
    Passed,
    /// The check was invoked and returned `false`.
    Failed,
    /// The check panicked. Counts as a failure for the round.
    Panicked,
    /// The check was never invoked because the round had already failed.
    Skipped,
}

impl CheckOutcome {
    /// Classify a returned verdict.
    pub fn from_verdict(ok: bool) -> Self {
        if ok {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    /// Whether the check was actually invoked.
    pub fn was_invoked(self) -> bool {
        !matches!(self, Self::Skipped)
    }

    /// Whether this outcome fails the round.
    pub fn fails_round(self) -> bool {
        matches!(self, Self::Failed | Self::Panicked)
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Panicked => write!(f, "panicked"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}
