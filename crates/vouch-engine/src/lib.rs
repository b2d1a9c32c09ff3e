//! Parallel batch-verification engine.
//!
//! A [`CheckQueue`] runs large batches of independent [`Check`]s across a
//! fixed pool of participants and reports one aggregate result per round:
//! `true` iff every check that ran succeeded. The thread that owns the
//! queue acts as the round's master: it submits checks with
//! [`CheckQueue::add`] and then joins the pool inside
//! [`CheckQueue::wait`], evaluating checks itself until the round ends.
//!
//! Once any check in a round fails, checks not yet started are dropped
//! without evaluation. Which checks ran before the failure was noticed
//! is scheduling-dependent; the aggregate result is not.
//!
//! [`CheckQueueControl`] is a scope guard that guarantees a round is
//! finished even on early return.
//!
//! [`Check`]: vouch_core::Check

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod control;
pub mod metrics;
pub(crate) mod pending;
pub mod queue;
pub(crate) mod round;
pub mod worker;

pub use config::{ConfigError, QueueConfig};
pub use control::CheckQueueControl;
pub use metrics::RoundMetrics;
pub use queue::CheckQueue;
pub use worker::Worker;
