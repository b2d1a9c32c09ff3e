//! Vouch: parallel batch verification with one aggregate result per round.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Vouch sub-crates. For most users, adding `vouch` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use vouch::prelude::*;
//!
//! // A check that a (toy) signature matches its message.
//! struct SigCheck {
//!     message: u64,
//!     signature: u64,
//! }
//!
//! impl Check for SigCheck {
//!     fn verify(self) -> bool {
//!         (self.message.rotate_left(7) ^ 0xa5a5) == self.signature
//!     }
//! }
//!
//! let sign = |message: u64| SigCheck { message, signature: message.rotate_left(7) ^ 0xa5a5 };
//!
//! let mut queue = CheckQueue::new(QueueConfig::with_participants(4)).unwrap();
//!
//! // Every signature valid: the round passes.
//! queue.add((0..2_000).map(sign));
//! assert!(queue.wait());
//!
//! // One forged signature: the round fails, and the queue is reusable.
//! queue.add((0..2_000).map(sign));
//! queue.add([SigCheck { message: 1, signature: 0 }]);
//! assert!(!queue.wait());
//! assert!(queue.is_idle());
//!
//! // A scoped controller finishes the round even on early exit.
//! {
//!     let mut control = CheckQueueControl::new(Some(&mut queue));
//!     control.add((0..100).map(sign));
//! }
//! assert_eq!(queue.rounds_completed(), 3);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vouch-core` | `Check` trait, outcomes, participant and round IDs |
//! | [`arena`] | `vouch-arena` | Generational check arena and handles |
//! | [`engine`] | `vouch-engine` | Check queue, workers, scoped controller, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`vouch-core`).
///
/// Contains the [`types::Check`] trait, the [`types::CheckOutcome`]
/// classification, and [`types::ParticipantId`] / [`types::RoundId`].
pub use vouch_core as types;

/// Generational check storage (`vouch-arena`).
///
/// [`arena::CheckArena`] holds one round's checks behind
/// [`arena::CheckHandle`]s; the engine uses it internally.
pub use vouch_arena as arena;

/// The verification engine (`vouch-engine`).
///
/// [`engine::CheckQueue`] runs rounds, [`engine::CheckQueueControl`]
/// scopes them, [`engine::Worker`] lets callers supply their own threads.
pub use vouch_engine as engine;

/// Common imports for typical Vouch usage.
///
/// ```rust
/// use vouch::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use vouch_core::{Check, CheckOutcome, ParticipantId, RoundId};

    // Engine
    pub use vouch_engine::{
        CheckQueue, CheckQueueControl, ConfigError, QueueConfig, RoundMetrics, Worker,
    };
}
