//! Generational arena that owns a round's checks.
//!
//! The engine never shares raw references into its storage across
//! threads. Every submitted check is moved into a [`CheckArena`] and
//! addressed by a [`CheckHandle`]: an `(index, generation)` pair that
//! stays valid for exactly one round.
//!
//! # Lifecycle
//!
//! ```text
//! insert(check) ──► CheckHandle { generation: g, index: i }
//!                       │
//!              take(handle) moves the check out (once)
//!                       │
//! clear() ──► generation g+1, every outstanding handle is stale
//! ```
//!
//! Insertion is append-only within a generation, so inserting never
//! invalidates an earlier handle even when the backing `Vec` grows.
//! `clear()` keeps the allocation, so a queue that runs many rounds of
//! similar size stops allocating after the first.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod slab;

pub use error::ArenaError;
pub use handle::CheckHandle;
pub use slab::CheckArena;
