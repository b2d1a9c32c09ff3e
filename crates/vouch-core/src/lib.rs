//! Core types and traits for the Vouch verification engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared across the Vouch workspace: the [`Check`]
//! trait evaluated by the engine, the [`CheckOutcome`] classification
//! used for bookkeeping, and strongly-typed identifiers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod check;
pub mod id;

pub use check::{Check, CheckOutcome};
pub use id::{ParticipantId, RoundId};
