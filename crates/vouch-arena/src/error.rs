//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The arena already holds `u32::MAX` checks this generation.
    CapacityExceeded {
        /// Number of slots in use when the insert was attempted.
        len: usize,
    },
    /// A `CheckHandle` from a generation that has been cleared.
    StaleHandle {
        /// The generation encoded in the handle.
        handle_generation: u32,
        /// The arena's current generation.
        current: u32,
    },
    /// The handle's index is past the end of the current generation.
    OutOfBounds {
        /// The index encoded in the handle.
        index: u32,
        /// Number of slots in the current generation.
        len: usize,
    },
    /// The slot was already taken; the check has been handed out before.
    Vacant {
        /// The index encoded in the handle.
        index: u32,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { len } => {
                write!(f, "arena capacity exceeded: {len} slots in use")
            }
            Self::StaleHandle {
                handle_generation,
                current,
            } => {
                write!(
                    f,
                    "stale handle: generation {handle_generation}, current {current}"
                )
            }
            Self::OutOfBounds { index, len } => {
                write!(f, "handle index {index} out of bounds (len {len})")
            }
            Self::Vacant { index } => {
                write!(f, "slot {index} already taken")
            }
        }
    }
}

impl Error for ArenaError {}
