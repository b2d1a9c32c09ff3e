//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a participant in a check queue.
///
/// Participants are numbered `0..K`. `ParticipantId(0)` is always the
/// master: the thread that submits checks and joins the pool while
/// waiting for the round to finish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// The master participant.
    pub const MASTER: Self = Self(0);

    /// Whether this is the master participant.
    pub fn is_master(self) -> bool {
        self == Self::MASTER
    }

    /// Slot index into per-participant tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing round counter.
///
/// Advanced each time a round is finalized. A queue that has never
/// completed a round is at `RoundId(0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The round after this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoundId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
