//! Check handles.
//!
//! A [`CheckHandle`] names one slot of a [`CheckArena`](crate::CheckArena).
//! It is generation-scoped: the `generation` field allows O(1) staleness
//! checks without a lookup table.

use std::fmt;

/// Stable reference to a check stored in the arena.
///
/// Handles are `Copy` and carry no borrow, so they can sit in the shared
/// pending queue while the arena keeps growing. Resolving one moves the
/// check out of its slot; see [`CheckArena::take`](crate::CheckArena::take).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct CheckHandle {
    /// Arena generation when this check was inserted.
    pub(crate) generation: u32,
    /// Slot index within the generation.
    pub(crate) index: u32,
}

impl CheckHandle {
    /// Create a new handle.
    pub(crate) fn new(generation: u32, index: u32) -> Self {
        Self { generation, index }
    }

    /// The generation this handle belongs to.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Slot index within its generation.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for CheckHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckHandle(gen={}, idx={})", self.generation, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_accessors() {
        let h = CheckHandle::new(42, 7);
        assert_eq!(h.generation(), 42);
        assert_eq!(h.index(), 7);
    }

    #[test]
    fn handles_from_different_generations_differ() {
        assert_ne!(CheckHandle::new(1, 0), CheckHandle::new(2, 0));
    }

    #[test]
    fn display_names_both_parts() {
        let s = CheckHandle::new(3, 9).to_string();
        assert_eq!(s, "CheckHandle(gen=3, idx=9)");
    }
}
