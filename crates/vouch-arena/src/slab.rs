//! Generational slab holding one round's checks.
//!
//! [`CheckArena`] is an append-only `Vec` of optional slots plus a
//! generation counter. A handle resolves only if its generation matches
//! the arena's and its slot is still occupied, so a check can be handed
//! out at most once and never leaks into a later round.

use crate::error::ArenaError;
use crate::handle::CheckHandle;

/// Owns the checks of the current round at stable indices.
///
/// Not synchronised: the engine keeps the arena behind the same mutex
/// as its pending queue, so inserts and takes are ordered by that lock.
#[derive(Debug)]
pub struct CheckArena<T> {
    /// Slots of the current generation. `None` once taken.
    slots: Vec<Option<T>>,
    /// Current generation, bumped by `clear()`.
    generation: u32,
    /// Number of occupied slots.
    live: usize,
}

impl<T> CheckArena<T> {
    /// Create an empty arena at generation 0.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty arena with room for `capacity` checks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            generation: 0,
            live: 0,
        }
    }

    /// Move a check into the arena and return its handle.
    ///
    /// Never invalidates previously issued handles of this generation.
    pub fn insert(&mut self, check: T) -> Result<CheckHandle, ArenaError> {
        let index = u32::try_from(self.slots.len()).map_err(|_| ArenaError::CapacityExceeded {
            len: self.slots.len(),
        })?;
        if index == u32::MAX {
            return Err(ArenaError::CapacityExceeded {
                len: self.slots.len(),
            });
        }
        self.slots.push(Some(check));
        self.live += 1;
        Ok(CheckHandle::new(self.generation, index))
    }

    /// Move the check named by `handle` out of the arena.
    ///
    /// Fails if the handle belongs to an earlier generation, points past
    /// the end of this one, or its check was already taken.
    pub fn take(&mut self, handle: CheckHandle) -> Result<T, ArenaError> {
        if handle.generation != self.generation {
            return Err(ArenaError::StaleHandle {
                handle_generation: handle.generation,
                current: self.generation,
            });
        }
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(ArenaError::OutOfBounds {
                index: handle.index,
                len,
            })?;
        let check = slot.take().ok_or(ArenaError::Vacant {
            index: handle.index,
        })?;
        self.live -= 1;
        Ok(check)
    }

    /// End the generation: drop every remaining check and invalidate all
    /// outstanding handles.
    ///
    /// Keeps the slot allocation for the next generation. Returns the
    /// number of checks that were still in the arena and got dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.live;
        self.slots.clear();
        self.live = 0;
        self.generation = self.generation.wrapping_add(1);
        dropped
    }

    /// Number of slots used this generation, taken or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been used this generation.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of checks still held (inserted and not yet taken).
    pub fn live(&self) -> usize {
        self.live
    }

    /// Slot capacity retained across generations.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Current generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Default for CheckArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
