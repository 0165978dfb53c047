//! Signature id allocation.
//!
//! Ids are small positive integers. Released ids are recycled smallest
//! first. During restoration the store reserves the ids it finds on disk
//! with [`IdAllocator::allocate_designated`]; every skipped value below a
//! designated id lands in the free set, so after any restoration order each
//! integer in `1..=max` is either held by a live record or free.

use std::collections::BTreeSet;

/// Id value that means "no designated id requested".
pub const NO_DESIGNATED_ID: u64 = 0;

/// Allocator for signature ids.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_counter: u64,
    free: BTreeSet<u64>,
}

impl IdAllocator {
    /// Create an allocator whose first id is `1`.
    pub fn new() -> Self {
        Self {
            next_counter: 1,
            free: BTreeSet::new(),
        }
    }

    /// Hand out the smallest free id, or a fresh one if none is free.
    pub fn allocate(&mut self) -> u64 {
        if let Some(id) = self.free.pop_first() {
            return id;
        }
        let id = self.next_counter;
        self.next_counter += 1;
        id
    }

    /// Reserve a specific id recovered from storage.
    ///
    /// All never-seen values in `[next_counter, id)` become free. Passing
    /// [`NO_DESIGNATED_ID`] falls back to [`IdAllocator::allocate`].
    pub fn allocate_designated(&mut self, id: u64) -> u64 {
        if id == NO_DESIGNATED_ID {
            return self.allocate();
        }
        if id >= self.next_counter {
            self.free.extend(self.next_counter..id);
            self.next_counter = id + 1;
        }
        self.free.remove(&id);
        id
    }

    /// Return an id to the free set. Releasing a free id is a no-op.
    pub fn release(&mut self, id: u64) {
        if id != NO_DESIGNATED_ID {
            self.free.insert(id);
        }
    }

    /// Collapse the id space back to its initial state.
    pub fn reset_all(&mut self) {
        self.free.clear();
        self.next_counter = 1;
    }

    /// The id that will be handed out once the free set is exhausted.
    pub fn next_counter(&self) -> u64 {
        self.next_counter
    }

    /// Free ids in ascending order.
    pub fn free_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.free.iter().copied()
    }

    pub fn is_free(&self, id: u64) -> bool {
        self.free.contains(&id)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
