use std::collections::BTreeSet;

use crate::surfel::Surfel;

/// Fixed-capacity arena of surfels addressed by handle.
///
/// Slots are never reallocated or moved: an index, once issued, stays valid
/// (though possibly invalidated) until the store is reset. Freed slots are
/// tracked in a `BTreeSet` so `allocate` always reuses the lowest-numbered
/// free slot, keeping the live index range dense.
#[derive(Debug)]
pub struct SurfelStore {
    slots: Vec<Surfel>,
    free: BTreeSet<usize>,
}

/// The store's fixed capacity has been exhausted; there is no free slot to
/// allocate into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFull;

impl SurfelStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Surfel::invalid(); capacity],
            free: (0..capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently live (allocated, non-freed) surfels.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Writes `surfel` into the lowest-numbered free slot and returns its
    /// handle, or [`StoreFull`] if the arena has no room left.
    pub fn allocate(&mut self, surfel: Surfel) -> Result<usize, StoreFull> {
        let index = *self.free.iter().next().ok_or(StoreFull)?;
        self.free.remove(&index);
        self.slots[index] = surfel;
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&Surfel> {
        self.slots.get(index).filter(|s| s.is_valid())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Surfel> {
        if self.slots.get(index).map(Surfel::is_valid).unwrap_or(false) {
            self.slots.get_mut(index)
        } else {
            None
        }
    }

    pub fn set(&mut self, index: usize, surfel: Surfel) {
        debug_assert!(!self.free.contains(&index), "write to a freed slot");
        self.slots[index] = surfel;
    }

    /// Invalidates a slot and returns it to the free list. The fusion core
    /// never calls this directly; it exists for completeness since the
    /// spec's Non-goals only rule out application-facing deletion.
    pub fn mark_invalid(&mut self, index: usize) {
        if index < self.slots.len() && !self.free.contains(&index) {
            self.slots[index] = Surfel::invalid();
            self.free.insert(index);
        }
    }

    /// Clears every slot and the free list back to a fresh, empty store of
    /// the same capacity.
    pub fn reset(&mut self) {
        self.slots.fill(Surfel::invalid());
        self.free = (0..self.slots.len()).collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Surfel)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_valid())
    }
}
