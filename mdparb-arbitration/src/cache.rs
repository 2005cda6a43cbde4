//! Bounded cache for packets that arrive ahead of the expected sequence.

use crate::error::ArbitrationError;
use bytes::Bytes;

/// Default number of slots.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

#[derive(Debug)]
struct Slot {
    sequence: u64,
    payload: Bytes,
}

/// Direct-mapped, sequence-indexed slot table.
///
/// Sequence `s` always lives in slot `s % capacity`, so `put` and `remove`
/// are O(1) and memory never exceeds `capacity` entries. Storing a sequence
/// in a slot held by a different sequence evicts the old occupant; that only
/// happens when a gap is wider than the cache, and the evicted entry is then
/// reported as lost by the next sweep.
#[derive(Debug)]
pub struct SequenceCache {
    slots: Box<[Option<Slot>]>,
    count: usize,
}

impl SequenceCache {
    /// Creates a cache with `capacity` slots.
    ///
    /// # Errors
    /// Returns `ArbitrationError::InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ArbitrationError> {
        if capacity == 0 {
            return Err(ArbitrationError::InvalidCapacity { capacity });
        }
        Ok(Self {
            slots: (0..capacity).map(|_| None).collect(),
            count: 0,
        })
    }

    #[inline(always)]
    fn index(&self, sequence: u64) -> usize {
        (sequence % self.slots.len() as u64) as usize
    }

    /// Stores a payload under its sequence.
    ///
    /// # Returns
    /// The sequence evicted from the slot, if it held a different one.
    #[inline]
    pub fn put(&mut self, sequence: u64, payload: Bytes) -> Option<u64> {
        let index = self.index(sequence);
        let previous = self.slots[index].replace(Slot { sequence, payload });
        match previous {
            None => {
                self.count += 1;
                None
            }
            Some(slot) if slot.sequence == sequence => None,
            Some(slot) => Some(slot.sequence),
        }
    }

    /// Takes the payload stored for `sequence`.
    ///
    /// Returns `None` without touching the slot if it holds another sequence.
    #[inline]
    pub fn remove(&mut self, sequence: u64) -> Option<Bytes> {
        let index = self.index(sequence);
        let slot = &mut self.slots[index];
        if slot.as_ref().is_some_and(|s| s.sequence == sequence) {
            self.count -= 1;
            slot.take().map(|s| s.payload)
        } else {
            None
        }
    }

    #[cfg(test)]
    fn contains(&self, sequence: u64) -> bool {
        self.slots[self.index(sequence)]
            .as_ref()
            .is_some_and(|s| s.sequence == sequence)
    }

    /// Returns the lowest cached sequence.
    ///
    /// Scans every slot, so this is O(capacity). Only used when a gap is
    /// being abandoned.
    #[must_use]
    pub fn lowest_sequence(&self) -> Option<u64> {
        if self.count == 0 {
            return None;
        }
        self.slots.iter().flatten().map(|s| s.sequence).min()
    }

    /// Returns the number of cached packets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
