//! # Slot Allocator
//!
//! Dense array of validator slots. Vacated slots go on a LIFO free stack and
//! are handed out again before the high-water mark grows. A liveness bitmap
//! makes double-free and stale-index frees detectable.

use crate::domain::{invariant_slot_in_range, ManagerError, SlotIndex};
use serde::{Deserialize, Serialize};

/// Slot allocator with free-list reuse.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAllocator {
    /// High-water mark; never shrinks.
    max_index: SlotIndex,
    /// Vacated slots, most recent on top.
    free_stack: Vec<SlotIndex>,
    /// One bit per slot below `max_index`; set while occupied.
    live: Vec<u64>,
}

impl SlotAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a slot: the most recently freed one, or a fresh index.
    pub fn allocate(&mut self) -> SlotIndex {
        let slot = match self.free_stack.pop() {
            Some(slot) => slot,
            None => {
                let slot = self.max_index;
                self.max_index += 1;
                if self.live.len() * 64 < self.max_index as usize {
                    self.live.push(0);
                }
                slot
            }
        };
        self.set_live(slot, true);
        slot
    }

    /// Return a slot to the free stack.
    ///
    /// Rejects indices at or beyond the high-water mark and slots that are
    /// already free.
    pub fn free(&mut self, slot: SlotIndex) -> Result<(), ManagerError> {
        invariant_slot_in_range(slot, self.max_index)?;
        if !self.is_live(slot) {
            return Err(ManagerError::InvalidSlot(slot));
        }
        self.set_live(slot, false);
        self.free_stack.push(slot);
        Ok(())
    }

    /// Whether `slot` is currently occupied.
    pub fn is_live(&self, slot: SlotIndex) -> bool {
        if slot >= self.max_index {
            return false;
        }
        let (word, bit) = Self::position(slot);
        self.live[word] & (1u64 << bit) != 0
    }

    /// Allocation high-water mark (the sampler's modulus).
    pub fn max_index(&self) -> SlotIndex {
        self.max_index
    }

    /// Number of occupied slots.
    pub fn live_count(&self) -> u64 {
        self.max_index - self.free_stack.len() as u64
    }

    /// Slot the next `allocate` will return.
    pub fn peek_next(&self) -> SlotIndex {
        self.free_stack.last().copied().unwrap_or(self.max_index)
    }

    fn set_live(&mut self, slot: SlotIndex, live: bool) {
        let (word, bit) = Self::position(slot);
        if live {
            self.live[word] |= 1u64 << bit;
        } else {
            self.live[word] &= !(1u64 << bit);
        }
    }

    fn position(slot: SlotIndex) -> (usize, u32) {
        ((slot / 64) as usize, (slot % 64) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_grows_from_zero() {
        let mut alloc = SlotAllocator::new();
        assert_eq!(alloc.allocate(), 0);
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
        assert_eq!(alloc.max_index(), 3);
        assert_eq!(alloc.live_count(), 3);
    }

    #[test]
    fn test_freed_slot_reused_before_growth() {
        let mut alloc = SlotAllocator::new();
        alloc.allocate();
        let i = alloc.allocate();
        alloc.allocate();

        alloc.free(i).unwrap();
        assert_eq!(alloc.peek_next(), i);
        assert_eq!(alloc.allocate(), i);
        assert_eq!(alloc.max_index(), 3);
    }

    #[test]
    fn test_free_stack_is_lifo() {
        let mut alloc = SlotAllocator::new();
        for _ in 0..4 {
            alloc.allocate();
        }
        alloc.free(1).unwrap();
        alloc.free(3).unwrap();
        assert_eq!(alloc.allocate(), 3);
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 4);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut alloc = SlotAllocator::new();
        let slot = alloc.allocate();
        alloc.free(slot).unwrap();
        assert_eq!(alloc.free(slot), Err(ManagerError::InvalidSlot(slot)));
        assert_eq!(alloc.live_count(), 0);
    }

    #[test]
    fn test_free_out_of_range_rejected() {
        let mut alloc = SlotAllocator::new();
        assert_eq!(alloc.free(0), Err(ManagerError::InvalidSlot(0)));
        alloc.allocate();
        assert_eq!(alloc.free(5), Err(ManagerError::InvalidSlot(5)));
    }

    #[test]
    fn test_max_index_never_shrinks() {
        let mut alloc = SlotAllocator::new();
        for _ in 0..3 {
            alloc.allocate();
        }
        for slot in 0..3 {
            alloc.free(slot).unwrap();
        }
        assert_eq!(alloc.max_index(), 3);
        assert_eq!(alloc.live_count(), 0);
        assert!(!alloc.is_live(0));
    }

    #[test]
    fn test_random_churn_matches_model() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeSet;

        let mut rng = StdRng::seed_from_u64(14);
        let mut alloc = SlotAllocator::new();
        let mut live = BTreeSet::new();

        for _ in 0..2_000 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let slot = alloc.allocate();
                assert!(live.insert(slot), "slot {} handed out twice", slot);
            } else {
                let victim = *live.iter().nth(rng.gen_range(0..live.len())).unwrap();
                alloc.free(victim).unwrap();
                live.remove(&victim);
                assert!(alloc.free(victim).is_err());
            }
            assert_eq!(alloc.live_count(), live.len() as u64);
        }

        for slot in 0..alloc.max_index() {
            assert_eq!(alloc.is_live(slot), live.contains(&slot));
        }
    }

    #[test]
    fn test_liveness_across_word_boundary() {
        let mut alloc = SlotAllocator::new();
        for _ in 0..130 {
            alloc.allocate();
        }
        alloc.free(64).unwrap();
        assert!(alloc.is_live(63));
        assert!(!alloc.is_live(64));
        assert!(alloc.is_live(129));
        assert!(!alloc.is_live(130));
    }
}
