//! # Proposer Sampling
//!
//! `keccak256(randomness ++ shard_word) mod max_index`, then a forward linear
//! probe with wraparound past vacated slots. Pure function of the slot
//! allocator and the period's randomness, so every node resolves the same
//! slot.

use super::slot_allocator::SlotAllocator;
use crate::domain::{keccak256, shard_word, Hash, ShardId, SlotIndex};
use primitive_types::U256;
use std::collections::BTreeMap;

/// Resolve the slot sampled for `shard_id` under `randomness`.
///
/// Returns `None` when no slot is occupied.
pub fn sample_slot(
    randomness: &Hash,
    shard_id: ShardId,
    allocator: &SlotAllocator,
) -> Option<SlotIndex> {
    let max_index = allocator.max_index();
    if max_index == 0 || allocator.live_count() == 0 {
        return None;
    }

    let start = start_index(randomness, shard_id, max_index);
    (0..max_index)
        .map(|offset| (start + offset) % max_index)
        .find(|slot| allocator.is_live(*slot))
}

/// First probe position: the seed hash reduced modulo `max_index`.
pub fn start_index(randomness: &Hash, shard_id: ShardId, max_index: SlotIndex) -> SlotIndex {
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(randomness);
    input[32..].copy_from_slice(&shard_word(shard_id));
    let raw = U256::from_big_endian(&keccak256(&input));
    (raw % U256::from(max_index)).low_u64()
}

/// Per-period randomness, fetched once and never re-derived.
#[derive(Clone, Debug, Default)]
pub struct RandomnessCache {
    values: BTreeMap<u64, Hash>,
}

impl RandomnessCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `period`, or fetch it with `fetch`.
    ///
    /// A `None` from `fetch` is not cached; the period may become available
    /// later.
    pub fn get_or_fetch<F>(&mut self, period: u64, fetch: F) -> Option<Hash>
    where
        F: FnOnce(u64) -> Option<Hash>,
    {
        if let Some(value) = self.values.get(&period) {
            return Some(*value);
        }
        let value = fetch(period)?;
        self.values.insert(period, value);
        Some(value)
    }

    /// Drop every cached period below `floor`.
    pub fn prune_before(&mut self, floor: u64) {
        self.values = self.values.split_off(&floor);
    }

    /// Number of cached periods.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
