//! Per-shard collation header chain
//!
//! Every accepted header gets an entry `hash -> (parent, score, height)`.
//! Score counts the headers recorded at the same height before this one, so
//! the `(height, score)` index doubles as the fork-choice leaderboard. The
//! head pointer is the last accepted header.

use crate::domain::{
    invariant_height_extends_parent, Hash, ManagerError, ShardChainEntry, GENESIS_HASH,
    GENESIS_HEIGHT,
};
use std::collections::HashMap;

/// One shard's header chain.
#[derive(Clone, Debug, Default)]
pub struct ShardChain {
    /// Accepted headers by hash
    entries: HashMap<Hash, ShardChainEntry>,
    /// Height -> header hashes in acceptance order (index = score)
    by_height: HashMap<u64, Vec<Hash>>,
    /// Last accepted header
    head: Option<Hash>,
}

impl ShardChain {
    /// Create an empty chain (head is the genesis sentinel).
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a header hash has been accepted.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.contains_key(hash)
    }

    /// Entry for an accepted header.
    pub fn get(&self, hash: &Hash) -> Option<&ShardChainEntry> {
        self.entries.get(hash)
    }

    /// Height of a parent, treating the genesis sentinel as height 0.
    pub fn parent_height(&self, parent: &Hash) -> Option<u64> {
        if *parent == GENESIS_HASH {
            return Some(GENESIS_HEIGHT);
        }
        self.entries.get(parent).map(|entry| entry.height)
    }

    /// Check a candidate header without writing.
    ///
    /// INVARIANT: not yet accepted, parent known, height = parent height + 1
    pub fn validate(&self, hash: &Hash, parent: &Hash, height: u64) -> Result<(), ManagerError> {
        if self.contains(hash) {
            return Err(ManagerError::DuplicateHeader(*hash));
        }
        let parent_height = self
            .parent_height(parent)
            .ok_or(ManagerError::UnknownParent(*parent))?;
        invariant_height_extends_parent(height, parent_height)
    }

    /// Record a validated header, make it head and return its score.
    pub fn record(&mut self, hash: Hash, parent: Hash, height: u64) -> Result<u64, ManagerError> {
        self.validate(&hash, &parent, height)?;

        let siblings = self.by_height.entry(height).or_default();
        let score = siblings.len() as u64;
        siblings.push(hash);

        self.entries.insert(
            hash,
            ShardChainEntry {
                parent_hash: parent,
                score,
                height,
            },
        );
        self.head = Some(hash);
        Ok(score)
    }

    /// Last accepted header, or the genesis sentinel.
    pub fn head(&self) -> Hash {
        self.head.unwrap_or(GENESIS_HASH)
    }

    /// Number of headers recorded at `height`.
    pub fn num_with_score(&self, height: u64) -> u64 {
        self.by_height.get(&height).map_or(0, |v| v.len() as u64)
    }

    /// Header recorded at `height` with the given score.
    pub fn with_score(&self, height: u64, score: u64) -> Option<Hash> {
        self.by_height
            .get(&height)
            .and_then(|v| v.get(score as usize))
            .copied()
    }

    /// Number of accepted headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header has been accepted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
