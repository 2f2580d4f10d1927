//! In-memory host chain adapter
//!
//! Implements `BlockClock` with a locally mined hash chain, and
//! `RandomnessOracle` on top of any clock by reading back old block hashes.

use crate::domain::{keccak256, Hash};
use crate::ports::{BlockClock, RandomnessOracle};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Locally mined chain of block hashes.
///
/// Block `n`'s hash is `keccak256(hash(n - 1) || n)`; block 0 hashes a fixed
/// seed.
pub struct InMemoryChain {
    hashes: RwLock<Vec<Hash>>,
}

impl InMemoryChain {
    /// Chain holding only block 0.
    pub fn new() -> Self {
        Self::with_seed(b"genesis")
    }

    /// Chain whose block 0 hashes `seed`.
    pub fn with_seed(seed: &[u8]) -> Self {
        Self {
            hashes: RwLock::new(vec![keccak256(seed)]),
        }
    }

    /// Mine `count` blocks and return the new block number.
    pub fn mine(&self, count: u64) -> u64 {
        let mut hashes = self.hashes.write();
        for _ in 0..count {
            let number = hashes.len() as u64;
            let prev = hashes[hashes.len() - 1];
            let mut input = [0u8; 40];
            input[..32].copy_from_slice(&prev);
            input[32..].copy_from_slice(&number.to_be_bytes());
            hashes.push(keccak256(&input));
        }
        let head = hashes.len() as u64 - 1;
        debug!("[smc] mined {} blocks, head {}", count, head);
        head
    }

    /// Mine up to block `number` (no-op if already there).
    pub fn mine_to(&self, number: u64) -> u64 {
        let current = self.block_number();
        if number > current {
            self.mine(number - current)
        } else {
            current
        }
    }
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockClock for InMemoryChain {
    fn block_number(&self) -> u64 {
        self.hashes.read().len() as u64 - 1
    }

    fn block_hash(&self, number: u64) -> Option<Hash> {
        self.hashes.read().get(number as usize).copied()
    }
}

/// Period randomness read from the host chain's block hashes.
///
/// The value for period `p` is the hash of block
/// `(p - lookahead_periods) * period_length`, saturating at block 0. That
/// block is already mined for every period inside the lookahead window.
pub struct BlockHashRandomness<C: BlockClock> {
    clock: Arc<C>,
    period_length: u64,
    lookahead_periods: u64,
}

impl<C: BlockClock> BlockHashRandomness<C> {
    /// Create a randomness source over `clock`.
    pub fn new(clock: Arc<C>, period_length: u64, lookahead_periods: u64) -> Self {
        Self {
            clock,
            period_length,
            lookahead_periods,
        }
    }

    /// Block whose hash seeds `period`.
    pub fn source_block(&self, period: u64) -> u64 {
        period
            .saturating_sub(self.lookahead_periods)
            .saturating_mul(self.period_length)
    }
}

impl<C: BlockClock> RandomnessOracle for BlockHashRandomness<C> {
    fn period_randomness(&self, period: u64) -> Option<Hash> {
        self.clock.block_hash(self.source_block(period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_at_block_zero() {
        let chain = InMemoryChain::new();
        assert_eq!(chain.block_number(), 0);
        assert!(chain.block_hash(0).is_some());
        assert!(chain.block_hash(1).is_none());
    }

    #[test]
    fn test_mine_extends_hash_chain() {
        let chain = InMemoryChain::new();
        assert_eq!(chain.mine(3), 3);
        let hashes: Vec<_> = (0..=3).map(|n| chain.block_hash(n).unwrap()).collect();
        for pair in hashes.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(chain.mine_to(2), 3);
        assert_eq!(chain.mine_to(10), 10);
    }

    #[test]
    fn test_same_seed_same_chain() {
        let a = InMemoryChain::with_seed(b"x");
        let b = InMemoryChain::with_seed(b"x");
        a.mine(5);
        b.mine(5);
        assert_eq!(a.block_hash(5), b.block_hash(5));
    }

    #[test]
    fn test_randomness_reads_lookahead_block() {
        let chain = Arc::new(InMemoryChain::new());
        chain.mine(40);
        let randomness = BlockHashRandomness::new(chain.clone(), 5, 4);

        assert_eq!(randomness.source_block(6), 10);
        assert_eq!(randomness.period_randomness(6), chain.block_hash(10));
        // Early periods saturate at block 0
        assert_eq!(randomness.period_randomness(2), chain.block_hash(0));
        // Block 100 is not mined yet
        assert_eq!(randomness.period_randomness(24), None);
    }

    #[test]
    fn test_randomness_stable_after_more_blocks() {
        let chain = Arc::new(InMemoryChain::new());
        chain.mine(20);
        let randomness = BlockHashRandomness::new(chain.clone(), 5, 4);
        let before = randomness.period_randomness(7);
        chain.mine(50);
        assert_eq!(randomness.period_randomness(7), before);
    }
}
