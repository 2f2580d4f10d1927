//! Mutable consensus state of the manager.
//!
//! Registry, shard chains and receipt queue in one struct so a single lock
//! serializes every command's validate-then-write sequence.

use crate::algorithms::{ReceiptQueue, ShardChain, ValidatorRegistry};
use crate::domain::{Hash, ManagerError, ShardId, GENESIS_HASH};
use std::collections::HashMap;

/// Everything a command may read or write.
#[derive(Clone, Debug, Default)]
pub struct RegistryState {
    /// Validators and their slots
    pub registry: ValidatorRegistry,
    /// Header chains, created on first accepted header
    pub chains: HashMap<ShardId, ShardChain>,
    /// Cross-shard receipts
    pub receipts: ReceiptQueue,
}

impl RegistryState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain of a shard, if it has accepted any header.
    pub fn chain(&self, shard_id: ShardId) -> Option<&ShardChain> {
        self.chains.get(&shard_id)
    }

    /// Chain of a shard, created on demand.
    pub fn chain_mut(&mut self, shard_id: ShardId) -> &mut ShardChain {
        self.chains.entry(shard_id).or_default()
    }

    /// Head of a shard chain or the genesis sentinel.
    pub fn shard_head(&self, shard_id: ShardId) -> Hash {
        self.chain(shard_id).map_or(GENESIS_HASH, ShardChain::head)
    }

    /// Check duplicate, parent and height of a header on `shard_id`.
    pub fn validate_header_link(
        &self,
        shard_id: ShardId,
        hash: &Hash,
        parent: &Hash,
        height: u64,
    ) -> Result<(), ManagerError> {
        match self.chain(shard_id) {
            Some(chain) => chain.validate(hash, parent, height),
            None => ShardChain::new().validate(hash, parent, height),
        }
    }

    /// Headers accepted across all shards.
    pub fn total_headers(&self) -> u64 {
        self.chains.values().map(|c| c.len() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_shard_head_is_genesis() {
        let state = RegistryState::new();
        assert_eq!(state.shard_head(3), GENESIS_HASH);
        assert!(state.chain(3).is_none());
        assert_eq!(state.total_headers(), 0);
    }

    #[test]
    fn test_chain_mut_creates_chain() {
        let mut state = RegistryState::new();
        state.chain_mut(1).record([1u8; 32], GENESIS_HASH, 1).unwrap();
        assert_eq!(state.shard_head(1), [1u8; 32]);
        assert_eq!(state.shard_head(0), GENESIS_HASH);
        assert_eq!(state.total_headers(), 1);
    }

    #[test]
    fn test_validate_header_link_on_fresh_shard() {
        let state = RegistryState::new();
        assert!(state.validate_header_link(2, &[1u8; 32], &GENESIS_HASH, 1).is_ok());
        assert_eq!(
            state.validate_header_link(2, &[1u8; 32], &[7u8; 32], 1),
            Err(ManagerError::UnknownParent([7u8; 32]))
        );
    }
}
