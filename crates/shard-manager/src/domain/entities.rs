//! # Domain Entities
//!
//! Records held in the manager's state: validators, shard chain entries,
//! cross-shard receipts and emitted logs.

use super::errors::{Address, Hash, ShardId, SlotIndex, Wei};
use serde::{Deserialize, Serialize};

/// A staked validator occupying one slot.
///
/// Created whole by a deposit and removed whole by a withdrawal; never
/// partially updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Validation code address the validator signs and is sampled under.
    pub credential: Address,
    /// Slot the validator occupies.
    pub slot: SlotIndex,
    /// Where the deposit is paid back on withdrawal.
    pub withdrawal_address: Address,
    /// Locked amount (always the configured deposit size).
    pub deposit: Wei,
}

impl Validator {
    /// Create a new validator record.
    pub fn new(
        credential: Address,
        slot: SlotIndex,
        withdrawal_address: Address,
        deposit: Wei,
    ) -> Self {
        Self {
            credential,
            slot,
            withdrawal_address,
            deposit,
        }
    }
}

/// Per-header bookkeeping on a shard chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardChainEntry {
    /// Parent header hash.
    pub parent_hash: Hash,
    /// Number of headers recorded at the same height before this one.
    pub score: u64,
    /// Height of the header.
    pub height: u64,
}

/// Pending cross-shard call.
///
/// Only `gasprice` may change after creation, and only by `origin_sender`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Destination shard.
    pub shard_id: ShardId,
    /// Recipient on the destination shard.
    pub to: Address,
    /// Value carried over.
    pub value: Wei,
    /// Gas available to the call.
    pub startgas: u64,
    /// Bid price, raisable by the sender.
    pub gasprice: u64,
    /// Call payload.
    pub data: Vec<u8>,
    /// Account that created the receipt.
    pub origin_sender: Address,
}

/// An entry appended to the event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Block number at which the entry was emitted.
    pub block_number: u64,
    /// Indexed topics; the first is the event signature hash.
    pub topics: Vec<Hash>,
    /// Opaque payload.
    pub data: Vec<u8>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(block_number: u64, topics: Vec<Hash>, data: Vec<u8>) -> Self {
        Self {
            block_number,
            topics,
            data,
        }
    }

    /// Event signature topic, if any.
    pub fn signature_topic(&self) -> Option<&Hash> {
        self.topics.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_new() {
        let v = Validator::new([1u8; 20], 3, [2u8; 20], 100);
        assert_eq!(v.slot, 3);
        assert_eq!(v.deposit, 100);
        assert_eq!(v.withdrawal_address, [2u8; 20]);
    }

    #[test]
    fn test_log_entry_signature_topic() {
        let entry = LogEntry::new(7, vec![[9u8; 32], [1u8; 32]], vec![]);
        assert_eq!(entry.signature_topic(), Some(&[9u8; 32]));

        let empty = LogEntry::new(7, vec![], vec![]);
        assert!(empty.signature_topic().is_none());
    }
}
