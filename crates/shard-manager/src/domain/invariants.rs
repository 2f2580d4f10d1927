//! # Domain Invariants
//!
//! Constants shared by every honest participant and the rules that must hold
//! before a state transition is allowed to write.

use super::errors::{Address, Hash, ManagerError, ShardId, SlotIndex, Wei};
use sha3::{Digest, Keccak256};

/// Parent hash of the first header on every shard. Treated as height 0.
pub const GENESIS_HASH: Hash = [0u8; 32];

/// Credential returned by the sampler when no validator can be chosen.
pub const NO_VALIDATOR: Address = [0u8; 20];

/// Height of the genesis sentinel.
pub const GENESIS_HEIGHT: u64 = 0;

/// Signature length: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Keccak256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Message a validator signs to withdraw its deposit.
pub fn withdraw_message() -> Hash {
    keccak256(b"withdraw")
}

/// Left-pad an address into a 32-byte word.
pub fn address_word(address: &Address) -> Hash {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// Big-endian 32-byte word of an integer.
pub fn u64_word(value: u64) -> Hash {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Shard id as a 32-byte word (the sampler's hash input).
pub fn shard_word(shard_id: ShardId) -> Hash {
    u64_word(shard_id as u64)
}

/// Invariant: deposits carry exactly the configured amount.
pub fn invariant_exact_deposit(value: Wei, deposit_size: Wei) -> Result<(), ManagerError> {
    if value != deposit_size {
        return Err(ManagerError::WrongDepositAmount {
            expected: deposit_size,
            got: value,
        });
    }
    Ok(())
}

/// Invariant: shard id is within the configured shard count.
pub fn invariant_known_shard(shard_id: ShardId, shard_count: u16) -> Result<(), ManagerError> {
    if shard_id >= shard_count {
        return Err(ManagerError::UnknownShard(shard_id));
    }
    Ok(())
}

/// Invariant: slot index lies below the allocation high-water mark.
pub fn invariant_slot_in_range(slot: SlotIndex, max_index: SlotIndex) -> Result<(), ManagerError> {
    if slot >= max_index {
        return Err(ManagerError::InvalidSlot(slot));
    }
    Ok(())
}

/// Invariant: a header extends its parent by exactly one.
pub fn invariant_height_extends_parent(
    height: u64,
    parent_height: u64,
) -> Result<(), ManagerError> {
    let expected = parent_height.saturating_add(1);
    if height != expected {
        return Err(ManagerError::InvalidHeight {
            expected,
            got: height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty_input() {
        // keccak256("") is a well-known constant
        let hash = keccak256(b"");
        assert_eq!(hash[0], 0xc5);
        assert_eq!(hash[31], 0x70);
    }

    #[test]
    fn test_withdraw_message_stable() {
        assert_eq!(withdraw_message(), withdraw_message());
        assert_ne!(withdraw_message(), keccak256(b"deposit"));
    }

    #[test]
    fn test_address_word_left_padded() {
        let word = address_word(&[0xAB; 20]);
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0xAB; 20]);
    }

    #[test]
    fn test_u64_word_big_endian() {
        let word = u64_word(0x0102);
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert!(word[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_invariant_exact_deposit() {
        assert!(invariant_exact_deposit(100, 100).is_ok());
        assert!(matches!(
            invariant_exact_deposit(99, 100),
            Err(ManagerError::WrongDepositAmount { expected: 100, got: 99 })
        ));
        assert!(invariant_exact_deposit(101, 100).is_err());
    }

    #[test]
    fn test_invariant_known_shard() {
        assert!(invariant_known_shard(3, 4).is_ok());
        assert!(matches!(
            invariant_known_shard(4, 4),
            Err(ManagerError::UnknownShard(4))
        ));
    }

    #[test]
    fn test_invariant_slot_in_range() {
        assert!(invariant_slot_in_range(0, 1).is_ok());
        assert!(invariant_slot_in_range(1, 1).is_err());
    }

    #[test]
    fn test_invariant_height_extends_parent() {
        assert!(invariant_height_extends_parent(1, GENESIS_HEIGHT).is_ok());
        assert!(matches!(
            invariant_height_extends_parent(3, 1),
            Err(ManagerError::InvalidHeight { expected: 2, got: 3 })
        ));
    }
}
