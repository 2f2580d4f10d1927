//! # Domain Errors
//!
//! Rejection classes for every manager operation. All of them are raised
//! before any state is written, so a returned error always means "nothing
//! changed".

use thiserror::Error;

/// Shard identifier.
pub type ShardId = u16;

/// Hash type (32-byte keccak256).
pub type Hash = [u8; 32];

/// Address type (20-byte Ethereum-style).
pub type Address = [u8; 20];

/// Index into the validator slot array.
pub type SlotIndex = u64;

/// Sequential cross-shard receipt identifier.
pub type ReceiptId = u64;

/// Value amounts in wei.
pub type Wei = u128;

/// Sharding manager error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// Deposit value differs from the fixed deposit size.
    #[error("Wrong deposit amount: expected {expected}, got {got}")]
    WrongDepositAmount {
        /// Required deposit
        expected: Wei,
        /// Value attached to the call
        got: Wei,
    },

    /// Credential already has a live validator entry.
    #[error("Credential already registered: {0:?}")]
    AlreadyRegistered(Address),

    /// Slot index out of range or not in the expected liveness state.
    #[error("Invalid slot: {0}")]
    InvalidSlot(SlotIndex),

    /// Header with this hash was already accepted on the shard.
    #[error("Duplicate header: {0:?}")]
    DuplicateHeader(Hash),

    /// Parent hash has no entry in the shard chain.
    #[error("Unknown parent header: {0:?}")]
    UnknownParent(Hash),

    /// Header height does not extend its parent by one.
    #[error("Invalid header height: expected {expected}, got {got}")]
    InvalidHeight {
        /// Parent height + 1
        expected: u64,
        /// Height carried by the header
        got: u64,
    },

    /// Submitter is not the sampled proposer for the shard/period.
    #[error("Not the eligible proposer: expected {expected:?}, got {got:?}")]
    NotEligibleProposer {
        /// Sampled proposer
        expected: Address,
        /// Caller
        got: Address,
    },

    /// Signature does not verify under the credential.
    #[error("Bad signature")]
    BadSignature,

    /// Requested period lies beyond the lookahead window.
    #[error("Period {period} too far ahead (max {max_period})")]
    TooFarAhead {
        /// Requested period
        period: u64,
        /// Last period that may be queried
        max_period: u64,
    },

    /// Registry has no live validators.
    #[error("No validators registered")]
    NoValidators,

    /// Gas price update by someone other than the receipt's origin.
    #[error("Unauthorized gas price update of receipt {receipt_id} by {caller:?}")]
    Unauthorized {
        /// Receipt being updated
        receipt_id: ReceiptId,
        /// Caller that attempted the update
        caller: Address,
    },

    /// Receipt id was never assigned.
    #[error("Unknown receipt: {0}")]
    UnknownReceipt(ReceiptId),

    /// Shard id outside `[0, shard_count)`.
    #[error("Unknown shard: {0}")]
    UnknownShard(ShardId),

    /// Header period differs from the current period.
    #[error("Wrong period: expected {expected}, got {got}")]
    WrongPeriod {
        /// Period derived from the clock
        expected: u64,
        /// Period carried by the header
        got: u64,
    },

    /// Header period start reference does not match the chain.
    #[error("Wrong period start reference for period {0}")]
    WrongPeriodStartReference(u64),

    /// Header bytes could not be decoded.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Randomness for the period is not available yet.
    #[error("Randomness unavailable for period {0}")]
    RandomnessUnavailable(u64),

    /// Balance ledger refused the transfer.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Command mailbox is closed.
    #[error("Mailbox closed")]
    MailboxClosed,

    /// Internal bookkeeping disagrees with itself.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl ManagerError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WrongDepositAmount { .. } => "wrong_deposit_amount",
            Self::AlreadyRegistered(_) => "already_registered",
            Self::InvalidSlot(_) => "invalid_slot",
            Self::DuplicateHeader(_) => "duplicate_header",
            Self::UnknownParent(_) => "unknown_parent",
            Self::InvalidHeight { .. } => "invalid_height",
            Self::NotEligibleProposer { .. } => "not_eligible_proposer",
            Self::BadSignature => "bad_signature",
            Self::TooFarAhead { .. } => "too_far_ahead",
            Self::NoValidators => "no_validators",
            Self::Unauthorized { .. } => "unauthorized",
            Self::UnknownReceipt(_) => "unknown_receipt",
            Self::UnknownShard(_) => "unknown_shard",
            Self::WrongPeriod { .. } => "wrong_period",
            Self::WrongPeriodStartReference(_) => "wrong_period_start_reference",
            Self::MalformedHeader(_) => "malformed_header",
            Self::RandomnessUnavailable(_) => "randomness_unavailable",
            Self::TransferFailed(_) => "transfer_failed",
            Self::MailboxClosed => "mailbox_closed",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}

/// Result alias for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_deposit_amount_error() {
        let err = ManagerError::WrongDepositAmount {
            expected: 100,
            got: 99,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_unknown_shard_error() {
        let err = ManagerError::UnknownShard(99);
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_too_far_ahead_error() {
        let err = ManagerError::TooFarAhead {
            period: 100,
            max_period: 5,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("max 5"));
    }

    #[test]
    fn test_kind_labels_are_distinct() {
        let errors = [
            ManagerError::BadSignature,
            ManagerError::NoValidators,
            ManagerError::MailboxClosed,
            ManagerError::UnknownReceipt(1),
            ManagerError::InvalidSlot(1),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }
}
