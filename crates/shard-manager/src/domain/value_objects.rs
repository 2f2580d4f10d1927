//! # Domain Value Objects
//!
//! The closed command set accepted by the manager, the call context every
//! command runs under, and the outcomes and log topics it produces.

use super::errors::{Address, Hash, ReceiptId, ShardId, SlotIndex, Wei};
use super::invariants::keccak256;
use serde::{Deserialize, Serialize};

/// Authenticated caller identity and value attached to a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CallContext {
    /// Account submitting the command.
    pub caller: Address,
    /// Value transferred along with the call.
    pub value: Wei,
}

impl CallContext {
    /// Call without attached value.
    pub fn new(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    /// Attach value to the call.
    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }
}

/// State-changing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Register a validator; the call value must equal the deposit size.
    Deposit {
        /// Validation code address
        credential: Address,
        /// Where the deposit is returned
        withdrawal_address: Address,
    },
    /// Withdraw the validator at `slot`.
    Withdraw {
        /// Slot to vacate
        slot: SlotIndex,
        /// Signature over the withdraw message
        signature: Vec<u8>,
    },
    /// Submit an RLP-encoded collation header.
    AddHeader {
        /// Raw header bytes
        header: Vec<u8>,
    },
    /// Queue a cross-shard call; the call value travels with the receipt.
    TxToShard {
        /// Recipient on the destination shard
        to: Address,
        /// Destination shard
        shard_id: ShardId,
        /// Gas available to the call
        startgas: u64,
        /// Initial bid price
        gasprice: u64,
        /// Call payload
        data: Vec<u8>,
    },
    /// Raise or lower the gas price of a receipt the caller created.
    UpdateGasprice {
        /// Receipt to update
        receipt_id: ReceiptId,
        /// New price
        gasprice: u64,
    },
}

impl Command {
    /// Short name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::AddHeader { .. } => "add_header",
            Self::TxToShard { .. } => "tx_to_shard",
            Self::UpdateGasprice { .. } => "update_gasprice",
        }
    }
}

/// Result of a committed (or silently declined) command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Validator registered at `slot`.
    Deposited {
        /// Assigned slot
        slot: SlotIndex,
    },
    /// `true` when the validator was removed and paid out; `false` when the
    /// slot was empty or the signature did not verify.
    Withdrawn(bool),
    /// Header accepted and made shard head.
    HeaderAdded {
        /// Identity hash of the accepted header
        hash: Hash,
    },
    /// Receipt queued.
    ReceiptCreated {
        /// Sequential receipt id
        receipt_id: ReceiptId,
    },
    /// Gas price updated.
    GaspriceUpdated,
}

/// Event kinds written to the event log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogTopic {
    /// `deposit()`
    Deposit,
    /// `withdraw()`
    Withdraw,
    /// `add_header()`
    AddHeader,
    /// `tx_to_shard()`
    TxToShard,
}

impl LogTopic {
    /// Event signature string.
    pub fn signature(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit()",
            Self::Withdraw => "withdraw()",
            Self::AddHeader => "add_header()",
            Self::TxToShard => "tx_to_shard()",
        }
    }

    /// Topic hash (keccak256 of the signature).
    pub fn hash(&self) -> Hash {
        keccak256(self.signature().as_bytes())
    }
}

/// Serializable snapshot of the manager's counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StateSummary {
    /// Block number the summary was taken at.
    pub block_number: u64,
    /// Current period.
    pub period: u64,
    /// Slot high-water mark.
    pub max_index: SlotIndex,
    /// Live validators.
    pub num_validators: u64,
    /// Shards with at least one accepted header.
    pub active_shards: usize,
    /// Headers accepted across all shards.
    pub total_headers: u64,
    /// Receipts created.
    pub num_receipts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_context_with_value() {
        let ctx = CallContext::new([1u8; 20]).with_value(5);
        assert_eq!(ctx.caller, [1u8; 20]);
        assert_eq!(ctx.value, 5);
        assert_eq!(CallContext::new([1u8; 20]).value, 0);
    }

    #[test]
    fn test_log_topics_distinct() {
        let topics = [
            LogTopic::Deposit,
            LogTopic::Withdraw,
            LogTopic::AddHeader,
            LogTopic::TxToShard,
        ];
        let hashes: std::collections::HashSet<_> = topics.iter().map(|t| t.hash()).collect();
        assert_eq!(hashes.len(), 4);
        assert_eq!(LogTopic::Deposit.hash(), keccak256(b"deposit()"));
    }

    #[test]
    fn test_command_names() {
        let cmd = Command::UpdateGasprice {
            receipt_id: 0,
            gasprice: 1,
        };
        assert_eq!(cmd.name(), "update_gasprice");
        assert_eq!(Command::AddHeader { header: vec![] }.name(), "add_header");
    }

    #[test]
    fn test_outcome_serde() {
        let outcome = Outcome::Deposited { slot: 4 };
        let json = serde_json::to_string(&outcome).unwrap();
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }
}
