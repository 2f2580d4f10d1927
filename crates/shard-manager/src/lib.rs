//! # Shard Manager
//!
//! Validator registry, proposer sampling and per-shard collation header
//! chains for a sharded chain.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Coordinate validators and collators without any coordination between
//! honest nodes: every node applying the same commands against the same
//! randomness reaches the same state.
//! - Fixed-size deposits into reusable validator slots
//! - Deterministic proposer sampling per shard and period
//! - Header chains with parent linkage, sibling scores and a head pointer
//! - A globally ordered queue of cross-shard receipts
//!
//! ## Consensus Rules
//!
//! | Rule | Enforced by |
//! |------|-------------|
//! | One live entry per credential | `ValidatorRegistry` |
//! | No double free of a slot | `SlotAllocator` liveness bitmap |
//! | Parent known, height = parent + 1 | `ShardChain` |
//! | Only the sampled proposer submits | `ShardManager::add_header` |
//! | Validate fully before any write | every command |
//!
//! ## Module Structure
//!
//! ```text
//! shard-manager/
//! ├── domain/          # Types, header codec, commands, invariants
//! ├── algorithms/      # Slot allocator, registry, sampler, chains, receipts
//! ├── ports/           # API trait + collaborator traits
//! ├── adapters/        # In-memory chain, ledger, log, secp256k1 oracle
//! └── service/         # Single-writer executor + mailbox actor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

// Re-exports
pub use adapters::{
    credential_of, sign_hash, BlockHashRandomness, EcdsaSignatureOracle, InMemoryChain,
    InMemoryEventLog, InMemoryLedger,
};
pub use algorithms::{sample_slot, ReceiptQueue, ShardChain, SlotAllocator, ValidatorRegistry};
pub use config::{ConfigError, ManagerConfig};
pub use domain::{
    Address, CallContext, CollationHeader, Command, Hash, LogEntry, LogTopic, ManagerError,
    ManagerResult, Outcome, Receipt, ReceiptId, ShardChainEntry, ShardId, SlotIndex, StateSummary,
    Validator, Wei, GENESIS_HASH, NO_VALIDATOR,
};
pub use ports::{
    BalanceLedger, BlockClock, EventLog, RandomnessOracle, ShardManagerApi, SignatureOracle,
};
pub use service::mailbox::{spawn as spawn_mailbox, ManagerHandle};
pub use service::{InMemoryShardManager, ShardManager, ShardManagerDependencies};
pub use state::RegistryState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
