//! # Adapters Layer (Hexagonal Architecture)
//!
//! Reference implementations of the outbound ports: an in-memory host chain
//! and its block-hash randomness, a balance ledger, an event log and the
//! secp256k1 validation-code oracle.

mod chain;
mod event_log;
mod ledger;
mod signature;

pub use chain::{BlockHashRandomness, InMemoryChain};
pub use event_log::InMemoryEventLog;
pub use ledger::InMemoryLedger;
pub use signature::{credential_of, recover_address, sign_hash, EcdsaSignatureOracle};
