//! # Outbound Ports
//!
//! Collaborators the manager depends on but does not own: the host chain's
//! clock and block hashes, period randomness, signature verification, the
//! balance ledger and the event log.
//!
//! All of them are synchronous. The manager calls them while holding its
//! single write lock, so an implementation must not call back into it.

use crate::domain::{Address, Hash, LogEntry, Wei};

/// Monotonic block clock of the host chain.
pub trait BlockClock: Send + Sync {
    /// Current block number.
    fn block_number(&self) -> u64;

    /// Hash of a mined block, `None` if `number` is not mined yet.
    fn block_hash(&self, number: u64) -> Option<Hash>;
}

/// Source of per-period randomness.
///
/// Once a value is returned for a period it must never change.
pub trait RandomnessOracle: Send + Sync {
    /// Randomness for `period`, `None` if not yet available.
    fn period_randomness(&self, period: u64) -> Option<Hash>;
}

/// Signature verification under a validator credential.
pub trait SignatureOracle: Send + Sync {
    /// Whether `signature` over `message_hash` was produced by `credential`.
    fn verify(&self, credential: &Address, message_hash: &Hash, signature: &[u8]) -> bool;
}

/// Value transfer between accounts.
///
/// A transfer either moves the full amount or fails and moves nothing.
pub trait BalanceLedger: Send + Sync {
    /// Current balance of `account`.
    fn balance(&self, account: &Address) -> Wei;

    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<(), String>;
}

/// Append-only event log.
pub trait EventLog: Send + Sync {
    /// Append an entry; entries are readable in append order.
    fn append(&self, entry: LogEntry);
}
