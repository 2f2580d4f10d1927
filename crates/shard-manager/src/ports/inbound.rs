//! # Inbound Ports
//!
//! API trait defining what the shard manager can do for an external caller.

use crate::domain::{
    Address, CallContext, Command, Hash, ManagerError, Outcome, ShardId, StateSummary,
};
use async_trait::async_trait;

/// Shard manager API - inbound port.
///
/// Commands are applied one at a time in submission order.
#[async_trait]
pub trait ShardManagerApi: Send + Sync {
    /// Apply a state-changing command as `ctx.caller`.
    async fn submit(&self, ctx: CallContext, command: Command) -> Result<Outcome, ManagerError>;

    /// Eligible proposer for `(shard_id, period)`.
    async fn eligible_proposer(
        &self,
        shard_id: ShardId,
        period: u64,
    ) -> Result<Address, ManagerError>;

    /// Head of a shard chain (genesis sentinel if empty).
    async fn shard_head(&self, shard_id: ShardId) -> Result<Hash, ManagerError>;

    /// Snapshot of the manager's counters.
    async fn summary(&self) -> Result<StateSummary, ManagerError>;
}
