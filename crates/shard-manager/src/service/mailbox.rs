//! Mailbox actor
//!
//! Runs a manager inside a tokio task. Requests arrive over a bounded mpsc
//! channel and are answered over oneshot channels, so commands are applied
//! strictly in arrival order. The task exits once every handle is dropped.

use super::ShardManager;
use crate::domain::{
    Address, CallContext, Command, Hash, ManagerError, Outcome, ShardId, StateSummary,
};
use crate::ports::{
    BalanceLedger, BlockClock, EventLog, RandomnessOracle, ShardManagerApi, SignatureOracle,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

type Reply<T> = oneshot::Sender<Result<T, ManagerError>>;

enum Request {
    Submit {
        ctx: CallContext,
        command: Command,
        reply: Reply<Outcome>,
    },
    EligibleProposer {
        shard_id: ShardId,
        period: u64,
        reply: Reply<Address>,
    },
    ShardHead {
        shard_id: ShardId,
        reply: Reply<Hash>,
    },
    Summary {
        reply: Reply<StateSummary>,
    },
}

/// Cloneable handle to a running mailbox.
#[derive(Clone)]
pub struct ManagerHandle {
    tx: mpsc::Sender<Request>,
}

/// Start the mailbox task for `manager`.
pub fn spawn<C, R, S, L, E>(
    manager: Arc<ShardManager<C, R, S, L, E>>,
) -> (ManagerHandle, JoinHandle<()>)
where
    C: BlockClock + 'static,
    R: RandomnessOracle + 'static,
    S: SignatureOracle + 'static,
    L: BalanceLedger + 'static,
    E: EventLog + 'static,
{
    let (tx, mut rx) = mpsc::channel(manager.config().mailbox_capacity);

    let task = tokio::spawn(async move {
        debug!("[smc] mailbox started");
        while let Some(request) = rx.recv().await {
            match request {
                Request::Submit {
                    ctx,
                    command,
                    reply,
                } => {
                    let _ = reply.send(manager.apply(ctx, command));
                }
                Request::EligibleProposer {
                    shard_id,
                    period,
                    reply,
                } => {
                    let _ = reply.send(manager.eligible_proposer(shard_id, period));
                }
                Request::ShardHead { shard_id, reply } => {
                    let _ = reply.send(manager.get_shard_head(shard_id));
                }
                Request::Summary { reply } => {
                    let _ = reply.send(Ok(manager.state_summary()));
                }
            }
        }
        debug!("[smc] mailbox closed");
    });

    (ManagerHandle { tx }, task)
}

impl ManagerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Request,
    ) -> Result<T, ManagerError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ManagerError::MailboxClosed)?;
        response.await.map_err(|_| ManagerError::MailboxClosed)?
    }
}

#[async_trait]
impl ShardManagerApi for ManagerHandle {
    async fn submit(&self, ctx: CallContext, command: Command) -> Result<Outcome, ManagerError> {
        self.request(|reply| Request::Submit {
            ctx,
            command,
            reply,
        })
        .await
    }

    async fn eligible_proposer(
        &self,
        shard_id: ShardId,
        period: u64,
    ) -> Result<Address, ManagerError> {
        self.request(|reply| Request::EligibleProposer {
            shard_id,
            period,
            reply,
        })
        .await
    }

    async fn shard_head(&self, shard_id: ShardId) -> Result<Hash, ManagerError> {
        self.request(|reply| Request::ShardHead { shard_id, reply })
            .await
    }

    async fn summary(&self) -> Result<StateSummary, ManagerError> {
        self.request(|reply| Request::Summary { reply }).await
    }
}
