//! smc-sim: drive a shard manager through a few periods in memory.
//!
//! Registers validators, lets each period's sampled proposer extend every
//! shard chain, queues cross-shard receipts, withdraws one validator half way
//! through, and prints the final state summary as JSON.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use k256::ecdsa::SigningKey;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shard_manager::domain::{keccak256, withdraw_message};
use shard_manager::{
    credential_of, sign_hash, spawn_mailbox, Address, BlockClock, CallContext, CollationHeader,
    Command, InMemoryShardManager, ManagerConfig, Outcome, ShardManagerApi,
};

/// smc-sim: in-memory shard manager simulation
#[derive(Parser, Debug)]
#[command(name = "smc-sim")]
#[command(about = "Simulate validator deposits, proposer sampling and header submission")]
struct Args {
    /// Number of validators to register
    #[arg(short, long, default_value = "8")]
    validators: u8,

    /// Number of periods to run
    #[arg(short, long, default_value = "6")]
    periods: u64,

    /// Override the shard count from the environment
    #[arg(short, long)]
    shards: Option<u16>,

    /// Print the summary as compact JSON
    #[arg(long)]
    compact: bool,
}

struct SimValidator {
    key: SigningKey,
    credential: Address,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let mut config = ManagerConfig::from_env();
    if let Some(shards) = args.shards {
        config.shard_count = shards;
    }
    let period_length = config.period_length;
    let deposit_size = config.deposit_size;

    let manager = Arc::new(InMemoryShardManager::in_memory(config)?);
    let (handle, task) = spawn_mailbox(manager.clone());

    let validators = (0..args.validators)
        .map(|i| {
            let key = SigningKey::from_slice(&keccak256(&[b'v', i]))
                .map_err(|e| anyhow!("validator key {}: {}", i, e))?;
            let credential = credential_of(key.verifying_key());
            Ok(SimValidator { key, credential })
        })
        .collect::<Result<Vec<_>>>()?;

    for v in &validators {
        manager.ledger().credit(v.credential, deposit_size);
        let outcome = handle
            .submit(
                CallContext::new(v.credential).with_value(deposit_size),
                Command::Deposit {
                    credential: v.credential,
                    withdrawal_address: v.credential,
                },
            )
            .await?;
        info!("deposit {}: {:?}", hex::encode(v.credential), outcome);
    }

    let sender: Address = [0x5E; 20];
    manager.ledger().credit(sender, 1_000_000);

    for round in 0..args.periods {
        let period = manager.current_period();

        for shard_id in 0..manager.config().shard_count {
            let proposer = match handle.eligible_proposer(shard_id, period).await {
                Ok(proposer) => proposer,
                Err(e) => {
                    warn!("shard {} period {}: {}", shard_id, period, e);
                    continue;
                }
            };
            let Some(signer) = validators.iter().find(|v| v.credential == proposer) else {
                warn!("shard {}: proposer {} not simulated", shard_id, hex::encode(proposer));
                continue;
            };

            let parent = handle.shard_head(shard_id).await?;
            let height = manager
                .get_collation(shard_id, &parent)
                .map_or(1, |entry| entry.height + 1);
            let raw = build_header(&manager, shard_id, period, parent, height, signer)?;

            match handle
                .submit(CallContext::new(proposer), Command::AddHeader { header: raw })
                .await
            {
                Ok(Outcome::HeaderAdded { hash }) => {
                    info!("shard {} height {} head {}", shard_id, height, hex::encode(&hash[..8]))
                }
                Ok(other) => warn!("unexpected outcome {:?}", other),
                Err(e) => warn!("shard {} header rejected: {}", shard_id, e),
            }
        }

        handle
            .submit(
                CallContext::new(sender).with_value(100),
                Command::TxToShard {
                    to: [0x70; 20],
                    shard_id: (round % manager.config().shard_count as u64) as u16,
                    startgas: 21_000,
                    gasprice: 1 + round,
                    data: round.to_be_bytes().to_vec(),
                },
            )
            .await?;

        if round == args.periods / 2 {
            if let Some(v) = validators.first() {
                let signature = sign_hash(&v.key, &withdraw_message())
                    .map_err(|e| anyhow!("withdraw signature: {}", e))?;
                let outcome = handle
                    .submit(
                        CallContext::new(v.credential),
                        Command::Withdraw { slot: 0, signature },
                    )
                    .await?;
                info!("withdraw slot 0: {:?}", outcome);
            }
        }

        manager.clock().mine(period_length);
    }

    let summary = handle.summary().await?;
    info!("simulation finished at block {}", manager.clock().block_number());
    let json = if args.compact {
        serde_json::to_string(&summary)?
    } else {
        serde_json::to_string_pretty(&summary)?
    };
    println!("{}", json);

    drop(handle);
    task.await?;
    Ok(())
}

fn build_header(
    manager: &InMemoryShardManager,
    shard_id: u16,
    period: u64,
    parent: [u8; 32],
    height: u64,
    signer: &SimValidator,
) -> Result<Vec<u8>> {
    let period_start_prevhash = manager
        .period_start_reference(period)
        .ok_or_else(|| anyhow!("no period start block for period {}", period))?;

    let mut header = CollationHeader {
        shard_id,
        period_number: period,
        period_start_prevhash,
        parent_header_hash: parent,
        tx_list_root: keccak256(&height.to_be_bytes()),
        coinbase: signer.credential,
        post_state_root: keccak256(&parent),
        receipt_root: [0u8; 32],
        height,
        signature: Vec::new(),
    };
    header.signature = sign_hash(&signer.key, &header.signing_hash())
        .map_err(|e| anyhow!("header signature: {}", e))?;
    Ok(header.encode())
}
