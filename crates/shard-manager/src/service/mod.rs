//! Shard Manager Service - single-writer executor
//!
//! # Architecture
//! - All state lives in one `RegistryState` behind one write lock
//! - Every command validates fully before its first write
//! - Collaborators are injected through `ShardManagerDependencies`
//!
//! Commands arrive either through [`ShardManager::apply`] or through the
//! typed methods it dispatches to. The [`mailbox`] module wraps a manager in
//! a tokio task for callers that want a message-passing boundary.

pub mod mailbox;

use crate::adapters::{
    BlockHashRandomness, EcdsaSignatureOracle, InMemoryChain, InMemoryEventLog, InMemoryLedger,
};
use crate::algorithms::{sample_slot, RandomnessCache};
use crate::config::{ConfigError, ManagerConfig};
use crate::domain::{
    address_word, invariant_exact_deposit, invariant_known_shard, shard_word, u64_word,
    withdraw_message, Address, CallContext, CollationHeader, Command, Hash, LogEntry, LogTopic,
    ManagerError, ManagerResult, Outcome, Receipt, ReceiptId, ShardChainEntry, ShardId, SlotIndex,
    StateSummary, Validator, Wei, NO_VALIDATOR,
};
use crate::metrics;
use crate::ports::{
    BalanceLedger, BlockClock, EventLog, RandomnessOracle, ShardManagerApi, SignatureOracle,
};
use crate::state::RegistryState;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shard manager service.
pub struct ShardManager<C, R, S, L, E>
where
    C: BlockClock,
    R: RandomnessOracle,
    S: SignatureOracle,
    L: BalanceLedger,
    E: EventLog,
{
    clock: Arc<C>,
    randomness: Arc<R>,
    signatures: Arc<S>,
    ledger: Arc<L>,
    events: Arc<E>,
    config: ManagerConfig,
    state: RwLock<RegistryState>,
    randomness_cache: Mutex<RandomnessCache>,
}

/// Dependencies for ShardManager
pub struct ShardManagerDependencies<C, R, S, L, E> {
    /// Host chain clock and block hashes
    pub clock: Arc<C>,
    /// Period randomness
    pub randomness: Arc<R>,
    /// Validation code oracle
    pub signatures: Arc<S>,
    /// Value transfers
    pub ledger: Arc<L>,
    /// Event sink
    pub events: Arc<E>,
    /// Manager configuration
    pub config: ManagerConfig,
}

/// Manager wired to the in-memory adapters.
pub type InMemoryShardManager = ShardManager<
    InMemoryChain,
    BlockHashRandomness<InMemoryChain>,
    EcdsaSignatureOracle,
    InMemoryLedger,
    InMemoryEventLog,
>;

impl InMemoryShardManager {
    /// Build a manager over a fresh in-memory chain, ledger and log.
    pub fn in_memory(config: ManagerConfig) -> Result<Self, ConfigError> {
        let clock = Arc::new(InMemoryChain::new());
        let randomness = Arc::new(BlockHashRandomness::new(
            clock.clone(),
            config.period_length,
            config.lookahead_periods,
        ));
        Self::new(ShardManagerDependencies {
            clock,
            randomness,
            signatures: Arc::new(EcdsaSignatureOracle::new()),
            ledger: Arc::new(InMemoryLedger::new()),
            events: Arc::new(InMemoryEventLog::new()),
            config,
        })
    }
}

impl<C, R, S, L, E> ShardManager<C, R, S, L, E>
where
    C: BlockClock,
    R: RandomnessOracle,
    S: SignatureOracle,
    L: BalanceLedger,
    E: EventLog,
{
    /// Create a new ShardManager
    pub fn new(deps: ShardManagerDependencies<C, R, S, L, E>) -> Result<Self, ConfigError> {
        deps.config.validate()?;
        info!(
            "[smc] manager started: {} shards, period length {}, lookahead {}",
            deps.config.shard_count, deps.config.period_length, deps.config.lookahead_periods
        );
        Ok(Self {
            clock: deps.clock,
            randomness: deps.randomness,
            signatures: deps.signatures,
            ledger: deps.ledger,
            events: deps.events,
            config: deps.config,
            state: RwLock::new(RegistryState::new()),
            randomness_cache: Mutex::new(RandomnessCache::new()),
        })
    }

    /// Manager configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Injected clock.
    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Injected ledger.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Injected event log.
    pub fn events(&self) -> &Arc<E> {
        &self.events
    }

    /// Period of the current block.
    pub fn current_period(&self) -> u64 {
        self.config.period_of(self.clock.block_number())
    }

    /// Hash a header for `period` must carry as its period start reference.
    ///
    /// Hash of block `period * period_length - 1`, or of block 0 for period 0.
    pub fn period_start_reference(&self, period: u64) -> Option<Hash> {
        let block = period
            .saturating_mul(self.config.period_length)
            .saturating_sub(1);
        self.clock.block_hash(block)
    }

    // === COMMANDS ===

    /// Apply a command as `ctx.caller`.
    pub fn apply(&self, ctx: CallContext, command: Command) -> ManagerResult<Outcome> {
        debug!(
            "[smc] applying {} from {}",
            command.name(),
            hex::encode(ctx.caller)
        );
        match command {
            Command::Deposit {
                credential,
                withdrawal_address,
            } => self
                .deposit(ctx, credential, withdrawal_address)
                .map(|slot| Outcome::Deposited { slot }),
            Command::Withdraw { slot, signature } => {
                self.withdraw(ctx, slot, &signature).map(Outcome::Withdrawn)
            }
            Command::AddHeader { header } => self
                .add_header(ctx, &header)
                .map(|hash| Outcome::HeaderAdded { hash }),
            Command::TxToShard {
                to,
                shard_id,
                startgas,
                gasprice,
                data,
            } => self
                .tx_to_shard(ctx, to, shard_id, startgas, gasprice, data)
                .map(|receipt_id| Outcome::ReceiptCreated { receipt_id }),
            Command::UpdateGasprice {
                receipt_id,
                gasprice,
            } => self
                .update_gasprice(ctx, receipt_id, gasprice)
                .map(|_| Outcome::GaspriceUpdated),
        }
    }

    /// Register `credential`; `ctx.value` must equal the deposit size.
    ///
    /// The deposit moves from the caller to the manager's custody account.
    pub fn deposit(
        &self,
        ctx: CallContext,
        credential: Address,
        withdrawal_address: Address,
    ) -> ManagerResult<SlotIndex> {
        let mut state = self.state.write();
        let result = self.execute_deposit(&mut state, ctx, credential, withdrawal_address);
        observe("deposit", &result);
        result
    }

    fn execute_deposit(
        &self,
        state: &mut RegistryState,
        ctx: CallContext,
        credential: Address,
        withdrawal_address: Address,
    ) -> ManagerResult<SlotIndex> {
        invariant_exact_deposit(ctx.value, self.config.deposit_size)?;
        state.registry.check_can_register(&credential)?;

        self.ledger
            .transfer(&ctx.caller, &self.config.manager_address, ctx.value)
            .map_err(ManagerError::TransferFailed)?;

        let slot = match state.registry.insert(credential, withdrawal_address, ctx.value) {
            Ok(slot) => slot,
            Err(e) => {
                self.refund(&ctx.caller, ctx.value);
                return Err(e);
            }
        };

        self.emit(
            LogTopic::Deposit,
            vec![address_word(&credential)],
            u64_word(slot).to_vec(),
        );
        metrics::record_deposit();
        info!(
            "[smc] validator {} deposited into slot {}",
            hex::encode(credential),
            slot
        );
        Ok(slot)
    }

    /// Withdraw the validator at `slot`.
    ///
    /// Returns `Ok(false)` without touching state when the slot is empty or
    /// the signature over the withdraw message does not verify.
    pub fn withdraw(
        &self,
        ctx: CallContext,
        slot: SlotIndex,
        signature: &[u8],
    ) -> ManagerResult<bool> {
        let mut state = self.state.write();
        let result = self.execute_withdraw(&mut state, ctx, slot, signature);
        observe("withdraw", &result);
        result
    }

    fn execute_withdraw(
        &self,
        state: &mut RegistryState,
        _ctx: CallContext,
        slot: SlotIndex,
        signature: &[u8],
    ) -> ManagerResult<bool> {
        let validator = match state.registry.get(slot) {
            Some(v) => v.clone(),
            None => {
                debug!("[smc] withdraw from empty slot {}", slot);
                return Ok(false);
            }
        };

        if !self
            .signatures
            .verify(&validator.credential, &withdraw_message(), signature)
        {
            warn!("[smc] withdraw from slot {} with bad signature", slot);
            return Ok(false);
        }

        self.ledger
            .transfer(
                &self.config.manager_address,
                &validator.withdrawal_address,
                validator.deposit,
            )
            .map_err(ManagerError::TransferFailed)?;

        if let Err(e) = state.registry.remove(slot) {
            // Undo the payout; the registry still holds the validator
            if let Err(refund) = self.ledger.transfer(
                &validator.withdrawal_address,
                &self.config.manager_address,
                validator.deposit,
            ) {
                error!("[smc] could not reverse payout for slot {}: {}", slot, refund);
            }
            return Err(e);
        }

        self.emit(
            LogTopic::Withdraw,
            vec![address_word(&validator.credential)],
            u64_word(slot).to_vec(),
        );
        metrics::record_withdrawal();
        info!(
            "[smc] validator {} withdrew from slot {}",
            hex::encode(validator.credential),
            slot
        );
        Ok(true)
    }

    /// Submit an RLP-encoded collation header as `ctx.caller`.
    ///
    /// Checks, in order: decoding, shard, period, period start reference,
    /// duplicate, parent, height, proposer eligibility, signature.
    pub fn add_header(&self, ctx: CallContext, raw: &[u8]) -> ManagerResult<Hash> {
        let mut state = self.state.write();
        let result = self.execute_add_header(&mut state, ctx, raw);
        observe("add_header", &result);
        result
    }

    fn execute_add_header(
        &self,
        state: &mut RegistryState,
        ctx: CallContext,
        raw: &[u8],
    ) -> ManagerResult<Hash> {
        let header = CollationHeader::decode(raw)?;
        invariant_known_shard(header.shard_id, self.config.shard_count)?;

        let period = self.current_period();
        if header.period_number != period {
            return Err(ManagerError::WrongPeriod {
                expected: period,
                got: header.period_number,
            });
        }
        if self.period_start_reference(period) != Some(header.period_start_prevhash) {
            return Err(ManagerError::WrongPeriodStartReference(period));
        }

        let hash = header.hash();
        state.validate_header_link(
            header.shard_id,
            &hash,
            &header.parent_header_hash,
            header.height,
        )?;

        let proposer = self.proposer_in(state, header.shard_id, period)?;
        if proposer != ctx.caller {
            return Err(ManagerError::NotEligibleProposer {
                expected: proposer,
                got: ctx.caller,
            });
        }
        if !self
            .signatures
            .verify(&ctx.caller, &header.signing_hash(), &header.signature)
        {
            return Err(ManagerError::BadSignature);
        }

        let score = state.chain_mut(header.shard_id).record(
            hash,
            header.parent_header_hash,
            header.height,
        )?;

        self.emit(LogTopic::AddHeader, vec![], raw.to_vec());
        metrics::record_header_accepted();
        info!(
            "[smc] shard {} header {} accepted at height {} (score {})",
            header.shard_id,
            hex::encode(&hash[..8]),
            header.height,
            score
        );
        Ok(hash)
    }

    /// Queue a cross-shard call carrying `ctx.value`.
    pub fn tx_to_shard(
        &self,
        ctx: CallContext,
        to: Address,
        shard_id: ShardId,
        startgas: u64,
        gasprice: u64,
        data: Vec<u8>,
    ) -> ManagerResult<ReceiptId> {
        let mut state = self.state.write();
        let result =
            self.execute_tx_to_shard(&mut state, ctx, to, shard_id, startgas, gasprice, data);
        observe("tx_to_shard", &result);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_tx_to_shard(
        &self,
        state: &mut RegistryState,
        ctx: CallContext,
        to: Address,
        shard_id: ShardId,
        startgas: u64,
        gasprice: u64,
        data: Vec<u8>,
    ) -> ManagerResult<ReceiptId> {
        invariant_known_shard(shard_id, self.config.shard_count)?;

        if ctx.value > 0 {
            self.ledger
                .transfer(&ctx.caller, &self.config.manager_address, ctx.value)
                .map_err(ManagerError::TransferFailed)?;
        }

        let receipt_id = state.receipts.push(Receipt {
            shard_id,
            to,
            value: ctx.value,
            startgas,
            gasprice,
            data,
            origin_sender: ctx.caller,
        });

        self.emit(
            LogTopic::TxToShard,
            vec![address_word(&to), shard_word(shard_id)],
            u64_word(receipt_id).to_vec(),
        );
        metrics::record_receipt_created();
        info!(
            "[smc] receipt {} queued for shard {} ({} wei)",
            receipt_id, shard_id, ctx.value
        );
        Ok(receipt_id)
    }

    /// Change the gas price of a receipt; only its origin sender may.
    pub fn update_gasprice(
        &self,
        ctx: CallContext,
        receipt_id: ReceiptId,
        gasprice: u64,
    ) -> ManagerResult<()> {
        let mut state = self.state.write();
        let result = state
            .receipts
            .update_gasprice(receipt_id, &ctx.caller, gasprice);
        if result.is_ok() {
            debug!("[smc] receipt {} gas price set to {}", receipt_id, gasprice);
        }
        observe("update_gasprice", &result);
        result
    }

    // === ELIGIBILITY ===

    /// Validator sampled for `(shard_id, period)`.
    ///
    /// Returns [`NO_VALIDATOR`] when the registry is empty. Does not apply the
    /// lookahead limit; see [`Self::eligible_proposer`].
    pub fn sample(&self, shard_id: ShardId, period: u64) -> ManagerResult<Address> {
        let state = self.state.read();
        self.sample_in(&state, shard_id, period)
    }

    /// Proposer allowed to submit a header for `(shard_id, period)`.
    pub fn eligible_proposer(&self, shard_id: ShardId, period: u64) -> ManagerResult<Address> {
        let state = self.state.read();
        self.proposer_in(&state, shard_id, period)
    }

    /// For every shard, whether `credential` is its sampled proposer in
    /// `period`.
    pub fn shard_list(&self, credential: &Address, period: u64) -> ManagerResult<Vec<bool>> {
        let state = self.state.read();
        (0..self.config.shard_count)
            .map(|shard_id| {
                self.proposer_in(&state, shard_id, period)
                    .map(|proposer| proposer == *credential)
            })
            .collect()
    }

    fn proposer_in(
        &self,
        state: &RegistryState,
        shard_id: ShardId,
        period: u64,
    ) -> ManagerResult<Address> {
        let max_period = self
            .current_period()
            .saturating_add(self.config.lookahead_periods);
        if period > max_period {
            return Err(ManagerError::TooFarAhead { period, max_period });
        }
        invariant_known_shard(shard_id, self.config.shard_count)?;
        if state.registry.count_live() == 0 {
            return Err(ManagerError::NoValidators);
        }

        match self.sample_in(state, shard_id, period)? {
            NO_VALIDATOR => Err(ManagerError::NoValidators),
            proposer => Ok(proposer),
        }
    }

    fn sample_in(
        &self,
        state: &RegistryState,
        shard_id: ShardId,
        period: u64,
    ) -> ManagerResult<Address> {
        invariant_known_shard(shard_id, self.config.shard_count)?;
        if state.registry.count_live() == 0 {
            return Ok(NO_VALIDATOR);
        }

        let seed = self.period_randomness(period)?;
        match sample_slot(&seed, shard_id, state.registry.allocator()) {
            Some(slot) => state
                .registry
                .get(slot)
                .map(|v| v.credential)
                .ok_or_else(|| {
                    ManagerError::InvariantViolation(format!("sampled vacant slot {}", slot))
                }),
            None => Ok(NO_VALIDATOR),
        }
    }

    /// Randomness for `period`.
    ///
    /// Only periods inside the lookahead window around the current period
    /// are cached; older entries are pruned as the clock advances.
    fn period_randomness(&self, period: u64) -> ManagerResult<Hash> {
        let current = self.current_period();
        let floor = current.saturating_sub(self.config.lookahead_periods);
        let ceiling = current.saturating_add(self.config.lookahead_periods);

        let mut cache = self.randomness_cache.lock();
        cache.prune_before(floor);
        let value = if (floor..=ceiling).contains(&period) {
            cache.get_or_fetch(period, |p| self.randomness.period_randomness(p))
        } else {
            self.randomness.period_randomness(period)
        };
        value.ok_or(ManagerError::RandomnessUnavailable(period))
    }

    // === QUERIES ===

    /// Slot high-water mark.
    pub fn get_validators_max_index(&self) -> SlotIndex {
        self.state.read().registry.max_index()
    }

    /// Number of live validators.
    pub fn get_num_validators(&self) -> u64 {
        self.state.read().registry.count_live()
    }

    /// Whether `credential` has a live deposit.
    pub fn get_is_valcode_deposited(&self, credential: &Address) -> bool {
        self.state.read().registry.is_deposited(credential)
    }

    /// Validator occupying `slot`.
    pub fn validator_at(&self, slot: SlotIndex) -> Option<Validator> {
        self.state.read().registry.get(slot).cloned()
    }

    /// Head of a shard chain, or the genesis sentinel.
    pub fn get_shard_head(&self, shard_id: ShardId) -> ManagerResult<Hash> {
        invariant_known_shard(shard_id, self.config.shard_count)?;
        Ok(self.state.read().shard_head(shard_id))
    }

    /// Chain entry of an accepted header.
    pub fn get_collation(&self, shard_id: ShardId, hash: &Hash) -> Option<ShardChainEntry> {
        self.state
            .read()
            .chain(shard_id)
            .and_then(|c| c.get(hash).copied())
    }

    /// Headers accepted on `shard_id` at `height`.
    pub fn get_num_collations_with_score(&self, shard_id: ShardId, height: u64) -> u64 {
        self.state
            .read()
            .chain(shard_id)
            .map_or(0, |c| c.num_with_score(height))
    }

    /// Header accepted on `shard_id` at `height` with the given score.
    pub fn get_collations_with_score(
        &self,
        shard_id: ShardId,
        height: u64,
        score: u64,
    ) -> Option<Hash> {
        self.state
            .read()
            .chain(shard_id)
            .and_then(|c| c.with_score(height, score))
    }

    /// Receipt by id.
    pub fn get_receipt(&self, receipt_id: ReceiptId) -> Option<Receipt> {
        self.state.read().receipts.get(receipt_id).cloned()
    }

    /// Value carried by a receipt.
    pub fn get_receipt_value(&self, receipt_id: ReceiptId) -> Option<Wei> {
        self.state.read().receipts.get(receipt_id).map(|r| r.value)
    }

    /// Current gas price of a receipt.
    pub fn get_receipt_gasprice(&self, receipt_id: ReceiptId) -> Option<u64> {
        self.state.read().receipts.get(receipt_id).map(|r| r.gasprice)
    }

    /// Number of receipts created.
    pub fn num_receipts(&self) -> u64 {
        self.state.read().receipts.len() as u64
    }

    /// Snapshot of the manager's counters.
    pub fn state_summary(&self) -> StateSummary {
        let block_number = self.clock.block_number();
        let state = self.state.read();
        StateSummary {
            block_number,
            period: self.config.period_of(block_number),
            max_index: state.registry.max_index(),
            num_validators: state.registry.count_live(),
            active_shards: state.chains.values().filter(|c| !c.is_empty()).count(),
            total_headers: state.total_headers(),
            num_receipts: state.receipts.len() as u64,
        }
    }

    // === HELPERS ===

    fn emit(&self, topic: LogTopic, mut topics: Vec<Hash>, data: Vec<u8>) {
        topics.insert(0, topic.hash());
        self.events
            .append(LogEntry::new(self.clock.block_number(), topics, data));
    }

    fn refund(&self, to: &Address, amount: Wei) {
        if let Err(e) = self
            .ledger
            .transfer(&self.config.manager_address, to, amount)
        {
            error!("[smc] refund of {} to {} failed: {}", amount, hex::encode(to), e);
        }
    }
}

/// Log and count a rejected command.
fn observe<T>(command: &str, result: &ManagerResult<T>) {
    if let Err(e) = result {
        warn!("[smc] {} rejected: {}", command, e);
        metrics::record_rejected(command, e.kind());
    }
}

#[async_trait]
impl<C, R, S, L, E> ShardManagerApi for ShardManager<C, R, S, L, E>
where
    C: BlockClock,
    R: RandomnessOracle,
    S: SignatureOracle,
    L: BalanceLedger,
    E: EventLog,
{
    async fn submit(&self, ctx: CallContext, command: Command) -> Result<Outcome, ManagerError> {
        self.apply(ctx, command)
    }

    async fn eligible_proposer(
        &self,
        shard_id: ShardId,
        period: u64,
    ) -> Result<Address, ManagerError> {
        ShardManager::eligible_proposer(self, shard_id, period)
    }

    async fn shard_head(&self, shard_id: ShardId) -> Result<Hash, ManagerError> {
        self.get_shard_head(shard_id)
    }

    async fn summary(&self) -> Result<StateSummary, ManagerError> {
        Ok(self.state_summary())
    }
}
