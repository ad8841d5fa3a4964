//! # Block State Engine
//!
//! Applies and reverts whole blocks against the shared wallet store.
//!
//! ## Apply
//!
//! 1. Check the block extends the current head.
//! 2. Apply every transaction in order through its handler. Each handler
//!    credits its fee to the forger.
//! 3. On the first failure, revert the already applied transactions in
//!    reverse order and return the failure with the transaction id.
//! 4. Credit the block reward and record forging statistics.
//! 5. With auditing on, recompute vote weights and roll the whole block back
//!    if they disagree.
//!
//! ## Revert
//!
//! Exact inverse of apply, for the current head only: remove the reward,
//! then revert transactions in reverse order. A revert that fails part way
//! re-applies what it already undid, so the block stays the head.
//!
//! A mutation scope whose undo fails leaves an integrity fault on the store;
//! the engine turns it into a fatal `Integrity` error.

use ledger_telemetry::{
    log_block_event, HistogramTimer, BLOCKS_APPLIED, BLOCKS_REVERTED, BLOCK_APPLY_DURATION,
    BLOCK_ROLLBACKS, CHAIN_HEIGHT, TRANSACTIONS_APPLIED,
};
use parking_lot::Mutex;
use shared_types::{Block, BlockId};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::adapters::{NoOpEventSink, SharedWalletStore};
use crate::domain::{
    ApplyContext, BlockApplyError, BlockRevertError, BlockStateConfig, GenesisBuilder,
    HandlerRegistry, MutationScope, TransactionError, WalletError, WalletStore,
};
use crate::events::{
    BlockAppliedPayload, BlockRevertedPayload, BlockRolledBackPayload, BlockStateEvent,
};
use crate::ports::{BlockStateApi, BlockStateEventSink, WalletStateReader};

const COMPONENT: &str = "block-state";

/// Applied blocks that can still be reverted, on top of an anchor that
/// cannot.
#[derive(Debug)]
struct ChainHistory {
    /// Genesis, or the newest block evicted from `applied`.
    anchor: Block,
    applied: VecDeque<Block>,
}

impl ChainHistory {
    fn head(&self) -> &Block {
        self.applied.back().unwrap_or(&self.anchor)
    }

    fn push(&mut self, block: Block, max_retained: usize) {
        self.applied.push_back(block);
        while self.applied.len() > max_retained {
            if let Some(evicted) = self.applied.pop_front() {
                self.anchor = evicted;
            }
        }
    }
}

/// The block state engine.
pub struct BlockStateEngine {
    store: SharedWalletStore,
    registry: Arc<HandlerRegistry>,
    config: BlockStateConfig,
    chain: Mutex<ChainHistory>,
    events: Arc<dyn BlockStateEventSink>,
}

impl BlockStateEngine {
    /// Engine over `store`, whose state must correspond to `genesis`.
    pub fn new(store: WalletStore, genesis: Block, config: BlockStateConfig) -> Self {
        CHAIN_HEIGHT.set(genesis.height() as i64);
        Self {
            store: SharedWalletStore::new(store),
            registry: Arc::new(HandlerRegistry::with_defaults(&config)),
            config,
            chain: Mutex::new(ChainHistory {
                anchor: genesis,
                applied: VecDeque::new(),
            }),
            events: Arc::new(NoOpEventSink),
        }
    }

    pub fn from_genesis(
        genesis: GenesisBuilder,
        config: BlockStateConfig,
    ) -> Result<Self, WalletError> {
        let (store, block) = genesis.build()?;
        Ok(Self::new(store, block, config))
    }

    pub fn with_event_sink(mut self, events: Arc<dyn BlockStateEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the default handler set.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn store(&self) -> &SharedWalletStore {
        &self.store
    }

    pub fn registry(&self) -> Arc<HandlerRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &BlockStateConfig {
        &self.config
    }

    /// Number of blocks that can currently be reverted.
    pub fn revertible_depth(&self) -> usize {
        self.chain.lock().applied.len()
    }

    // =========================================================================
    // APPLY
    // =========================================================================

    #[instrument(skip(self, block), fields(height = block.height(), block_id = %block.id_hex()))]
    fn apply(&self, block: &Block) -> Result<(), BlockApplyError> {
        let _timer = HistogramTimer::new(&BLOCK_APPLY_DURATION);
        if !block.has_consistent_ids() {
            return Err(BlockApplyError::IdMismatch {
                block_id: block.id_hex(),
            });
        }
        let mut store = self.store.write();
        let mut chain = self.chain.lock();

        let head = chain.head();
        if block.header.previous_block != Some(head.id) {
            return Err(BlockApplyError::NotChained {
                block_id: block.id_hex(),
                head_id: head.id_hex(),
            });
        }
        if block.height() != head.height() + 1 {
            return Err(BlockApplyError::HeightMismatch {
                head: head.height(),
                actual: block.height(),
            });
        }

        let ctx = ApplyContext::for_block(block);
        for (index, tx) in block.transactions.iter().enumerate() {
            if let Err(source) = self.registry.apply(&ctx, tx, &mut store) {
                take_undo_fault(&mut store).map_err(|fault| BlockApplyError::Integrity {
                    block_id: block.id_hex(),
                    tx_id: Some(tx.id_hex()),
                    source: fault.into(),
                })?;
                let failure = BlockApplyError::Transaction {
                    index,
                    tx_id: tx.id_hex(),
                    source,
                };
                self.roll_back(&mut store, block, &ctx, index)?;
                drop(chain);
                drop(store);
                self.report_rollback(block, &failure, index);
                return Err(failure);
            }
            debug!(index, tx_id = %tx.id_hex(), "[block-state] transaction applied");
        }

        let applied = block.transactions.len();
        if let Err(source) = credit_reward(&mut store, block) {
            take_undo_fault(&mut store).map_err(|fault| BlockApplyError::Integrity {
                block_id: block.id_hex(),
                tx_id: None,
                source: fault.into(),
            })?;
            let failure = BlockApplyError::Reward {
                block_id: block.id_hex(),
                source,
            };
            self.roll_back(&mut store, block, &ctx, applied)?;
            drop(chain);
            drop(store);
            self.report_rollback(block, &failure, applied);
            return Err(failure);
        }

        if self.config.audit_vote_weights {
            if let Err(source) = store.verify_vote_balances() {
                let failure = BlockApplyError::Audit {
                    block_id: block.id_hex(),
                    source,
                };
                remove_reward(&mut store, block).map_err(|source| BlockApplyError::Integrity {
                    block_id: block.id_hex(),
                    tx_id: None,
                    source: source.into(),
                })?;
                self.roll_back(&mut store, block, &ctx, applied)?;
                drop(chain);
                drop(store);
                self.report_rollback(block, &failure, applied);
                return Err(failure);
            }
        }

        chain.push(block.clone(), self.config.max_retained_blocks);
        drop(chain);
        drop(store);

        BLOCKS_APPLIED.inc();
        TRANSACTIONS_APPLIED.inc_by(block.transactions.len() as u64);
        CHAIN_HEIGHT.set(block.height() as i64);
        log_block_event!(
            info,
            COMPONENT,
            "Block applied",
            block.height(),
            block.id_hex(),
            transactions = block.transactions.len()
        );

        self.publish(BlockStateEvent::BlockApplied(BlockAppliedPayload {
            block_id: block.id,
            height: block.height(),
            forger: block.generator_address(),
            transaction_count: block.transactions.len() as u32,
            total_fee: block.total_fee().unwrap_or_default(),
            total_amount: block.total_amount().unwrap_or_default(),
            reward: block.header.reward,
        }));
        Ok(())
    }

    /// Reverts the first `applied` transactions of `block`, newest first.
    fn roll_back(
        &self,
        store: &mut WalletStore,
        block: &Block,
        ctx: &ApplyContext,
        applied: usize,
    ) -> Result<(), BlockApplyError> {
        for tx in block.transactions[..applied].iter().rev() {
            self.registry.revert(ctx, tx, store).map_err(|source| {
                error!(
                    tx_id = %tx.id_hex(),
                    error = %source,
                    "[block-state] rollback failed, wallet state is corrupted"
                );
                BlockApplyError::Integrity {
                    block_id: block.id_hex(),
                    tx_id: Some(tx.id_hex()),
                    source,
                }
            })?;
        }
        Ok(())
    }

    fn report_rollback(&self, block: &Block, failure: &BlockApplyError, reverted: usize) {
        let reason = match failure {
            BlockApplyError::Transaction { source, .. } => source.reason(),
            BlockApplyError::Reward { .. } => "reward",
            BlockApplyError::Audit { .. } => "audit",
            _ => "other",
        };
        BLOCK_ROLLBACKS.with_label_values(&[reason]).inc();
        log_block_event!(
            warn,
            COMPONENT,
            "Block rolled back",
            block.height(),
            block.id_hex(),
            reason = reason,
            error = %failure
        );
        self.publish(BlockStateEvent::BlockRolledBack(BlockRolledBackPayload {
            block_id: block.id,
            height: block.height(),
            failed_transaction: failure.failed_transaction().map(str::to_string),
            reason: failure.to_string(),
            reverted_transactions: reverted as u32,
        }));
    }

    // =========================================================================
    // REVERT
    // =========================================================================

    #[instrument(skip(self, block), fields(height = block.height(), block_id = %block.id_hex()))]
    fn revert(&self, block: &Block) -> Result<(), BlockRevertError> {
        let mut store = self.store.write();
        let mut chain = self.chain.lock();

        // The whole block must match, not just its id.
        match chain.applied.back() {
            Some(head) if head == block => {}
            _ => {
                return Err(BlockRevertError::RevertWithoutPriorApply {
                    block_id: block.id,
                    head_id: chain.head().id_hex(),
                })
            }
        }

        let corrupted = |source: TransactionError| {
            error!(
                block_id = %block.id_hex(),
                error = %source,
                "[block-state] could not restore block, wallet state is corrupted"
            );
            BlockRevertError::Integrity {
                block_id: block.id_hex(),
                source,
            }
        };

        if let Err(source) = remove_reward(&mut store, block) {
            take_undo_fault(&mut store).map_err(|fault| corrupted(fault.into()))?;
            return Err(BlockRevertError::Reward {
                block_id: block.id_hex(),
                source,
            });
        }

        let ctx = ApplyContext::for_block(block);
        for (index, tx) in block.transactions.iter().enumerate().rev() {
            if let Err(source) = self.registry.revert(&ctx, tx, &mut store) {
                take_undo_fault(&mut store).map_err(|fault| corrupted(fault.into()))?;
                self.reapply(&mut store, block, &ctx, index + 1)
                    .map_err(corrupted)?;
                return Err(BlockRevertError::Transaction {
                    block_id: block.id_hex(),
                    tx_id: tx.id_hex(),
                    source,
                });
            }
        }

        if self.config.audit_vote_weights {
            if let Err(source) = store.verify_vote_balances() {
                self.reapply(&mut store, block, &ctx, 0).map_err(corrupted)?;
                return Err(BlockRevertError::Audit {
                    block_id: block.id_hex(),
                    source,
                });
            }
        }

        chain.applied.pop_back();
        let new_head = chain.head().id;
        let new_height = chain.head().height();
        drop(chain);
        drop(store);

        BLOCKS_REVERTED.inc();
        CHAIN_HEIGHT.set(new_height as i64);
        log_block_event!(info, COMPONENT, "Block reverted", block.height(), block.id_hex());

        self.publish(BlockStateEvent::BlockReverted(BlockRevertedPayload {
            block_id: block.id,
            height: block.height(),
            new_head,
        }));
        Ok(())
    }

    /// Re-applies transactions `from..` and the reward, so a block whose
    /// revert stopped part way is fully applied again.
    fn reapply(
        &self,
        store: &mut WalletStore,
        block: &Block,
        ctx: &ApplyContext,
        from: usize,
    ) -> Result<(), TransactionError> {
        for tx in &block.transactions[from..] {
            let outcome = self.registry.apply(ctx, tx, store);
            take_undo_fault(store)?;
            outcome?;
        }
        let outcome = credit_reward(store, block);
        take_undo_fault(store)?;
        Ok(outcome?)
    }

    fn publish(&self, event: BlockStateEvent) {
        let topic = event.topic();
        if let Err(e) = self.events.publish(event) {
            warn!(topic, error = %e, "[block-state] failed to publish event");
        }
    }
}

/// Fails with the fault left by a scope whose undo failed, if any.
fn take_undo_fault(store: &mut WalletStore) -> Result<(), WalletError> {
    match store.take_integrity_fault() {
        Some(fault) => Err(fault),
        None => Ok(()),
    }
}

/// Credits the reward and records forging statistics as one step.
fn credit_reward(store: &mut WalletStore, block: &Block) -> Result<(), WalletError> {
    let forger = *store
        .find_by_public_key(&block.header.generator_public_key)
        .address();
    let fees = block
        .total_fee()
        .ok_or(WalletError::BalanceOverflow { address: forger })?;

    let mut scope = MutationScope::new(store);
    scope.credit(&forger, block.header.reward)?;
    scope.record_forged_block(&forger, fees, block.header.reward)?;
    scope.commit();
    Ok(())
}

fn remove_reward(store: &mut WalletStore, block: &Block) -> Result<(), WalletError> {
    let forger = block.generator_address();
    let fees = block
        .total_fee()
        .ok_or(WalletError::BalanceOverflow { address: forger })?;

    let mut scope = MutationScope::new(store);
    scope.unrecord_forged_block(&forger, fees, block.header.reward)?;
    scope.debit(&forger, block.header.reward)?;
    scope.commit();
    Ok(())
}

impl BlockStateApi for BlockStateEngine {
    fn apply_block(&self, block: &Block) -> Result<(), BlockApplyError> {
        self.apply(block)
    }

    fn revert_block(&self, block: &Block) -> Result<(), BlockRevertError> {
        self.revert(block)
    }

    fn get_last_block(&self) -> Block {
        self.chain.lock().head().clone()
    }
}

impl WalletStateReader for BlockStateEngine {
    fn snapshot(&self) -> WalletStore {
        self.store.snapshot()
    }

    fn last_height(&self) -> u64 {
        self.chain.lock().head().height()
    }

    fn last_block_id(&self) -> BlockId {
        self.chain.lock().head().id
    }
}

impl std::fmt::Debug for BlockStateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStateEngine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
