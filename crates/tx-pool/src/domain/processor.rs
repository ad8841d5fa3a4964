//! # Pool Processor
//!
//! Classifies candidate transactions against committed wallet state without
//! mutating it.
//!
//! ## Pipeline
//!
//! 1. Stateless pre-checks run in parallel: handler registered, fee at or
//!    above `min_fee`, total cost representable.
//! 2. A sequential pass in batch order: repeated copies within the batch
//!    are skipped, transactions already pooled and capacity go to `excess`;
//!    everything else is applied to a private snapshot of the committed
//!    store. A handler error puts the transaction in `invalid`.
//!
//! The snapshot carries the effects of every accepted transaction, so a
//! sender can queue consecutive nonces across batches. When the chain head
//! moves, the next batch starts from a fresh snapshot and the pooled
//! transactions are replayed on it; those that no longer apply are dropped.
//! [`PoolProcessor::reset`] drops everything instead.

use block_state::{ApplyContext, HandlerRegistry, WalletStateReader, WalletStore};
use ledger_telemetry::{log_tx_event, POOL_OUTCOMES, POOL_SIZE};
use rayon::prelude::*;
use shared_types::{Address, BlockId, Transaction, TransactionId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::entities::PoolConfig;
use super::errors::PoolErrorType;
use super::value_objects::{ErrorMap, ProcessorResult, TransactionErrorResponse};
use crate::ports::Processor;

const COMPONENT: &str = "tx_pool";

/// Reference [`Processor`] backed by a [`WalletStateReader`].
pub struct PoolProcessor<R: WalletStateReader> {
    reader: Arc<R>,
    registry: Arc<HandlerRegistry>,
    config: PoolConfig,
    snapshot: Option<WalletStore>,
    /// Head the snapshot was taken at.
    base_head: Option<BlockId>,
    base_height: u64,
    accepted: Vec<Transaction>,
    accepted_ids: HashSet<TransactionId>,
    per_sender: HashMap<Address, usize>,
    broadcast: Vec<Transaction>,
    errors: ErrorMap,
}

impl<R: WalletStateReader> PoolProcessor<R> {
    pub fn new(reader: Arc<R>, registry: Arc<HandlerRegistry>, config: PoolConfig) -> Self {
        Self {
            reader,
            registry,
            config,
            snapshot: None,
            base_head: None,
            base_height: 0,
            accepted: Vec::new(),
            accepted_ids: HashSet::new(),
            per_sender: HashMap::new(),
            broadcast: Vec::new(),
            errors: ErrorMap::new(),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of accepted transactions held.
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Drops the snapshot, the accepted set and recorded errors.
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.base_head = None;
        self.base_height = 0;
        self.accepted.clear();
        self.accepted_ids.clear();
        self.per_sender.clear();
        self.broadcast.clear();
        self.errors.clear();
        POOL_SIZE.set(0);
        debug!(component = COMPONENT, "Pool processor reset");
    }

    fn precheck(&self, tx: &Transaction) -> Result<(), (PoolErrorType, String)> {
        let tx_type = tx.transaction_type();
        if !self.registry.supports(tx_type) {
            return Err((
                PoolErrorType::Unsupported,
                format!("No handler registered for transaction type {tx_type}"),
            ));
        }
        if tx.fee < self.config.min_fee {
            return Err((
                PoolErrorType::LowFee,
                format!("Fee {} is below the minimum {}", tx.fee, self.config.min_fee),
            ));
        }
        if tx.total_cost().is_none() {
            return Err((
                PoolErrorType::Apply,
                "Amount overflow computing transaction cost".to_string(),
            ));
        }
        Ok(())
    }

    fn at_capacity(&self, sender: &Address) -> Option<String> {
        if self.accepted.len() >= self.config.max_transactions {
            return Some(format!(
                "Pool holds {} transactions, the maximum",
                self.config.max_transactions
            ));
        }
        let pending = self.per_sender.get(sender).copied().unwrap_or(0);
        if pending >= self.config.max_per_sender {
            return Some(format!(
                "Sender already has {pending} pending transactions"
            ));
        }
        None
    }

    /// Snapshot matching the current chain head. A stale or faulted
    /// snapshot is replaced, and the pooled transactions are replayed on the
    /// new one.
    fn resync(&mut self) -> WalletStore {
        let head = self.reader.last_block_id();
        if let Some(snapshot) = self.snapshot.take() {
            if self.base_head == Some(head) && !snapshot.has_integrity_fault() {
                return snapshot;
            }
        }

        self.base_head = Some(head);
        self.base_height = self.reader.last_height();
        let mut snapshot = self.reader.snapshot();
        let ctx = ApplyContext::simulation(self.base_height.saturating_add(1));

        let pooled = std::mem::take(&mut self.accepted);
        let held = pooled.len();
        self.accepted_ids.clear();
        self.per_sender.clear();
        for tx in pooled {
            match self.registry.apply(&ctx, &tx, &mut snapshot) {
                Ok(()) => self.hold(tx),
                Err(e) => {
                    log_tx_event!(debug, COMPONENT, "Pooled transaction dropped", tx.id_hex(), reason = %e);
                }
            }
        }
        let accepted_ids = &self.accepted_ids;
        self.broadcast.retain(|tx| accepted_ids.contains(&tx.id));
        POOL_SIZE.set(self.accepted.len() as i64);
        debug!(
            component = COMPONENT,
            height = self.base_height,
            kept = self.accepted.len(),
            dropped = held - self.accepted.len(),
            "Snapshot refreshed"
        );
        snapshot
    }

    fn hold(&mut self, tx: Transaction) {
        self.accepted_ids.insert(tx.id);
        *self.per_sender.entry(tx.sender_address()).or_insert(0) += 1;
        self.accepted.push(tx);
    }

    fn accept(&mut self, tx: &Transaction, result: &mut ProcessorResult) {
        let id = tx.id_hex();
        self.hold(tx.clone());
        if self.config.broadcast_accepted {
            self.broadcast.push(tx.clone());
            result.broadcast.push(id.clone());
        }
        log_tx_event!(debug, COMPONENT, "Transaction accepted", id, nonce = tx.nonce);
        result.accept.push(id);
    }

    fn reject(
        &mut self,
        tx: &Transaction,
        code: PoolErrorType,
        message: String,
        batch_errors: &mut ErrorMap,
        result: &mut ProcessorResult,
    ) {
        let id = tx.id_hex();
        log_tx_event!(debug, COMPONENT, "Transaction rejected", id, code = %code, reason = %message);
        let response = TransactionErrorResponse::from_code(code, message);
        batch_errors.entry(id.clone()).or_default().push(response.clone());
        self.errors.entry(id.clone()).or_default().push(response);
        if code.is_excess() {
            result.excess.push(id);
        } else {
            result.invalid.push(id);
        }
    }
}

impl<R: WalletStateReader> Processor for PoolProcessor<R> {
    #[instrument(skip(self, transactions), fields(count = transactions.len()))]
    fn validate(&mut self, transactions: &[Transaction]) -> ProcessorResult {
        let prechecks: Vec<_> = transactions
            .par_iter()
            .map(|tx| self.precheck(tx))
            .collect();

        let mut snapshot = self.resync();
        let ctx = ApplyContext::simulation(self.base_height.saturating_add(1));

        let mut result = ProcessorResult::default();
        let mut batch_errors = ErrorMap::new();
        let mut seen = HashSet::with_capacity(transactions.len());

        for (tx, precheck) in transactions.iter().zip(prechecks) {
            if !seen.insert(tx.id) {
                continue;
            }
            if self.accepted_ids.contains(&tx.id) {
                let message = "Transaction is already in the pool".to_string();
                self.reject(tx, PoolErrorType::Duplicate, message, &mut batch_errors, &mut result);
                continue;
            }
            if let Err((code, message)) = precheck {
                self.reject(tx, code, message, &mut batch_errors, &mut result);
                continue;
            }
            if let Some(message) = self.at_capacity(&tx.sender_address()) {
                self.reject(tx, PoolErrorType::PoolFull, message, &mut batch_errors, &mut result);
                continue;
            }
            match self.registry.apply(&ctx, tx, &mut snapshot) {
                Ok(()) => self.accept(tx, &mut result),
                Err(e) => {
                    let code = PoolErrorType::from(&e);
                    self.reject(tx, code, e.to_string(), &mut batch_errors, &mut result);
                }
            }
        }

        self.snapshot = Some(snapshot);

        POOL_OUTCOMES
            .with_label_values(&["accept"])
            .inc_by(result.accept.len() as u64);
        POOL_OUTCOMES
            .with_label_values(&["invalid"])
            .inc_by(result.invalid.len() as u64);
        POOL_OUTCOMES
            .with_label_values(&["excess"])
            .inc_by(result.excess.len() as u64);
        POOL_SIZE.set(self.accepted.len() as i64);

        debug!(
            component = COMPONENT,
            accepted = result.accept.len(),
            invalid = result.invalid.len(),
            excess = result.excess.len(),
            "Batch validated"
        );

        if !batch_errors.is_empty() {
            result.errors = Some(batch_errors);
        }
        result
    }

    fn get_transactions(&self) -> &[Transaction] {
        &self.accepted
    }

    fn get_broadcast_transactions(&self) -> &[Transaction] {
        &self.broadcast
    }

    fn get_errors(&self) -> &ErrorMap {
        &self.errors
    }

    fn push_error(&mut self, transaction: &Transaction, error_type: &str, message: &str) {
        self.errors
            .entry(transaction.id_hex())
            .or_default()
            .push(TransactionErrorResponse::new(error_type, message));
    }
}

impl<R: WalletStateReader> std::fmt::Debug for PoolProcessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolProcessor")
            .field("config", &self.config)
            .field("accepted", &self.accepted.len())
            .field("base_height", &self.base_height)
            .field("synced", &self.base_head.is_some())
            .finish()
    }
}
