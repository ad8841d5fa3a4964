//! # Transaction Handlers
//!
//! One handler per transaction kind. A handler knows how to apply its kind's
//! effect to the wallet store and how to revert it exactly.
//!
//! Handlers run every mutation through a [`MutationScope`]: a handler that
//! fails never leaves partial effects behind.

mod delegate_registration;
mod multi_payment;
mod scope;
mod transfer;
mod vote;

pub use delegate_registration::DelegateRegistrationHandler;
pub use multi_payment::MultiPaymentHandler;
pub use scope::MutationScope;
pub use transfer::TransferHandler;
pub use vote::VoteHandler;

use shared_types::{Address, Block, Transaction, TransactionType};
use std::collections::HashMap;

use super::config::BlockStateConfig;
use super::errors::{TransactionError, WalletError};
use super::store::WalletStore;
use super::wallet::Wallet;

/// Block-level facts a handler needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyContext {
    /// Wallet credited with transaction fees.
    pub forger: Address,
    pub height: u64,
}

impl ApplyContext {
    pub fn for_block(block: &Block) -> Self {
        Self {
            forger: block.generator_address(),
            height: block.height(),
        }
    }

    /// Context for dry runs against a scratch store. Fees land on the zero
    /// address.
    pub fn simulation(height: u64) -> Self {
        Self {
            forger: [0u8; 20],
            height,
        }
    }
}

/// Apply/revert capability for one transaction kind.
pub trait TransactionHandler: Send + Sync {
    fn transaction_type(&self) -> TransactionType;

    fn apply(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError>;

    fn revert(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError>;
}

/// Handlers keyed by transaction type.
pub struct HandlerRegistry {
    handlers: HashMap<TransactionType, Box<dyn TransactionHandler>>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in handler.
    pub fn with_defaults(config: &BlockStateConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(TransferHandler));
        registry.register(Box::new(MultiPaymentHandler::new(config.multi_payment_limit)));
        registry.register(Box::new(VoteHandler));
        registry.register(Box::new(DelegateRegistrationHandler));
        registry
    }

    /// Adds or replaces the handler for its transaction type.
    pub fn register(&mut self, handler: Box<dyn TransactionHandler>) {
        self.handlers.insert(handler.transaction_type(), handler);
    }

    pub fn get(&self, tx_type: TransactionType) -> Result<&dyn TransactionHandler, TransactionError> {
        self.handlers
            .get(&tx_type)
            .map(|h| h.as_ref())
            .ok_or(TransactionError::UnknownTransactionType(tx_type))
    }

    pub fn supports(&self, tx_type: TransactionType) -> bool {
        self.handlers.contains_key(&tx_type)
    }

    pub fn apply(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        self.get(tx.transaction_type())?.apply(ctx, tx, store)
    }

    pub fn revert(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        self.get(tx.transaction_type())?.revert(ctx, tx, store)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().collect();
        types.sort();
        f.debug_struct("HandlerRegistry").field("types", &types).finish()
    }
}

// =============================================================================
// Shared checks
// =============================================================================

fn wrong_handler(handler: TransactionType, tx: &Transaction) -> TransactionError {
    TransactionError::WrongHandler {
        handler,
        actual: tx.transaction_type(),
    }
}

/// Before apply the wallet nonce must equal the transaction nonce.
fn ensure_apply_nonce(sender: &Wallet, tx: &Transaction) -> Result<(), TransactionError> {
    if sender.nonce() != tx.nonce {
        return Err(TransactionError::NonceMismatch {
            expected: sender.nonce(),
            actual: tx.nonce,
        });
    }
    Ok(())
}

/// Before revert the wallet nonce must be one past the transaction nonce.
fn ensure_revert_nonce(sender: &Wallet, tx: &Transaction) -> Result<(), TransactionError> {
    let expected = sender
        .nonce()
        .checked_sub(1)
        .ok_or(WalletError::NonceUnderflow {
            address: *sender.address(),
        })?;
    if expected != tx.nonce {
        return Err(TransactionError::NonceMismatch {
            expected,
            actual: tx.nonce,
        });
    }
    Ok(())
}
