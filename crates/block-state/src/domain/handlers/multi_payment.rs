use shared_types::{Payment, Transaction, TransactionAsset, TransactionType};

use super::{
    ensure_apply_nonce, ensure_revert_nonce, wrong_handler, ApplyContext, MutationScope,
    TransactionHandler,
};
use crate::domain::errors::TransactionError;
use crate::domain::store::WalletStore;

/// Pays several recipients from one sender in a single transaction.
///
/// The sender is debited `sum(payments) + fee` once; recipients are credited
/// in declared order and debited in reverse declared order on revert.
#[derive(Clone, Copy, Debug)]
pub struct MultiPaymentHandler {
    max_payments: usize,
}

impl MultiPaymentHandler {
    pub const MIN_PAYMENTS: usize = 2;

    pub fn new(max_payments: usize) -> Self {
        Self { max_payments }
    }

    fn payments<'t>(&self, tx: &'t Transaction) -> Result<&'t [Payment], TransactionError> {
        let TransactionAsset::MultiPayment { payments } = &tx.asset else {
            return Err(wrong_handler(TransactionType::MultiPayment, tx));
        };
        if payments.len() < Self::MIN_PAYMENTS || payments.len() > self.max_payments {
            return Err(TransactionError::InvalidAsset(format!(
                "multi-payment carries {} payments, allowed {}..={}",
                payments.len(),
                Self::MIN_PAYMENTS,
                self.max_payments
            )));
        }
        if let Some(index) = payments.iter().position(|p| p.amount.is_zero()) {
            return Err(TransactionError::InvalidAsset(format!(
                "payment {index} has zero amount"
            )));
        }
        Ok(payments)
    }
}

impl Default for MultiPaymentHandler {
    fn default() -> Self {
        Self::new(256)
    }
}

impl TransactionHandler for MultiPaymentHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::MultiPayment
    }

    fn apply(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        let payments = self.payments(tx)?;
        let total = tx.total_cost().ok_or(TransactionError::AmountOverflow)?;

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_apply_nonce(sender, tx)?;
        let sender = *sender.address();

        scope.debit(&sender, total)?;
        for payment in payments {
            scope.credit(&payment.recipient, payment.amount)?;
        }
        scope.credit(&ctx.forger, tx.fee)?;
        scope.increment_nonce(&sender)?;
        scope.commit();
        Ok(())
    }

    fn revert(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        let TransactionAsset::MultiPayment { payments } = &tx.asset else {
            return Err(wrong_handler(TransactionType::MultiPayment, tx));
        };
        let total = tx.total_cost().ok_or(TransactionError::AmountOverflow)?;

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_revert_nonce(sender, tx)?;
        let sender = *sender.address();

        scope.decrement_nonce(&sender)?;
        scope.debit(&ctx.forger, tx.fee)?;
        for payment in payments.iter().rev() {
            scope.debit(&payment.recipient, payment.amount)?;
        }
        scope.credit(&sender, total)?;
        scope.commit();
        Ok(())
    }
}
