use shared_types::{Address, Amount, Transaction, TransactionAsset, TransactionType};

use super::{
    ensure_apply_nonce, ensure_revert_nonce, wrong_handler, ApplyContext, MutationScope,
    TransactionHandler,
};
use crate::domain::errors::TransactionError;
use crate::domain::store::WalletStore;

fn transfer_asset(tx: &Transaction) -> Result<(Address, Amount), TransactionError> {
    match &tx.asset {
        TransactionAsset::Transfer { recipient, amount } => Ok((*recipient, *amount)),
        _ => Err(wrong_handler(TransactionType::Transfer, tx)),
    }
}

/// Moves `amount` from sender to recipient; the fee goes to the forger.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransferHandler;

impl TransactionHandler for TransferHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Transfer
    }

    fn apply(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        let (recipient, amount) = transfer_asset(tx)?;
        if amount.is_zero() {
            return Err(TransactionError::InvalidAsset("transfer amount is zero".into()));
        }
        let total = tx.total_cost().ok_or(TransactionError::AmountOverflow)?;

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_apply_nonce(sender, tx)?;
        let sender = *sender.address();

        scope.debit(&sender, total)?;
        scope.credit(&recipient, amount)?;
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
        let (recipient, amount) = transfer_asset(tx)?;
        let total = tx.total_cost().ok_or(TransactionError::AmountOverflow)?;

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_revert_nonce(sender, tx)?;
        let sender = *sender.address();

        scope.decrement_nonce(&sender)?;
        scope.debit(&ctx.forger, tx.fee)?;
        scope.debit(&recipient, amount)?;
        scope.credit(&sender, total)?;
        scope.commit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::WalletError;
    use crate::domain::handlers::test_support::*;
    use shared_types::TransactionBuilder;

    fn transfer(amount: u64, fee: u64, nonce: u64) -> Transaction {
        TransactionBuilder::transfer(RECIPIENT, Amount::from(amount))
            .fee(Amount::from(fee))
            .nonce(nonce)
            .sender(SENDER_KEY)
            .build()
            .unwrap()
    }

    #[test]
    fn test_apply_moves_amount_and_fee() {
        let mut store = funded_store(1_000);
        TransferHandler.apply(&ctx(), &transfer(300, 10, 0), &mut store).unwrap();

        let sender = store.get_by_address(&sender()).unwrap();
        assert_eq!(sender.balance(), Amount::from(690u64));
        assert_eq!(sender.nonce(), 1);
        assert_eq!(store.get_by_address(&RECIPIENT).unwrap().balance(), Amount::from(300u64));
        assert_eq!(store.get_by_address(&FORGER).unwrap().balance(), Amount::from(10u64));
    }

    #[test]
    fn test_apply_then_revert_restores_state() {
        let mut store = funded_store(1_000);
        let before = store.ledger_state();
        let tx = transfer(300, 10, 0);
        TransferHandler.apply(&ctx(), &tx, &mut store).unwrap();
        TransferHandler.revert(&ctx(), &tx, &mut store).unwrap();
        assert_eq!(store.ledger_state(), before);
    }

    #[test]
    fn test_insufficient_balance_leaves_no_trace() {
        let mut store = funded_store(100);
        let before = store.ledger_state();
        let err = TransferHandler
            .apply(&ctx(), &transfer(95, 10, 0), &mut store)
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Wallet(WalletError::InsufficientBalance { .. })
        ));
        assert_eq!(store.ledger_state(), before);
    }

    #[test]
    fn test_nonce_must_match() {
        let mut store = funded_store(1_000);
        let err = TransferHandler
            .apply(&ctx(), &transfer(1, 1, 1), &mut store)
            .unwrap_err();
        assert_eq!(err, TransactionError::NonceMismatch { expected: 0, actual: 1 });

        // reverting something never applied
        let err = TransferHandler
            .revert(&ctx(), &transfer(1, 1, 0), &mut store)
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Wallet(WalletError::NonceUnderflow { .. })
        ));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut store = funded_store(1_000);
        let err = TransferHandler
            .apply(&ctx(), &transfer(0, 1, 0), &mut store)
            .unwrap_err();
        assert!(matches!(err, TransactionError::InvalidAsset(_)));
    }

    #[test]
    fn test_self_transfer_costs_only_the_fee() {
        let mut store = funded_store(1_000);
        let tx = TransactionBuilder::transfer(sender(), Amount::from(500u64))
            .fee(Amount::from(5u64))
            .sender(SENDER_KEY)
            .build()
            .unwrap();
        TransferHandler.apply(&ctx(), &tx, &mut store).unwrap();
        assert_eq!(
            store.get_by_address(&sender()).unwrap().balance(),
            Amount::from(995u64)
        );
    }
}
