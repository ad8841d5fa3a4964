use shared_types::{Transaction, TransactionAsset, TransactionType};

use super::{
    ensure_apply_nonce, ensure_revert_nonce, wrong_handler, ApplyContext, MutationScope,
    TransactionHandler,
};
use crate::domain::errors::TransactionError;
use crate::domain::store::WalletStore;

const MAX_USERNAME_LEN: usize = 20;

/// Lowercase alphanumerics plus `!@$&_.`, 1 to 20 characters.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"!@$&_.".contains(&b))
}

fn username(tx: &Transaction) -> Result<&str, TransactionError> {
    match &tx.asset {
        TransactionAsset::DelegateRegistration { username } => Ok(username),
        _ => Err(wrong_handler(TransactionType::DelegateRegistration, tx)),
    }
}

/// Registers the sender as a delegate under a unique username.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelegateRegistrationHandler;

impl TransactionHandler for DelegateRegistrationHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::DelegateRegistration
    }

    fn apply(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        let username = username(tx)?;
        if !is_valid_username(username) {
            return Err(TransactionError::InvalidAsset(format!(
                "invalid delegate username {username:?}"
            )));
        }

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_apply_nonce(sender, tx)?;
        let sender = *sender.address();

        scope.debit(&sender, tx.fee)?;
        scope.credit(&ctx.forger, tx.fee)?;
        scope.register_delegate(&sender, username)?;
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
        let username = username(tx)?;

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_revert_nonce(sender, tx)?;
        if sender.username() != Some(username) {
            return Err(TransactionError::InvalidAsset(format!(
                "sender is not registered as {username:?}"
            )));
        }
        let sender = *sender.address();

        scope.decrement_nonce(&sender)?;
        scope.unregister_delegate(&sender)?;
        scope.debit(&ctx.forger, tx.fee)?;
        scope.credit(&sender, tx.fee)?;
        scope.commit();
        Ok(())
    }
}
