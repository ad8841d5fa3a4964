use shared_types::{Transaction, TransactionAsset, TransactionType, VoteAsset};

use super::{
    ensure_apply_nonce, ensure_revert_nonce, wrong_handler, ApplyContext, MutationScope,
    TransactionHandler,
};
use crate::domain::errors::TransactionError;
use crate::domain::store::WalletStore;

fn vote_asset(tx: &Transaction) -> Result<&VoteAsset, TransactionError> {
    match &tx.asset {
        TransactionAsset::Vote(asset) => Ok(asset),
        _ => Err(wrong_handler(TransactionType::Vote, tx)),
    }
}

/// Casts, switches or withdraws the sender's delegate vote.
///
/// `unvote` must name the sender's current vote (or be empty when there is
/// none). The fee is debited while the old vote is still in place, then the
/// remaining balance moves to the new delegate.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoteHandler;

impl TransactionHandler for VoteHandler {
    fn transaction_type(&self) -> TransactionType {
        TransactionType::Vote
    }

    fn apply(
        &self,
        ctx: &ApplyContext,
        tx: &Transaction,
        store: &mut WalletStore,
    ) -> Result<(), TransactionError> {
        let asset = vote_asset(tx)?;
        match (asset.unvote, asset.vote) {
            (None, None) => {
                return Err(TransactionError::InvalidAsset(
                    "vote names neither a vote nor an unvote".into(),
                ))
            }
            (Some(old), Some(new)) if old == new => {
                return Err(TransactionError::InvalidAsset(
                    "vote and unvote name the same delegate".into(),
                ))
            }
            _ => {}
        }

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_apply_nonce(sender, tx)?;
        if sender.vote() != asset.unvote {
            return Err(TransactionError::VoteMismatch {
                current: sender.vote(),
                unvote: asset.unvote,
            });
        }
        let sender = *sender.address();

        scope.debit(&sender, tx.fee)?;
        scope.credit(&ctx.forger, tx.fee)?;
        scope.set_vote(&sender, asset.vote)?;
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
        let asset = vote_asset(tx)?;

        let mut scope = MutationScope::new(store);
        let sender = scope.sender(&tx.sender_public_key);
        ensure_revert_nonce(sender, tx)?;
        if sender.vote() != asset.vote {
            return Err(TransactionError::VoteMismatch {
                current: sender.vote(),
                unvote: asset.vote,
            });
        }
        let sender = *sender.address();

        scope.decrement_nonce(&sender)?;
        scope.set_vote(&sender, asset.unvote)?;
        scope.debit(&ctx.forger, tx.fee)?;
        scope.credit(&sender, tx.fee)?;
        scope.commit();
        Ok(())
    }
}
