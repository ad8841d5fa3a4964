//! # Block Scenarios
//!
//! Fixed-value blocks applied to a four-delegate genesis, checked against
//! exact balances, then reverted.

#[cfg(test)]
mod tests {
    use block_state::{BlockApplyError, BlockStateApi, BlockStateEvent, TransactionError};
    use shared_types::{address_from_public_key, Amount, TransactionBuilder};

    use crate::fixtures::*;

    fn amount(value: u64) -> Amount {
        Amount::from(value)
    }

    // =============================================================================
    // MULTI-PAYMENT
    // =============================================================================

    /// Delegate 2 pays delegates 3 and 4 in one multi-payment; delegate 1
    /// forges the block.
    #[test]
    fn test_multi_payment_block_apply_and_revert() {
        let genesis = four_delegates().with_nonce(delegate(1), 3);
        let engine = engine(genesis);
        let before = engine.store().read().ledger_state();

        let tx = TransactionBuilder::multi_payment()
            .add_payment(delegate(2), amount(100))
            .add_payment(delegate(3), amount(200))
            .sender(DELEGATE_KEYS[1])
            .nonce(3)
            .fee(amount(100))
            .build()
            .unwrap();
        let block = next_block(&engine, DELEGATE_KEYS[0], 100, vec![tx]);

        engine.apply_block(&block).unwrap();

        assert_eq!(balance(&engine, &delegate(0)), amount(300_000_000_000_200));
        assert_eq!(balance(&engine, &delegate(1)), amount(299_999_999_999_600));
        assert_eq!(balance(&engine, &delegate(2)), amount(300_000_000_000_100));
        assert_eq!(balance(&engine, &delegate(3)), amount(300_000_000_000_200));
        assert_eq!(nonce(&engine, &delegate(1)), 4);
        {
            let store = engine.store().read();
            for i in 0..4 {
                let wallet = store.get_by_address(&delegate(i)).unwrap();
                assert_eq!(wallet.vote_balance(), wallet.balance());
            }
        }

        engine.revert_block(&block).unwrap();

        for i in 0..4 {
            assert_eq!(balance(&engine, &delegate(i)), amount(DELEGATE_BALANCE));
        }
        assert_eq!(nonce(&engine, &delegate(1)), 3);
        assert_eq!(engine.store().read().ledger_state(), before);
    }

    #[test]
    fn test_reward_is_only_supply_change() {
        let engine = engine(four_delegates());
        let supply = engine.store().read().total_supply().unwrap();

        let tx = TransactionBuilder::transfer(delegate(3), amount(5_000))
            .sender(DELEGATE_KEYS[2])
            .fee(amount(25))
            .build()
            .unwrap();
        let block = next_block(&engine, DELEGATE_KEYS[0], 500, vec![tx]);
        engine.apply_block(&block).unwrap();

        assert_eq!(engine.store().read().total_supply().unwrap(), supply + amount(500));
    }

    // =============================================================================
    // VOTES AND REGISTRATION
    // =============================================================================

    #[test]
    fn test_vote_switch_moves_weight() {
        let engine = engine(four_delegates());
        let tx = TransactionBuilder::vote(Some(delegate(1)), delegate(2))
            .sender(DELEGATE_KEYS[1])
            .fee(amount(100))
            .build()
            .unwrap();
        let block = next_block(&engine, DELEGATE_KEYS[0], 0, vec![tx]);

        engine.apply_block(&block).unwrap();
        {
            let store = engine.store().read();
            let voter = store.get_by_address(&delegate(1)).unwrap();
            let target = store.get_by_address(&delegate(2)).unwrap();
            let forger = store.get_by_address(&delegate(0)).unwrap();
            assert_eq!(voter.vote(), Some(delegate(2)));
            assert_eq!(voter.vote_balance(), Amount::zero());
            assert_eq!(
                target.vote_balance(),
                amount(DELEGATE_BALANCE) + amount(DELEGATE_BALANCE - 100)
            );
            assert_eq!(forger.vote_balance(), amount(DELEGATE_BALANCE + 100));
            assert!(store.verify_vote_balances().is_ok());
        }

        engine.revert_block(&block).unwrap();
        let store = engine.store().read();
        let voter = store.get_by_address(&delegate(1)).unwrap();
        assert_eq!(voter.vote(), Some(delegate(1)));
        assert_eq!(voter.vote_balance(), amount(DELEGATE_BALANCE));
        assert_eq!(
            store.get_by_address(&delegate(2)).unwrap().vote_balance(),
            amount(DELEGATE_BALANCE)
        );
    }

    #[test]
    fn test_register_then_vote_in_one_block() {
        let newcomer_key = [0x77; 32];
        let newcomer = address_from_public_key(&newcomer_key);
        let engine = engine(four_delegates().with_account(newcomer, amount(10_000)));
        let before = engine.store().read().ledger_state();

        let register = TransactionBuilder::delegate_registration("newcomer")
            .sender(newcomer_key)
            .fee(amount(1_000))
            .build()
            .unwrap();
        let vote = TransactionBuilder::vote(None, newcomer)
            .sender(newcomer_key)
            .nonce(1)
            .fee(amount(100))
            .build()
            .unwrap();
        let block = next_block(&engine, DELEGATE_KEYS[3], 0, vec![register, vote]);

        engine.apply_block(&block).unwrap();
        {
            let store = engine.store().read();
            let wallet = store.find_by_username("newcomer").unwrap();
            assert_eq!(wallet.address(), &newcomer);
            assert_eq!(wallet.vote_balance(), amount(8_900));
        }

        engine.revert_block(&block).unwrap();
        let store = engine.store().read();
        assert!(!store.has_by_username("newcomer"));
        assert_eq!(store.ledger_state(), before);
    }

    // =============================================================================
    // ROLLBACK
    // =============================================================================

    #[test]
    fn test_failing_transaction_rolls_back_block() {
        let (engine, events) = engine_with_events(four_delegates());
        let before = engine.store().read().ledger_state();

        let good = TransactionBuilder::transfer(delegate(3), amount(1_000))
            .sender(DELEGATE_KEYS[1])
            .fee(amount(10))
            .build()
            .unwrap();
        // Skips nonce 1.
        let bad = TransactionBuilder::transfer(delegate(3), amount(1_000))
            .sender(DELEGATE_KEYS[1])
            .nonce(2)
            .fee(amount(10))
            .build()
            .unwrap();
        let block = next_block(&engine, DELEGATE_KEYS[0], 100, vec![good, bad.clone()]);
        let head = engine.get_last_block();

        let err = engine.apply_block(&block).unwrap_err();

        match &err {
            BlockApplyError::Transaction { index, tx_id, source } => {
                assert_eq!(*index, 1);
                assert_eq!(tx_id, &bad.id_hex());
                assert!(matches!(source, TransactionError::NonceMismatch { expected: 1, actual: 2 }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_fatal());
        assert_eq!(engine.store().read().ledger_state(), before);
        assert_eq!(engine.get_last_block(), head);

        let rolled_back: Vec<_> = events
            .events()
            .into_iter()
            .filter_map(|e| match e {
                BlockStateEvent::BlockRolledBack(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(rolled_back.len(), 1);
        assert_eq!(rolled_back[0].failed_transaction.as_deref(), Some(bad.id_hex().as_str()));
        assert_eq!(rolled_back[0].reverted_transactions, 1);
    }
}
