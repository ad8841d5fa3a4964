//! # State Properties
//!
//! Randomised blocks of transfers, multi-payments, vote changes and
//! delegate registrations between genesis delegates and two plain voters:
//!
//! - reverting an applied block restores the exact ledger state
//! - every delegate's vote weight equals the sum of its voters' balances
//! - each sender's nonce advances by exactly its transaction count
//! - a block with a failing transaction leaves no trace

#[cfg(test)]
mod tests {
    use block_state::{BlockApplyError, BlockStateApi, GenesisBuilder, TransactionError, WalletError};
    use proptest::prelude::*;
    use shared_types::{address_from_public_key, Address, Amount, PublicKey, Transaction, TransactionBuilder};
    use std::collections::HashMap;

    use crate::fixtures::*;

    const VOTER_KEYS: [PublicKey; 2] = [[0xA1; 32], [0xA2; 32]];
    const VOTER_BALANCE: u64 = 1_000_000;

    fn all_keys() -> Vec<PublicKey> {
        DELEGATE_KEYS.iter().chain(VOTER_KEYS.iter()).copied().collect()
    }

    fn genesis() -> GenesisBuilder {
        VOTER_KEYS
            .iter()
            .enumerate()
            .fold(four_delegates(), |genesis, (i, key)| {
                let voter = address_from_public_key(key);
                genesis
                    .with_account(voter, Amount::from(VOTER_BALANCE))
                    .with_vote(voter, delegate(i))
            })
    }

    #[derive(Clone, Debug)]
    enum Op {
        Transfer { from: usize, to: usize, amount: u64, fee: u64 },
        Revote { voter: usize, to: usize },
        MultiPayment { from: usize, payments: Vec<(usize, u64)>, fee: u64 },
        Register { voter: usize },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0usize..6, 0usize..6, 1u64..10_000, 0u64..100)
                .prop_map(|(from, to, amount, fee)| Op::Transfer { from, to, amount, fee }),
            1 => (0usize..2, 0usize..4).prop_map(|(voter, to)| Op::Revote { voter, to }),
            1 => (
                0usize..6,
                proptest::collection::vec((0usize..6, 1u64..5_000), 2..4),
                0u64..100,
            )
                .prop_map(|(from, payments, fee)| Op::MultiPayment { from, payments, fee }),
            1 => (0usize..2).prop_map(|voter| Op::Register { voter }),
        ]
    }

    /// Builds transactions with per-sender nonces. Revotes track the
    /// current vote and each voter registers at most once, so that every
    /// transaction is valid.
    fn build(ops: &[Op]) -> (Vec<Transaction>, HashMap<Address, u64>) {
        let keys = all_keys();
        let mut nonces: HashMap<Address, u64> = HashMap::new();
        let mut votes: Vec<usize> = vec![0, 1];
        let mut registered = [false; 2];
        let mut txs = Vec::new();

        for op in ops {
            let (key, builder) = match op {
                Op::Transfer { from, to, amount, fee } => {
                    let recipient = address_from_public_key(&keys[*to]);
                    let builder = TransactionBuilder::transfer(recipient, Amount::from(*amount))
                        .fee(Amount::from(*fee));
                    (keys[*from], builder)
                }
                Op::Revote { voter, to } => {
                    if votes[*voter] == *to {
                        continue;
                    }
                    let builder = TransactionBuilder::vote(Some(delegate(votes[*voter])), delegate(*to));
                    votes[*voter] = *to;
                    (VOTER_KEYS[*voter], builder)
                }
                Op::MultiPayment { from, payments, fee } => {
                    let builder = payments
                        .iter()
                        .fold(TransactionBuilder::multi_payment(), |builder, (to, amount)| {
                            builder.add_payment(address_from_public_key(&keys[*to]), Amount::from(*amount))
                        })
                        .fee(Amount::from(*fee));
                    (keys[*from], builder)
                }
                Op::Register { voter } => {
                    if registered[*voter] {
                        continue;
                    }
                    registered[*voter] = true;
                    let builder = TransactionBuilder::delegate_registration(format!("voter_{voter}"))
                        .fee(Amount::from(25u64));
                    (VOTER_KEYS[*voter], builder)
                }
            };
            let sender = address_from_public_key(&key);
            let nonce = nonces.entry(sender).or_insert(0);
            let tx = builder.sender(key).nonce(*nonce).build().unwrap();
            *nonce += 1;
            txs.push(tx);
        }
        (txs, nonces)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_revert_restores_state(ops in proptest::collection::vec(op(), 1..16), reward in 0u64..1_000) {
            let engine = engine(genesis());
            let before = engine.store().read().ledger_state();
            let (txs, _) = build(&ops);
            let block = next_block(&engine, DELEGATE_KEYS[0], reward, txs);

            engine.apply_block(&block).unwrap();
            engine.revert_block(&block).unwrap();

            prop_assert_eq!(engine.store().read().ledger_state(), before);
        }

        #[test]
        fn prop_vote_weight_conserved(ops in proptest::collection::vec(op(), 1..16)) {
            let engine = engine(genesis());
            let (txs, _) = build(&ops);
            let block = next_block(&engine, DELEGATE_KEYS[2], 50, txs);

            engine.apply_block(&block).unwrap();

            let store = engine.store().read();
            prop_assert!(store.verify_vote_balances().is_ok());
            let weight = store
                .delegates()
                .fold(Amount::zero(), |acc, d| acc + d.vote_balance());
            // Every wallet votes, so total weight is total supply.
            prop_assert_eq!(Some(weight), store.total_supply());
        }

        #[test]
        fn prop_nonces_advance_by_count(ops in proptest::collection::vec(op(), 1..16)) {
            let engine = engine(genesis());
            let (txs, counts) = build(&ops);
            let block = next_block(&engine, DELEGATE_KEYS[1], 0, txs);

            engine.apply_block(&block).unwrap();

            for (sender, count) in counts {
                prop_assert_eq!(nonce(&engine, &sender), count);
            }
        }

        #[test]
        fn prop_failed_block_leaves_no_trace(
            ops in proptest::collection::vec(op(), 1..12),
            position in any::<prop::sample::Index>(),
        ) {
            let engine = engine(genesis());
            let before = engine.store().read().ledger_state();
            let (mut txs, _) = build(&ops);
            let at = position.index(txs.len() + 1);
            // Correct nonce, so the balance check is what fails.
            let spender = VOTER_KEYS[1];
            let nonce = txs[..at]
                .iter()
                .filter(|tx| tx.sender_public_key == spender)
                .count() as u64;
            let overspend = TransactionBuilder::transfer(delegate(0), Amount::from(VOTER_BALANCE * 10))
                .sender(spender)
                .nonce(nonce)
                .build()
                .unwrap();
            txs.insert(at, overspend);
            let block = next_block(&engine, DELEGATE_KEYS[0], 100, txs);

            let err = engine.apply_block(&block).unwrap_err();

            prop_assert_eq!(err.failed_transaction().map(str::to_string), Some(block.transactions[at].id_hex()));
            let is_overspend = matches!(
                &err,
                BlockApplyError::Transaction {
                    source: TransactionError::Wallet(WalletError::InsufficientBalance { .. }),
                    ..
                }
            );
            prop_assert!(is_overspend, "unexpected error: {}", err);
            prop_assert_eq!(engine.store().read().ledger_state(), before);
        }
    }
}
