//! # Pool to Engine Flow
//!
//! Transactions accepted by the pool processor are packed into a block and
//! applied by the engine. The pool never mutates committed state and
//! follows the head: once a block lands, pooled transactions it made stale
//! are dropped.

#[cfg(test)]
mod tests {
    use block_state::{BlockStateApi, WalletStateReader};
    use shared_types::{Amount, TransactionBuilder};
    use tx_pool::{PoolConfig, PoolProcessor, Processor};

    use crate::fixtures::*;

    fn transfer(sender: usize, nonce: u64, amount: u64) -> shared_types::Transaction {
        TransactionBuilder::transfer(delegate(3), Amount::from(amount))
            .sender(DELEGATE_KEYS[sender])
            .nonce(nonce)
            .fee(Amount::from(10u64))
            .build()
            .unwrap()
    }

    #[test]
    fn test_accepted_transactions_apply_cleanly() {
        let engine = engine(four_delegates());
        let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::for_testing());
        let committed = engine.store().read().ledger_state();

        let batch = vec![transfer(1, 0, 500), transfer(1, 1, 500), transfer(2, 0, 700)];
        let result = pool.validate(&batch);

        assert_eq!(result.accept.len(), 3);
        assert_eq!(engine.store().read().ledger_state(), committed);

        let block = next_block(&engine, DELEGATE_KEYS[0], 100, pool.get_transactions().to_vec());
        engine.apply_block(&block).unwrap();
        assert_eq!(engine.last_height(), 2);
        assert_eq!(nonce(&engine, &delegate(1)), 2);
    }

    #[test]
    fn test_reset_after_head_moves() {
        let engine = engine(four_delegates());
        let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::for_testing());

        let tx = transfer(1, 0, 500);
        pool.validate(&[tx.clone()]);
        let block = next_block(&engine, DELEGATE_KEYS[0], 0, vec![tx.clone()]);
        engine.apply_block(&block).unwrap();
        pool.reset();

        let replay = pool.validate(&[tx.clone()]);
        assert_eq!(replay.invalid, vec![tx.id_hex()]);
        assert_eq!(replay.error_types(&tx.id_hex()), vec!["ERR_NONCE"]);

        let next = transfer(1, 1, 500);
        assert_eq!(pool.validate(&[next]).accept.len(), 1);
    }

    #[test]
    fn test_pool_follows_head_without_reset() {
        let engine = engine(four_delegates());
        let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::for_testing());

        let included = transfer(1, 0, 500);
        let pending = transfer(2, 0, 700);
        assert_eq!(pool.validate(&[included.clone(), pending.clone()]).accept.len(), 2);

        let block = next_block(&engine, DELEGATE_KEYS[0], 0, vec![included.clone()]);
        engine.apply_block(&block).unwrap();

        // Same sender and nonce as the included transaction.
        let stale = transfer(1, 0, 400);
        let result = pool.validate(&[stale.clone()]);
        assert_eq!(result.invalid, vec![stale.id_hex()]);
        assert_eq!(result.error_types(&stale.id_hex()), vec!["ERR_NONCE"]);

        let pooled: Vec<_> = pool.get_transactions().iter().map(|tx| tx.id).collect();
        assert_eq!(pooled, vec![pending.id]);
        let relayed: Vec<_> = pool.get_broadcast_transactions().iter().map(|tx| tx.id).collect();
        assert_eq!(relayed, vec![pending.id]);

        assert_eq!(pool.validate(&[transfer(1, 1, 400)]).accept.len(), 1);
        let next = next_block(&engine, DELEGATE_KEYS[0], 0, pool.get_transactions().to_vec());
        engine.apply_block(&next).unwrap();
    }

    #[test]
    fn test_pool_rejects_what_engine_would_reject() {
        let engine = engine(four_delegates());
        let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::for_testing());

        let overspend = transfer(1, 0, DELEGATE_BALANCE);
        let result = pool.validate(&[overspend.clone()]);
        assert_eq!(result.error_types(&overspend.id_hex()), vec!["ERR_INSUFFICIENT_BALANCE"]);

        let block = next_block(&engine, DELEGATE_KEYS[0], 0, vec![overspend]);
        assert!(engine.apply_block(&block).is_err());
    }

    #[test]
    fn test_result_wire_form() {
        let engine = engine(four_delegates());
        let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::for_testing());
        let good = transfer(1, 0, 1);
        let bad = transfer(2, 5, 1);

        let json: serde_json::Value =
            serde_json::from_str(&pool.validate(&[good.clone(), bad.clone()]).to_json().unwrap()).unwrap();

        assert_eq!(json["accept"][0], good.id_hex());
        assert_eq!(json["broadcast"][0], good.id_hex());
        assert_eq!(json["invalid"][0], bad.id_hex());
        assert_eq!(json["errors"][bad.id_hex()][0]["type"], "ERR_NONCE");
    }
}
