//! # Metrics Exposition
//!
//! Engine and pool counters show up in the Prometheus text output.

#[cfg(test)]
mod tests {
    use block_state::BlockStateApi;
    use ledger_telemetry::{encode_metrics, register_metrics, BLOCKS_APPLIED};
    use tx_pool::{PoolConfig, PoolProcessor, Processor};

    use crate::fixtures::*;

    /// The only test in this crate that registers metrics.
    #[test]
    fn test_engine_and_pool_metrics_exposed() {
        register_metrics().unwrap();
        let engine = engine(four_delegates());
        let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::for_testing());
        let applied_before = BLOCKS_APPLIED.get();

        pool.validate(&[]);
        let block = next_block(&engine, DELEGATE_KEYS[0], 10, vec![]);
        engine.apply_block(&block).unwrap();

        assert!(BLOCKS_APPLIED.get() > applied_before);
        let text = encode_metrics().unwrap();
        assert!(text.contains("ledger_block_state_blocks_applied_total"));
        assert!(text.contains("ledger_block_state_chain_height"));
        assert!(text.contains("ledger_pool_transactions_accepted"));
    }
}
