//! Shared fixtures: four genesis delegates and block helpers.

use block_state::{
    BlockStateApi, BlockStateConfig, BlockStateEngine, GenesisBuilder, InMemoryEventSink,
};
use shared_types::{address_from_public_key, Address, Amount, Block, BlockBuilder, PublicKey, Transaction};
use std::sync::Arc;

pub const DELEGATE_KEYS: [PublicKey; 4] = [[0xD1; 32], [0xD2; 32], [0xD3; 32], [0xD4; 32]];

/// Balance every genesis delegate starts with.
pub const DELEGATE_BALANCE: u64 = 300_000_000_000_000;

pub fn delegate(index: usize) -> Address {
    address_from_public_key(&DELEGATE_KEYS[index])
}

pub fn four_delegates() -> GenesisBuilder {
    DELEGATE_KEYS
        .iter()
        .enumerate()
        .fold(GenesisBuilder::new(), |genesis, (i, key)| {
            genesis.with_delegate(*key, format!("genesis_{}", i + 1), Amount::from(DELEGATE_BALANCE))
        })
}

pub fn engine(genesis: GenesisBuilder) -> Arc<BlockStateEngine> {
    Arc::new(BlockStateEngine::from_genesis(genesis, BlockStateConfig::for_testing()).unwrap())
}

pub fn engine_with_events(genesis: GenesisBuilder) -> (Arc<BlockStateEngine>, Arc<InMemoryEventSink>) {
    let sink = Arc::new(InMemoryEventSink::new());
    let engine = BlockStateEngine::from_genesis(genesis, BlockStateConfig::for_testing())
        .unwrap()
        .with_event_sink(sink.clone());
    (Arc::new(engine), sink)
}

/// Block on top of the engine head.
pub fn next_block(
    engine: &BlockStateEngine,
    forger: PublicKey,
    reward: u64,
    transactions: Vec<Transaction>,
) -> Block {
    BlockBuilder::new(forger)
        .on_top_of(&engine.get_last_block())
        .reward(Amount::from(reward))
        .transactions(transactions)
        .build()
}

pub fn balance(engine: &BlockStateEngine, address: &Address) -> Amount {
    engine
        .store()
        .read()
        .get_by_address(address)
        .map(|w| w.balance())
        .unwrap_or_default()
}

pub fn nonce(engine: &BlockStateEngine, address: &Address) -> u64 {
    engine
        .store()
        .read()
        .get_by_address(address)
        .map(|w| w.nonce())
        .unwrap_or(0)
}
