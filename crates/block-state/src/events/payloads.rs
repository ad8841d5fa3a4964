use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, BlockId};

/// Published after a block and its reward are fully applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAppliedPayload {
    pub block_id: BlockId,
    pub height: u64,
    pub forger: Address,
    pub transaction_count: u32,
    pub total_fee: Amount,
    /// Sum of transferred amounts, excluding fees.
    pub total_amount: Amount,
    pub reward: Amount,
}

/// Published after the head block is reverted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRevertedPayload {
    pub block_id: BlockId,
    pub height: u64,
    pub new_head: BlockId,
}

/// Published when a block failed part way and its applied transactions
/// were reverted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRolledBackPayload {
    pub block_id: BlockId,
    pub height: u64,
    /// Hex id of the transaction that failed, if a transaction failed.
    pub failed_transaction: Option<String>,
    pub reason: String,
    /// Number of transactions that had been applied and were undone.
    pub reverted_transactions: u32,
}

/// Events emitted by the block state engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum BlockStateEvent {
    BlockApplied(BlockAppliedPayload),
    BlockReverted(BlockRevertedPayload),
    BlockRolledBack(BlockRolledBackPayload),
}

impl BlockStateEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::BlockApplied(_) => topics::BLOCK_APPLIED,
            Self::BlockReverted(_) => topics::BLOCK_REVERTED,
            Self::BlockRolledBack(_) => topics::BLOCK_ROLLED_BACK,
        }
    }

    pub fn height(&self) -> u64 {
        match self {
            Self::BlockApplied(p) => p.height,
            Self::BlockReverted(p) => p.height,
            Self::BlockRolledBack(p) => p.height,
        }
    }
}

/// Topics for block state events.
pub mod topics {
    pub const BLOCK_APPLIED: &str = "block_state.block_applied";
    pub const BLOCK_REVERTED: &str = "block_state.block_reverted";
    pub const BLOCK_ROLLED_BACK: &str = "block_state.block_rolled_back";
}
