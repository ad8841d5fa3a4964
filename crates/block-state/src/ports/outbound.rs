//! Outbound (Driven) ports for the block state engine.

use shared_types::BlockId;
use thiserror::Error;

use crate::domain::WalletStore;
use crate::events::BlockStateEvent;

/// Error type for publish operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Event sink not connected")]
    NotConnected,

    #[error("Event sink rejected {topic}: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Destination for block state events.
///
/// Publishing failures never undo state changes; the engine logs them.
pub trait BlockStateEventSink: Send + Sync {
    fn publish(&self, event: BlockStateEvent) -> Result<(), PublishError>;
}

/// Read-only view of committed wallet state, used by the transaction pool.
pub trait WalletStateReader: Send + Sync {
    /// Private copy of the committed wallet table.
    fn snapshot(&self) -> WalletStore;

    /// Height of the last applied block.
    fn last_height(&self) -> u64;

    /// Id of the last applied block. Changes on every apply and revert, so
    /// a reader can tell when its snapshot is stale.
    fn last_block_id(&self) -> BlockId;
}
