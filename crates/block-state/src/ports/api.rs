use shared_types::Block;

use crate::domain::{BlockApplyError, BlockRevertError};

/// Primary API of the block state engine.
///
/// Both mutating calls are all-or-nothing: on error the wallet state is the
/// same as before the call, except for [`BlockApplyError::Integrity`] and
/// [`BlockRevertError::Integrity`].
pub trait BlockStateApi: Send + Sync {
    /// Applies every transaction of `block` in order, then credits the block
    /// reward to the forger.
    fn apply_block(&self, block: &Block) -> Result<(), BlockApplyError>;

    /// Reverts `block`, which must be the current head.
    fn revert_block(&self, block: &Block) -> Result<(), BlockRevertError>;

    /// Most recently applied block, or genesis.
    fn get_last_block(&self) -> Block;
}
