use shared_types::{to_hex, Address, Amount, BlockId, TransactionType};
use thiserror::Error;

fn addr(address: &Address) -> String {
    to_hex(address)
}

/// Failures of a single wallet store primitive. A failing primitive leaves
/// the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Insufficient balance in {}: required {required}, available {available}", addr(.address))]
    InsufficientBalance {
        address: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Balance overflow crediting {}", addr(.address))]
    BalanceOverflow { address: Address },

    #[error("Vote balance of delegate {} would go negative", addr(.delegate))]
    VoteBalanceUnderflow { delegate: Address },

    #[error("Wallet {} is not a registered delegate", addr(.address))]
    NotADelegate { address: Address },

    #[error("Wallet {} is already a delegate", addr(.address))]
    AlreadyDelegate { address: Address },

    #[error("Delegate username already taken: {username}")]
    UsernameTaken { username: String },

    #[error("Delegate {} still carries vote weight {vote_balance}", addr(.address))]
    DelegateHasVotes { address: Address, vote_balance: Amount },

    #[error("Wallet not found: {}", addr(.address))]
    WalletNotFound { address: Address },

    #[error("Nonce underflow for wallet {}", addr(.address))]
    NonceUnderflow { address: Address },

    #[error("Nonce overflow for wallet {}", addr(.address))]
    NonceOverflow { address: Address },

    #[error("Forging statistics of delegate {} would go negative", addr(.delegate))]
    ForgedStatsUnderflow { delegate: Address },

    #[error("Unknown attribute: {key}")]
    UnknownAttribute { key: String },

    #[error("Attribute {key} is managed by the wallet store")]
    ManagedAttribute { key: String },

    #[error("Attribute {key} has type {actual}, expected {expected}")]
    AttributeTypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Vote weight mismatch for delegate {}: stored {stored}, computed {computed}", addr(.delegate))]
    VoteWeightMismatch {
        delegate: Address,
        stored: Amount,
        computed: Amount,
    },
}

/// Failures of a transaction handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: u64, actual: u64 },

    #[error("No handler registered for transaction type {0}")]
    UnknownTransactionType(TransactionType),

    #[error("Handler for {handler} cannot process a {actual} transaction")]
    WrongHandler {
        handler: TransactionType,
        actual: TransactionType,
    },

    #[error("Invalid transaction asset: {0}")]
    InvalidAsset(String),

    #[error("Vote mismatch: wallet votes for {}, transaction unvotes {}", fmt_vote(.current), fmt_vote(.unvote))]
    VoteMismatch {
        current: Option<Address>,
        unvote: Option<Address>,
    },

    #[error("Amount overflow computing transaction cost")]
    AmountOverflow,
}

fn fmt_vote(vote: &Option<Address>) -> String {
    vote.as_ref().map(|a| to_hex(a)).unwrap_or_else(|| "nobody".to_string())
}

impl TransactionError {
    /// True for failures caused by the transaction itself rather than by
    /// corrupted state or a protocol mismatch.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::UnknownTransactionType(_)
                | Self::WrongHandler { .. }
                | Self::Wallet(WalletError::VoteBalanceUnderflow { .. })
                | Self::Wallet(WalletError::VoteWeightMismatch { .. })
                | Self::Wallet(WalletError::ForgedStatsUnderflow { .. })
        )
    }

    /// Short label used for metrics and pool error codes.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Wallet(WalletError::InsufficientBalance { .. }) => "insufficient_balance",
            Self::NonceMismatch { .. } => "nonce",
            Self::UnknownTransactionType(_) => "unknown_type",
            _ => "other",
        }
    }
}

/// Failure of `apply_block`. Wallet state is always restored to its
/// pre-call value before one of these is returned, except for `Integrity`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockApplyError {
    #[error("Transaction {tx_id} (index {index}) failed: {source}")]
    Transaction {
        index: usize,
        tx_id: String,
        #[source]
        source: TransactionError,
    },

    #[error("Block {block_id} does not extend the chain head {head_id}")]
    NotChained { block_id: String, head_id: String },

    #[error("Block height {actual} does not follow head height {head}")]
    HeightMismatch { head: u64, actual: u64 },

    /// The block id, or one of its transaction ids, does not hash its content.
    #[error("Block {block_id} ids do not match its content")]
    IdMismatch { block_id: String },

    #[error("Crediting reward of block {block_id} failed: {source}")]
    Reward {
        block_id: String,
        #[source]
        source: WalletError,
    },

    /// The post-apply vote weight audit failed. The block is rolled back
    /// before this is returned.
    #[error("Vote weight audit failed after applying block {block_id}: {source}")]
    Audit {
        block_id: String,
        #[source]
        source: WalletError,
    },

    /// Undoing part of the block failed. State lineage is corrupted and the
    /// node must stop. `tx_id` is unset when the reward step failed.
    #[error("Rollback of block {block_id} failed: {source}")]
    Integrity {
        block_id: String,
        tx_id: Option<String>,
        #[source]
        source: TransactionError,
    },
}

impl BlockApplyError {
    /// Id of the transaction that caused the failure, if any.
    pub fn failed_transaction(&self) -> Option<&str> {
        match self {
            Self::Transaction { tx_id, .. } => Some(tx_id),
            Self::Integrity { tx_id, .. } => tx_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Integrity { .. } | Self::Audit { .. } => true,
            Self::Transaction { source, .. } => !source.is_recoverable(),
            _ => false,
        }
    }
}

/// Failure of `revert_block`. Every variant is fatal: it means the caller
/// asked to revert something this engine never applied, or state diverged.
/// Except for `Integrity`, the block is still fully applied and still the
/// head when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockRevertError {
    #[error("Block {} was not applied by this engine (head is {head_id})", to_hex(.block_id))]
    RevertWithoutPriorApply { block_id: BlockId, head_id: String },

    #[error("Reverting transaction {tx_id} of block {block_id} failed: {source}")]
    Transaction {
        block_id: String,
        tx_id: String,
        #[source]
        source: TransactionError,
    },

    #[error("Removing reward of block {block_id} failed: {source}")]
    Reward {
        block_id: String,
        #[source]
        source: WalletError,
    },

    #[error("Vote weight audit failed after reverting block {block_id}: {source}")]
    Audit {
        block_id: String,
        #[source]
        source: WalletError,
    },

    /// Restoring the block after a failed revert, or undoing a partial step,
    /// failed. The block is neither applied nor reverted.
    #[error("Wallet state of block {block_id} is corrupted: {source}")]
    Integrity {
        block_id: String,
        #[source]
        source: TransactionError,
    },
}
