//! Pool error codes.
//!
//! Codes are the `type` field of a [`TransactionErrorResponse`] and keep
//! their legacy wire spelling.
//!
//! [`TransactionErrorResponse`]: super::value_objects::TransactionErrorResponse

use block_state::{TransactionError, WalletError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason a transaction was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PoolErrorType {
    /// Already accepted, or repeated within the batch.
    #[error("ERR_DUPLICATE")]
    #[serde(rename = "ERR_DUPLICATE")]
    Duplicate,

    /// Pool or per-sender capacity reached.
    #[error("ERR_POOL_FULL")]
    #[serde(rename = "ERR_POOL_FULL")]
    PoolFull,

    /// Handler rejected the transaction for another reason.
    #[error("ERR_APPLY")]
    #[serde(rename = "ERR_APPLY")]
    Apply,

    #[error("ERR_INSUFFICIENT_BALANCE")]
    #[serde(rename = "ERR_INSUFFICIENT_BALANCE")]
    InsufficientBalance,

    #[error("ERR_NONCE")]
    #[serde(rename = "ERR_NONCE")]
    Nonce,

    /// No handler for the transaction type.
    #[error("ERR_UNSUPPORTED")]
    #[serde(rename = "ERR_UNSUPPORTED")]
    Unsupported,

    #[error("ERR_LOW_FEE")]
    #[serde(rename = "ERR_LOW_FEE")]
    LowFee,
}

impl PoolErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Duplicate => "ERR_DUPLICATE",
            Self::PoolFull => "ERR_POOL_FULL",
            Self::Apply => "ERR_APPLY",
            Self::InsufficientBalance => "ERR_INSUFFICIENT_BALANCE",
            Self::Nonce => "ERR_NONCE",
            Self::Unsupported => "ERR_UNSUPPORTED",
            Self::LowFee => "ERR_LOW_FEE",
        }
    }

    /// True for codes that land in `excess` rather than `invalid`.
    pub fn is_excess(&self) -> bool {
        matches!(self, Self::Duplicate | Self::PoolFull)
    }
}

impl From<&TransactionError> for PoolErrorType {
    fn from(error: &TransactionError) -> Self {
        match error {
            TransactionError::Wallet(WalletError::InsufficientBalance { .. }) => {
                Self::InsufficientBalance
            }
            TransactionError::NonceMismatch { .. }
            | TransactionError::Wallet(WalletError::NonceUnderflow { .. })
            | TransactionError::Wallet(WalletError::NonceOverflow { .. }) => Self::Nonce,
            TransactionError::UnknownTransactionType(_) => Self::Unsupported,
            _ => Self::Apply,
        }
    }
}
