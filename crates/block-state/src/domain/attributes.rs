//! # Wallet Attributes
//!
//! Open, typed attribute map carried by every wallet.
//!
//! Keys must be registered in an [`AttributeSet`] before the store lets them
//! be written. Three keys are *managed*: `vote`, `delegate.voteBalance` and
//! `delegate.username` only change through the store's vote, balance and
//! delegate primitives, which keep the vote-weight invariant and the username
//! index intact.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};
use std::collections::BTreeSet;

use super::errors::WalletError;

/// Address of the delegate this wallet votes for.
pub const VOTE: &str = "vote";
/// Registered delegate name.
pub const DELEGATE_USERNAME: &str = "delegate.username";
/// Sum of balances of all wallets voting for this delegate.
pub const DELEGATE_VOTE_BALANCE: &str = "delegate.voteBalance";
/// Number of blocks forged by this delegate.
pub const DELEGATE_PRODUCED_BLOCKS: &str = "delegate.producedBlocks";
/// Total fees collected from forged blocks.
pub const DELEGATE_FORGED_FEES: &str = "delegate.forgedFees";
/// Total rewards collected from forged blocks.
pub const DELEGATE_FORGED_REWARDS: &str = "delegate.forgedRewards";

/// Keys that only store primitives may write.
pub const MANAGED_ATTRIBUTES: [&str; 3] = [VOTE, DELEGATE_VOTE_BALANCE, DELEGATE_USERNAME];

/// A typed attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Address(Address),
    Amount(Amount),
    Number(u64),
    Text(String),
}

impl AttributeValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Amount(_) => "amount",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

/// Conversion from a stored attribute into a concrete Rust type.
pub trait AttributeType: Sized {
    const KIND: &'static str;

    fn from_value(value: &AttributeValue) -> Option<Self>;
}

impl AttributeType for Address {
    const KIND: &'static str = "address";

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Address(a) => Some(*a),
            _ => None,
        }
    }
}

impl AttributeType for Amount {
    const KIND: &'static str = "amount";

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Amount(a) => Some(*a),
            _ => None,
        }
    }
}

impl AttributeType for u64 {
    const KIND: &'static str = "number";

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl AttributeType for String {
    const KIND: &'static str = "text";

    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Decodes `value` as `T`, reporting a type mismatch under `key`.
pub(crate) fn decode<T: AttributeType>(key: &str, value: &AttributeValue) -> Result<T, WalletError> {
    T::from_value(value).ok_or_else(|| WalletError::AttributeTypeMismatch {
        key: key.to_string(),
        expected: T::KIND,
        actual: value.kind(),
    })
}

/// Registry of attribute keys the store accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSet {
    keys: BTreeSet<String>,
}

impl Default for AttributeSet {
    fn default() -> Self {
        let mut set = Self {
            keys: BTreeSet::new(),
        };
        for key in [
            VOTE,
            DELEGATE_USERNAME,
            DELEGATE_VOTE_BALANCE,
            DELEGATE_PRODUCED_BLOCKS,
            DELEGATE_FORGED_FEES,
            DELEGATE_FORGED_REWARDS,
        ] {
            set.register(key);
        }
        set
    }
}

impl AttributeSet {
    /// Registers `key`. Returns false if it was already known.
    pub fn register(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn has(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_managed(key: &str) -> bool {
        MANAGED_ATTRIBUTES.contains(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}
