//! # Wallet Entity
//!
//! A wallet is created lazily on first reference with zero balance and nonce,
//! is never deleted, and is owned exclusively by the [`WalletStore`].
//!
//! Fields are private: every mutation that could break the vote-weight
//! invariant goes through a store primitive.
//!
//! [`WalletStore`]: super::store::WalletStore

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, PublicKey};
use std::collections::BTreeMap;

use super::attributes::{self, decode, AttributeType, AttributeValue};
use super::errors::WalletError;

/// Account state tracked by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    address: Address,
    public_key: Option<PublicKey>,
    balance: Amount,
    nonce: u64,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Wallet {
    /// Zero-initialised wallet for `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            public_key: None,
            balance: Amount::zero(),
            nonce: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Number of transactions this wallet has sent.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Typed attribute read. `Ok(None)` when unset.
    pub fn get_attribute<T: AttributeType>(&self, key: &str) -> Result<Option<T>, WalletError> {
        self.attributes
            .get(key)
            .map(|value| decode(key, value))
            .transpose()
    }

    /// Raw attribute read.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Delegate this wallet currently votes for.
    pub fn vote(&self) -> Option<Address> {
        match self.attributes.get(attributes::VOTE) {
            Some(AttributeValue::Address(delegate)) => Some(*delegate),
            _ => None,
        }
    }

    pub fn is_delegate(&self) -> bool {
        self.attributes.contains_key(attributes::DELEGATE_USERNAME)
    }

    pub fn username(&self) -> Option<&str> {
        match self.attributes.get(attributes::DELEGATE_USERNAME) {
            Some(AttributeValue::Text(name)) => Some(name),
            _ => None,
        }
    }

    /// Aggregate balance of this delegate's voters. Zero for non-delegates.
    pub fn vote_balance(&self) -> Amount {
        self.amount_attribute(attributes::DELEGATE_VOTE_BALANCE)
    }

    pub(crate) fn amount_attribute(&self, key: &str) -> Amount {
        match self.attributes.get(key) {
            Some(AttributeValue::Amount(amount)) => *amount,
            _ => Amount::zero(),
        }
    }

    pub(crate) fn number_attribute(&self, key: &str) -> u64 {
        match self.attributes.get(key) {
            Some(AttributeValue::Number(n)) => *n,
            _ => 0,
        }
    }

    // -------------------------------------------------------------------------
    // Store-only mutators
    // -------------------------------------------------------------------------

    pub(crate) fn set_public_key(&mut self, public_key: PublicKey) {
        self.public_key = Some(public_key);
    }

    pub(crate) fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
    }

    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    pub(crate) fn put_attribute(&mut self, key: &str, value: AttributeValue) {
        self.attributes.insert(key.to_string(), value);
    }

    pub(crate) fn take_attribute(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }
}
