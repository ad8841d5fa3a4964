//! # Wallet Store
//!
//! In-memory arena of wallets indexed by address, public key and delegate
//! username. The store is the single owner of wallet identity; handlers and
//! the engine borrow it mutably for one step at a time and never keep copies.
//!
//! ## Invariants Enforced
//!
//! - Balances never go negative (`decrease_balance` rejects first).
//! - For every delegate D, `D.delegate.voteBalance` equals the sum of the
//!   balances of wallets whose `vote` is D. Every balance primitive adjusts
//!   the voted delegate's weight in the same step: both new values are
//!   computed first, then both are committed, so a failing primitive leaves
//!   nothing behind.
//! - Votes may only target registered delegates.

use serde::{Deserialize, Serialize};
use shared_types::{address_from_public_key, Address, Amount, PublicKey};
use std::collections::{BTreeMap, HashMap};

use super::attributes::{self, AttributeSet, AttributeValue};
use super::errors::WalletError;
use super::wallet::Wallet;

/// Balance, nonce and attributes of one wallet, without identity bindings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub balance: Amount,
    pub nonce: u64,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Arena-backed wallet table.
#[derive(Clone, Debug, Default)]
pub struct WalletStore {
    wallets: Vec<Wallet>,
    by_address: HashMap<Address, usize>,
    by_public_key: HashMap<PublicKey, usize>,
    by_username: HashMap<String, usize>,
    attribute_set: AttributeSet,
    /// First failed undo since the last `take_integrity_fault`.
    integrity_fault: Option<WalletError>,
}

impl WalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store accepting the given attribute keys.
    pub fn with_attribute_set(attribute_set: AttributeSet) -> Self {
        Self {
            attribute_set,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.iter()
    }

    /// Registered delegates, in creation order.
    pub fn delegates(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.iter().filter(|w| w.is_delegate())
    }

    pub fn attribute_set(&self) -> &AttributeSet {
        &self.attribute_set
    }

    pub fn register_attribute(&mut self, key: impl Into<String>) -> bool {
        self.attribute_set.register(key)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Returns the wallet at `address`, creating a zeroed one if absent.
    pub fn find_by_address(&mut self, address: &Address) -> &Wallet {
        let index = self.index_or_create(address);
        &self.wallets[index]
    }

    /// Returns the wallet owning `public_key`, creating it if absent and
    /// binding the key to it.
    pub fn find_by_public_key(&mut self, public_key: &PublicKey) -> &Wallet {
        let index = self.index_for_public_key(public_key);
        &self.wallets[index]
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Wallet> {
        self.by_username.get(username).map(|&i| &self.wallets[i])
    }

    pub fn get_by_address(&self, address: &Address) -> Option<&Wallet> {
        self.by_address.get(address).map(|&i| &self.wallets[i])
    }

    /// Read-only lookup by public key. Also finds wallets that were created
    /// by address before the key was ever seen.
    pub fn get_by_public_key(&self, public_key: &PublicKey) -> Option<&Wallet> {
        match self.by_public_key.get(public_key) {
            Some(&i) => Some(&self.wallets[i]),
            None => self.get_by_address(&address_from_public_key(public_key)),
        }
    }

    pub fn has_by_address(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    pub fn has_by_public_key(&self, public_key: &PublicKey) -> bool {
        self.by_public_key.contains_key(public_key)
    }

    pub fn has_by_username(&self, username: &str) -> bool {
        self.by_username.contains_key(username)
    }

    fn index_or_create(&mut self, address: &Address) -> usize {
        if let Some(&index) = self.by_address.get(address) {
            return index;
        }
        let index = self.wallets.len();
        self.wallets.push(Wallet::new(*address));
        self.by_address.insert(*address, index);
        index
    }

    fn index_for_public_key(&mut self, public_key: &PublicKey) -> usize {
        if let Some(&index) = self.by_public_key.get(public_key) {
            return index;
        }
        let index = self.index_or_create(&address_from_public_key(public_key));
        self.wallets[index].set_public_key(*public_key);
        self.by_public_key.insert(*public_key, index);
        index
    }

    fn existing_index(&self, address: &Address) -> Result<usize, WalletError> {
        self.by_address
            .get(address)
            .copied()
            .ok_or(WalletError::WalletNotFound { address: *address })
    }

    fn delegate_index(&self, address: &Address) -> Result<usize, WalletError> {
        match self.by_address.get(address) {
            Some(&index) if self.wallets[index].is_delegate() => Ok(index),
            _ => Err(WalletError::NotADelegate { address: *address }),
        }
    }

    // =========================================================================
    // ATTRIBUTES
    // =========================================================================

    /// Writes a registered, non-managed attribute. Returns the previous value.
    pub fn set_attribute(
        &mut self,
        address: &Address,
        key: &str,
        value: AttributeValue,
    ) -> Result<Option<AttributeValue>, WalletError> {
        self.check_writable(key)?;
        let index = self.index_or_create(address);
        let previous = self.wallets[index].take_attribute(key);
        self.wallets[index].put_attribute(key, value);
        Ok(previous)
    }

    /// Removes a registered, non-managed attribute. Returns the old value.
    pub fn forget_attribute(
        &mut self,
        address: &Address,
        key: &str,
    ) -> Result<Option<AttributeValue>, WalletError> {
        self.check_writable(key)?;
        let index = self.existing_index(address)?;
        Ok(self.wallets[index].take_attribute(key))
    }

    fn check_writable(&self, key: &str) -> Result<(), WalletError> {
        if !self.attribute_set.has(key) {
            return Err(WalletError::UnknownAttribute {
                key: key.to_string(),
            });
        }
        if AttributeSet::is_managed(key) {
            return Err(WalletError::ManagedAttribute {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // BALANCE + VOTE WEIGHT
    // =========================================================================

    /// Credits `amount` to `address` and to its voted delegate's weight.
    pub fn increase_balance(&mut self, address: &Address, amount: Amount) -> Result<(), WalletError> {
        let index = self.index_or_create(address);
        let wallet = &self.wallets[index];
        let balance = wallet
            .balance()
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow { address: *address })?;

        let weight = match wallet.vote() {
            Some(delegate) => {
                let d = self.delegate_index(&delegate)?;
                let vote_balance = self.wallets[d]
                    .vote_balance()
                    .checked_add(amount)
                    .ok_or(WalletError::BalanceOverflow { address: delegate })?;
                Some((d, vote_balance))
            }
            None => None,
        };

        self.wallets[index].set_balance(balance);
        if let Some((d, vote_balance)) = weight {
            self.set_vote_balance(d, vote_balance);
        }
        Ok(())
    }

    /// Debits `amount` from `address` and from its voted delegate's weight.
    pub fn decrease_balance(&mut self, address: &Address, amount: Amount) -> Result<(), WalletError> {
        let index = self.index_or_create(address);
        let wallet = &self.wallets[index];
        let available = wallet.balance();
        let balance = available
            .checked_sub(amount)
            .ok_or(WalletError::InsufficientBalance {
                address: *address,
                required: amount,
                available,
            })?;

        let weight = match wallet.vote() {
            Some(delegate) => {
                let d = self.delegate_index(&delegate)?;
                let vote_balance = self.wallets[d]
                    .vote_balance()
                    .checked_sub(amount)
                    .ok_or(WalletError::VoteBalanceUnderflow { delegate })?;
                Some((d, vote_balance))
            }
            None => None,
        };

        self.wallets[index].set_balance(balance);
        if let Some((d, vote_balance)) = weight {
            self.set_vote_balance(d, vote_balance);
        }
        Ok(())
    }

    fn set_vote_balance(&mut self, index: usize, vote_balance: Amount) {
        self.wallets[index].put_attribute(
            attributes::DELEGATE_VOTE_BALANCE,
            AttributeValue::Amount(vote_balance),
        );
    }

    /// Records that undoing a mutation failed. The store no longer matches
    /// any applied prefix of the chain. Only the first fault is kept.
    pub(crate) fn flag_integrity_fault(&mut self, error: WalletError) {
        self.integrity_fault.get_or_insert(error);
    }

    pub fn has_integrity_fault(&self) -> bool {
        self.integrity_fault.is_some()
    }

    /// Takes the fault recorded by a failed undo, if any.
    pub fn take_integrity_fault(&mut self) -> Option<WalletError> {
        self.integrity_fault.take()
    }

    /// Adds one unit to a delegate's stored vote weight without touching any
    /// balance.
    #[cfg(test)]
    pub(crate) fn skew_vote_balance(&mut self, delegate: &Address) {
        if let Ok(index) = self.delegate_index(delegate) {
            let skewed = self.wallets[index].vote_balance() + Amount::one();
            self.set_vote_balance(index, skewed);
        }
    }

    /// Points `voter`'s vote at `delegate` (or clears it), moving the voter's
    /// whole balance between the two delegates' weights. Returns the
    /// previous vote.
    pub fn set_vote(
        &mut self,
        voter: &Address,
        delegate: Option<Address>,
    ) -> Result<Option<Address>, WalletError> {
        let index = self.index_or_create(voter);
        let previous = self.wallets[index].vote();
        if previous == delegate {
            return Ok(previous);
        }
        let balance = self.wallets[index].balance();

        let old_weight = match previous {
            Some(old) => {
                let d = self.delegate_index(&old)?;
                let vote_balance = self.wallets[d]
                    .vote_balance()
                    .checked_sub(balance)
                    .ok_or(WalletError::VoteBalanceUnderflow { delegate: old })?;
                Some((d, vote_balance))
            }
            None => None,
        };
        let new_weight = match delegate {
            Some(new) => {
                let d = self.delegate_index(&new)?;
                let vote_balance = self.wallets[d]
                    .vote_balance()
                    .checked_add(balance)
                    .ok_or(WalletError::BalanceOverflow { address: new })?;
                Some((d, vote_balance))
            }
            None => None,
        };

        if let Some((d, vote_balance)) = old_weight {
            self.set_vote_balance(d, vote_balance);
        }
        if let Some((d, vote_balance)) = new_weight {
            self.set_vote_balance(d, vote_balance);
        }
        match delegate {
            Some(new) => self.wallets[index].put_attribute(attributes::VOTE, AttributeValue::Address(new)),
            None => {
                self.wallets[index].take_attribute(attributes::VOTE);
            }
        }
        Ok(previous)
    }

    // =========================================================================
    // NONCE
    // =========================================================================

    pub fn increment_nonce(&mut self, address: &Address) -> Result<u64, WalletError> {
        let index = self.index_or_create(address);
        let nonce = self.wallets[index]
            .nonce()
            .checked_add(1)
            .ok_or(WalletError::NonceOverflow { address: *address })?;
        self.wallets[index].set_nonce(nonce);
        Ok(nonce)
    }

    /// Overwrites a nonce outside of any transaction. Genesis seeding only.
    pub(crate) fn seed_nonce(&mut self, address: &Address, nonce: u64) {
        let index = self.index_or_create(address);
        self.wallets[index].set_nonce(nonce);
    }

    pub fn decrement_nonce(&mut self, address: &Address) -> Result<u64, WalletError> {
        let index = self.existing_index(address)?;
        let nonce = self.wallets[index]
            .nonce()
            .checked_sub(1)
            .ok_or(WalletError::NonceUnderflow { address: *address })?;
        self.wallets[index].set_nonce(nonce);
        Ok(nonce)
    }

    // =========================================================================
    // DELEGATES
    // =========================================================================

    /// Registers `address` as a delegate with zero vote weight.
    pub fn register_delegate(&mut self, address: &Address, username: &str) -> Result<(), WalletError> {
        let index = self.index_or_create(address);
        if self.wallets[index].is_delegate() {
            return Err(WalletError::AlreadyDelegate { address: *address });
        }
        if self.by_username.contains_key(username) {
            return Err(WalletError::UsernameTaken {
                username: username.to_string(),
            });
        }

        let wallet = &mut self.wallets[index];
        wallet.put_attribute(
            attributes::DELEGATE_USERNAME,
            AttributeValue::Text(username.to_string()),
        );
        wallet.put_attribute(
            attributes::DELEGATE_VOTE_BALANCE,
            AttributeValue::Amount(Amount::zero()),
        );
        wallet.put_attribute(attributes::DELEGATE_PRODUCED_BLOCKS, AttributeValue::Number(0));
        wallet.put_attribute(
            attributes::DELEGATE_FORGED_FEES,
            AttributeValue::Amount(Amount::zero()),
        );
        wallet.put_attribute(
            attributes::DELEGATE_FORGED_REWARDS,
            AttributeValue::Amount(Amount::zero()),
        );
        self.by_username.insert(username.to_string(), index);
        Ok(())
    }

    /// Removes delegate status. Fails while any vote weight remains.
    /// Returns the released username.
    pub fn unregister_delegate(&mut self, address: &Address) -> Result<String, WalletError> {
        let index = self.delegate_index(address)?;
        let wallet = &self.wallets[index];
        let vote_balance = wallet.vote_balance();
        if !vote_balance.is_zero() {
            return Err(WalletError::DelegateHasVotes {
                address: *address,
                vote_balance,
            });
        }
        let username = wallet.username().unwrap_or_default().to_string();

        let wallet = &mut self.wallets[index];
        for key in [
            attributes::DELEGATE_USERNAME,
            attributes::DELEGATE_VOTE_BALANCE,
            attributes::DELEGATE_PRODUCED_BLOCKS,
            attributes::DELEGATE_FORGED_FEES,
            attributes::DELEGATE_FORGED_REWARDS,
        ] {
            wallet.take_attribute(key);
        }
        self.by_username.remove(&username);
        Ok(username)
    }

    /// Adds one forged block with its fees and reward to the forger's
    /// statistics. No-op when the forger is not a delegate.
    pub fn record_forged_block(
        &mut self,
        forger: &Address,
        fees: Amount,
        reward: Amount,
    ) -> Result<(), WalletError> {
        let Ok(index) = self.delegate_index(forger) else {
            return Ok(());
        };
        let wallet = &self.wallets[index];
        let overflow = WalletError::BalanceOverflow { address: *forger };
        let produced = wallet
            .number_attribute(attributes::DELEGATE_PRODUCED_BLOCKS)
            .checked_add(1)
            .ok_or_else(|| overflow.clone())?;
        let forged_fees = wallet
            .amount_attribute(attributes::DELEGATE_FORGED_FEES)
            .checked_add(fees)
            .ok_or_else(|| overflow.clone())?;
        let forged_rewards = wallet
            .amount_attribute(attributes::DELEGATE_FORGED_REWARDS)
            .checked_add(reward)
            .ok_or(overflow)?;
        self.put_forged_stats(index, produced, forged_fees, forged_rewards);
        Ok(())
    }

    /// Exact inverse of [`record_forged_block`](Self::record_forged_block).
    pub fn unrecord_forged_block(
        &mut self,
        forger: &Address,
        fees: Amount,
        reward: Amount,
    ) -> Result<(), WalletError> {
        let Ok(index) = self.delegate_index(forger) else {
            return Ok(());
        };
        let wallet = &self.wallets[index];
        let underflow = WalletError::ForgedStatsUnderflow { delegate: *forger };
        let produced = wallet
            .number_attribute(attributes::DELEGATE_PRODUCED_BLOCKS)
            .checked_sub(1)
            .ok_or_else(|| underflow.clone())?;
        let forged_fees = wallet
            .amount_attribute(attributes::DELEGATE_FORGED_FEES)
            .checked_sub(fees)
            .ok_or_else(|| underflow.clone())?;
        let forged_rewards = wallet
            .amount_attribute(attributes::DELEGATE_FORGED_REWARDS)
            .checked_sub(reward)
            .ok_or(underflow)?;
        self.put_forged_stats(index, produced, forged_fees, forged_rewards);
        Ok(())
    }

    fn put_forged_stats(&mut self, index: usize, produced: u64, fees: Amount, rewards: Amount) {
        let wallet = &mut self.wallets[index];
        wallet.put_attribute(attributes::DELEGATE_PRODUCED_BLOCKS, AttributeValue::Number(produced));
        wallet.put_attribute(attributes::DELEGATE_FORGED_FEES, AttributeValue::Amount(fees));
        wallet.put_attribute(attributes::DELEGATE_FORGED_REWARDS, AttributeValue::Amount(rewards));
    }

    // =========================================================================
    // AUDITS
    // =========================================================================

    /// Sum of all balances, or `None` on overflow.
    pub fn total_supply(&self) -> Option<Amount> {
        self.wallets
            .iter()
            .try_fold(Amount::zero(), |acc, w| acc.checked_add(w.balance()))
    }

    /// Recomputes every delegate's vote weight from scratch and compares it
    /// with the stored value. Only for audits and tests; the engine never
    /// relies on recomputation.
    pub fn verify_vote_balances(&self) -> Result<(), WalletError> {
        let mut computed: HashMap<Address, Amount> = HashMap::new();
        for wallet in &self.wallets {
            if let Some(delegate) = wallet.vote() {
                self.delegate_index(&delegate)?;
                let sum = computed.entry(delegate).or_insert_with(Amount::zero);
                *sum = sum
                    .checked_add(wallet.balance())
                    .ok_or(WalletError::BalanceOverflow { address: delegate })?;
            }
        }
        for delegate in self.delegates() {
            let stored = delegate.vote_balance();
            let expected = computed.get(delegate.address()).copied().unwrap_or_default();
            if stored != expected {
                return Err(WalletError::VoteWeightMismatch {
                    delegate: *delegate.address(),
                    stored,
                    computed: expected,
                });
            }
        }
        Ok(())
    }

    /// Balance, nonce and attributes of every wallet that holds any state.
    ///
    /// Wallets created lazily and left untouched, and public-key bindings,
    /// are excluded, so the result taken before `apply_block` equals the one
    /// taken after the matching `revert_block`.
    pub fn ledger_state(&self) -> BTreeMap<Address, LedgerEntry> {
        self.wallets
            .iter()
            .filter(|w| !w.balance().is_zero() || w.nonce() != 0 || !w.attributes().is_empty())
            .map(|w| {
                (
                    *w.address(),
                    LedgerEntry {
                        balance: w.balance(),
                        nonce: w.nonce(),
                        attributes: w.attributes().clone(),
                    },
                )
            })
            .collect()
    }
}
