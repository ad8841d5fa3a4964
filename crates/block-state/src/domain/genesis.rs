//! Genesis seeding.
//!
//! Builds the initial wallet table and the genesis block an engine starts
//! from. Genesis state is not produced by transactions, so it cannot be
//! reverted.

use shared_types::{Address, Amount, Block, BlockBuilder, PublicKey};

use super::errors::WalletError;
use super::store::WalletStore;

#[derive(Clone, Debug)]
struct GenesisDelegate {
    public_key: PublicKey,
    username: String,
    balance: Amount,
}

/// Declarative description of the genesis state.
///
/// ```rust,ignore
/// let (store, genesis) = GenesisBuilder::new()
///     .with_delegate(d1_key, "genesis_1", U256::from(300_000_000_000_000u64))
///     .with_account(alice, U256::from(1_000u64))
///     .build()?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct GenesisBuilder {
    delegates: Vec<GenesisDelegate>,
    accounts: Vec<(Address, Amount)>,
    votes: Vec<(Address, Address)>,
    nonces: Vec<(Address, u64)>,
    timestamp: u64,
}

impl GenesisBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Funded delegate that votes for itself.
    pub fn with_delegate(
        mut self,
        public_key: PublicKey,
        username: impl Into<String>,
        balance: Amount,
    ) -> Self {
        self.delegates.push(GenesisDelegate {
            public_key,
            username: username.into(),
            balance,
        });
        self
    }

    pub fn with_account(mut self, address: Address, balance: Amount) -> Self {
        self.accounts.push((address, balance));
        self
    }

    /// `voter` votes for `delegate`. Replaces a delegate's self-vote.
    pub fn with_vote(mut self, voter: Address, delegate: Address) -> Self {
        self.votes.push((voter, delegate));
        self
    }

    /// Starting nonce for an account that already sent transactions.
    pub fn with_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.nonces.push((address, nonce));
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Seeds the store and produces the genesis block at height 1, forged
    /// by the first delegate.
    pub fn build(self) -> Result<(WalletStore, Block), WalletError> {
        let mut store = WalletStore::new();

        for delegate in &self.delegates {
            let address = *store.find_by_public_key(&delegate.public_key).address();
            store.increase_balance(&address, delegate.balance)?;
            store.register_delegate(&address, &delegate.username)?;
            store.set_vote(&address, Some(address))?;
        }
        for (address, balance) in &self.accounts {
            store.increase_balance(address, *balance)?;
        }
        for (voter, delegate) in &self.votes {
            store.set_vote(voter, Some(*delegate))?;
        }
        for (address, nonce) in &self.nonces {
            store.seed_nonce(address, *nonce);
        }

        let generator = self
            .delegates
            .first()
            .map(|d| d.public_key)
            .unwrap_or([0u8; 32]);
        let genesis = BlockBuilder::new(generator).timestamp(self.timestamp).build();
        Ok((store, genesis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::address_from_public_key;

    #[test]
    fn test_delegates_self_vote() {
        let (store, genesis) = GenesisBuilder::new()
            .with_delegate([1; 32], "genesis_1", Amount::from(500u64))
            .with_delegate([2; 32], "genesis_2", Amount::from(300u64))
            .build()
            .unwrap();

        assert_eq!(genesis.height(), 1);
        assert!(genesis.header.previous_block.is_none());
        let d1 = store.find_by_username("genesis_1").unwrap();
        assert_eq!(d1.vote_balance(), Amount::from(500u64));
        assert_eq!(d1.public_key(), Some(&[1; 32]));
        assert_eq!(store.total_supply(), Some(Amount::from(800u64)));
        store.verify_vote_balances().unwrap();
    }

    #[test]
    fn test_accounts_votes_and_nonces() {
        let d1 = address_from_public_key(&[1; 32]);
        let alice = [0xA1; 20];
        let (store, _) = GenesisBuilder::new()
            .with_delegate([1; 32], "genesis_1", Amount::from(500u64))
            .with_account(alice, Amount::from(70u64))
            .with_vote(alice, d1)
            .with_nonce(alice, 3)
            .build()
            .unwrap();

        let wallet = store.get_by_address(&alice).unwrap();
        assert_eq!(wallet.vote(), Some(d1));
        assert_eq!(wallet.nonce(), 3);
        assert_eq!(
            store.get_by_address(&d1).unwrap().vote_balance(),
            Amount::from(570u64)
        );
    }

    #[test]
    fn test_vote_for_unknown_delegate_fails() {
        let result = GenesisBuilder::new()
            .with_account([0xA1; 20], Amount::from(1u64))
            .with_vote([0xA1; 20], [0xEE; 20])
            .build();
        assert!(matches!(result, Err(WalletError::NotADelegate { .. })));
    }
}
