//! Mutation scope for one handler invocation or one reward step.
//!
//! Every store mutation a handler performs goes through the scope, which
//! records it. If the scope is dropped without [`MutationScope::commit`], the
//! recorded steps are undone in reverse order, so a handler that fails half
//! way leaves the store exactly as it found it. An undo that fails is
//! recorded on the store as an integrity fault for the caller to escalate.

use shared_types::{Address, Amount, PublicKey};
use tracing::error;

use crate::domain::errors::WalletError;
use crate::domain::store::WalletStore;
use crate::domain::wallet::Wallet;

#[derive(Debug)]
enum Step {
    Debit(Address, Amount),
    Credit(Address, Amount),
    IncrementNonce(Address),
    DecrementNonce(Address),
    Vote {
        voter: Address,
        previous: Option<Address>,
    },
    RegisterDelegate(Address),
    UnregisterDelegate(Address, String),
    RecordForged(Address, Amount, Amount),
    UnrecordForged(Address, Amount, Amount),
}

pub struct MutationScope<'a> {
    store: &'a mut WalletStore,
    steps: Vec<Step>,
    committed: bool,
}

impl<'a> MutationScope<'a> {
    pub fn new(store: &'a mut WalletStore) -> Self {
        Self {
            store,
            steps: Vec::new(),
            committed: false,
        }
    }

    pub fn store(&self) -> &WalletStore {
        &*self.store
    }

    /// Resolves the sender wallet, binding its public key. The binding is
    /// identity, not ledger state, and is not undone.
    pub fn sender(&mut self, public_key: &PublicKey) -> &Wallet {
        self.store.find_by_public_key(public_key)
    }

    pub fn debit(&mut self, address: &Address, amount: Amount) -> Result<(), WalletError> {
        self.store.decrease_balance(address, amount)?;
        self.steps.push(Step::Debit(*address, amount));
        Ok(())
    }

    pub fn credit(&mut self, address: &Address, amount: Amount) -> Result<(), WalletError> {
        self.store.increase_balance(address, amount)?;
        self.steps.push(Step::Credit(*address, amount));
        Ok(())
    }

    pub fn increment_nonce(&mut self, address: &Address) -> Result<(), WalletError> {
        self.store.increment_nonce(address)?;
        self.steps.push(Step::IncrementNonce(*address));
        Ok(())
    }

    pub fn decrement_nonce(&mut self, address: &Address) -> Result<(), WalletError> {
        self.store.decrement_nonce(address)?;
        self.steps.push(Step::DecrementNonce(*address));
        Ok(())
    }

    /// Sets the voter's vote. Returns the previous one.
    pub fn set_vote(
        &mut self,
        voter: &Address,
        delegate: Option<Address>,
    ) -> Result<Option<Address>, WalletError> {
        let previous = self.store.set_vote(voter, delegate)?;
        self.steps.push(Step::Vote {
            voter: *voter,
            previous,
        });
        Ok(previous)
    }

    pub fn register_delegate(&mut self, address: &Address, username: &str) -> Result<(), WalletError> {
        self.store.register_delegate(address, username)?;
        self.steps.push(Step::RegisterDelegate(*address));
        Ok(())
    }

    pub fn unregister_delegate(&mut self, address: &Address) -> Result<String, WalletError> {
        let username = self.store.unregister_delegate(address)?;
        self.steps.push(Step::UnregisterDelegate(*address, username.clone()));
        Ok(username)
    }

    pub fn record_forged_block(
        &mut self,
        forger: &Address,
        fees: Amount,
        reward: Amount,
    ) -> Result<(), WalletError> {
        self.store.record_forged_block(forger, fees, reward)?;
        self.steps.push(Step::RecordForged(*forger, fees, reward));
        Ok(())
    }

    pub fn unrecord_forged_block(
        &mut self,
        forger: &Address,
        fees: Amount,
        reward: Amount,
    ) -> Result<(), WalletError> {
        self.store.unrecord_forged_block(forger, fees, reward)?;
        self.steps.push(Step::UnrecordForged(*forger, fees, reward));
        Ok(())
    }

    /// Keeps every recorded mutation.
    pub fn commit(mut self) {
        self.committed = true;
    }

    fn undo(store: &mut WalletStore, step: &Step) -> Result<(), WalletError> {
        match step {
            Step::Debit(address, amount) => store.increase_balance(address, *amount),
            Step::Credit(address, amount) => store.decrease_balance(address, *amount),
            Step::IncrementNonce(address) => store.decrement_nonce(address).map(|_| ()),
            Step::DecrementNonce(address) => store.increment_nonce(address).map(|_| ()),
            Step::Vote { voter, previous } => store.set_vote(voter, *previous).map(|_| ()),
            Step::RegisterDelegate(address) => store.unregister_delegate(address).map(|_| ()),
            Step::UnregisterDelegate(address, username) => store.register_delegate(address, username),
            Step::RecordForged(forger, fees, reward) => store.unrecord_forged_block(forger, *fees, *reward),
            Step::UnrecordForged(forger, fees, reward) => store.record_forged_block(forger, *fees, *reward),
        }
    }
}

impl Drop for MutationScope<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(step) = self.steps.pop() {
            if let Err(e) = Self::undo(self.store, &step) {
                // The inverse of a step that just succeeded can only fail if
                // the store was corrupted underneath us.
                error!(
                    step = ?step,
                    error = %e,
                    "[block-state] failed to undo mutation step"
                );
                self.store.flag_integrity_fault(e);
            }
        }
    }
}

impl std::fmt::Debug for MutationScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationScope")
            .field("steps", &self.steps.len())
            .field("committed", &self.committed)
            .finish()
    }
}
