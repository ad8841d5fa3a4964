use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use crate::domain::WalletStore;

/// Shared handle to the committed wallet store.
///
/// The engine is the single writer and holds the write lock for a whole
/// `apply_block` / `revert_block`; readers only ever see state between
/// blocks.
#[derive(Clone, Debug, Default)]
pub struct SharedWalletStore {
    inner: Arc<RwLock<WalletStore>>,
}

impl SharedWalletStore {
    pub fn new(store: WalletStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, WalletStore> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, WalletStore> {
        self.inner.write()
    }

    pub fn snapshot(&self) -> WalletStore {
        self.inner.read().clone()
    }
}
