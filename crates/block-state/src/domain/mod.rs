//! Pure ledger logic: wallets, the wallet store, transaction handlers and
//! genesis seeding. Nothing here takes a lock or publishes an event.

pub mod attributes;
pub mod config;
pub mod errors;
pub mod genesis;
pub mod handlers;
pub mod store;
pub mod wallet;

pub use attributes::{AttributeSet, AttributeType, AttributeValue};
pub use config::BlockStateConfig;
pub use errors::*;
pub use genesis::GenesisBuilder;
pub use handlers::*;
pub use store::{LedgerEntry, WalletStore};
pub use wallet::Wallet;
