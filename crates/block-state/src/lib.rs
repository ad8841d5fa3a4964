//! # block-state
//!
//! Wallet state engine of a delegated proof-of-stake ledger.
//!
//! ## Role in System
//!
//! - **Wallet Store**: in-memory table of wallets keyed by address, public
//!   key and delegate username
//! - **Transaction Handlers**: apply/revert for transfer, multi-payment,
//!   vote and delegate registration
//! - **Block State Engine**: all-or-nothing `apply_block` / `revert_block`
//!   with fee and reward accounting
//!
//! ## Flow
//!
//! ```text
//! [Forger] ──Block──→ apply_block ──→ handlers (per tx) ──→ reward
//!                          │                  │
//!                          │          failure: revert applied txs
//!                          ↓
//!                [BlockStateEventSink] ──→ BlockApplied / BlockRolledBack
//!
//! [Tx Pool] ──read lock──→ snapshot() ──→ dry-run handlers
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | Balances never negative | `WalletStore::decrease_balance` |
//! | `voteBalance` equals the sum of voter balances | every store balance/vote primitive |
//! | Nonce equals `tx.nonce` before apply, `tx.nonce + 1` after | handlers |
//! | Supply changes only by the block reward | fees move sender to forger |
//! | `revert(apply(S)) == S` | handlers, `MutationScope`, engine rollback |

pub mod adapters;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use events::*;
pub use ports::*;
pub use service::BlockStateEngine;
