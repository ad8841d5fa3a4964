//! # tx-pool
//!
//! Transaction pool processor: validates candidate transactions before they
//! are offered for block inclusion.
//!
//! ## Role in System
//!
//! The block state engine never calls into the pool. The pool reads
//! committed wallet state through `block_state::WalletStateReader`, dry-runs
//! the engine's own transaction handlers against a private snapshot, and
//! reports a [`ProcessorResult`]. Validation holds only a read lock for the
//! moment the snapshot is copied.
//!
//! ```text
//! [Peers / API] ──txs──→ Processor::validate ──→ accept / broadcast
//!                              │                  invalid / excess
//!                       snapshot() (read lock)
//!                              ↓
//!                     [BlockStateEngine]
//! ```
//!
//! ## Outcomes
//!
//! | Outcome | Codes |
//! |---------|-------|
//! | `excess` | `ERR_DUPLICATE`, `ERR_POOL_FULL` |
//! | `invalid` | `ERR_APPLY`, `ERR_INSUFFICIENT_BALANCE`, `ERR_NONCE`, `ERR_UNSUPPORTED`, `ERR_LOW_FEE` |

pub mod domain;
pub mod ports;

pub use domain::*;
pub use ports::*;
