//! # Shared Types Crate
//!
//! Chain entities consumed by the wallet state engine (`block-state`) and the
//! transaction pool (`tx-pool`).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: block and transaction shapes live here only.
//! - **Derived Type Tags**: a transaction's type is derived from its asset
//!   variant, so tag and payload can never disagree.
//! - **Checked Amounts**: every amount is a `U256`; aggregate helpers return
//!   `None` on overflow instead of wrapping.

pub mod builders;
pub mod entities;
pub mod errors;

pub use builders::*;
pub use entities::*;
pub use errors::*;
