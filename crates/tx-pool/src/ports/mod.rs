//! Ports layer for the transaction pool.
//!
//! The pool only exposes a driving port. Its dependency on committed wallet
//! state is the `WalletStateReader` port owned by `block-state`.

pub mod inbound;

pub use inbound::*;
