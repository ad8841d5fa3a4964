//! # Block State Events
//!
//! Payloads the engine publishes through its [`BlockStateEventSink`].
//!
//! - `BlockApplied`: block and reward applied
//! - `BlockReverted`: head block reverted
//! - `BlockRolledBack`: block failed part way, earlier transactions undone
//!
//! [`BlockStateEventSink`]: crate::ports::BlockStateEventSink

pub mod payloads;

pub use payloads::*;
