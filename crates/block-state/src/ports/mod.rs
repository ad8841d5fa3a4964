//! Ports for the block state engine.
//!
//! - `api`: inbound [`BlockStateApi`]
//! - `outbound`: event sink and read-only wallet access

pub mod api;
pub mod outbound;

pub use api::*;
pub use outbound::*;
