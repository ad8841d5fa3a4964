//! In-memory adapters: the shared store handle and event sinks.

pub mod event_sink;
pub mod shared_store;

pub use event_sink::*;
pub use shared_store::*;
