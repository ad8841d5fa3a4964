//! # Inbound Port - Processor
//!
//! Contract a transaction pool processor satisfies. Implementations read
//! committed wallet state but never mutate it.
//!
//! # Example
//!
//! ```rust,ignore
//! use tx_pool::{PoolConfig, PoolProcessor, Processor};
//!
//! let mut pool = PoolProcessor::new(engine.clone(), engine.registry(), PoolConfig::default());
//! let result = pool.validate(&incoming);
//! for id in &result.broadcast {
//!     // relay to peers
//! }
//! ```

use shared_types::Transaction;

use crate::domain::{ErrorMap, ProcessorResult};

pub trait Processor {
    /// Classifies `transactions` into accept, invalid and excess.
    ///
    /// Accepted transactions are retained and visible through
    /// [`get_transactions`](Self::get_transactions).
    fn validate(&mut self, transactions: &[Transaction]) -> ProcessorResult;

    /// Every transaction accepted so far.
    fn get_transactions(&self) -> &[Transaction];

    /// Accepted transactions that should be relayed.
    fn get_broadcast_transactions(&self) -> &[Transaction];

    /// Every error recorded so far, keyed by transaction id.
    fn get_errors(&self) -> &ErrorMap;

    /// Records a rejection reason found outside `validate`. `error_type` is
    /// free-form; the codes of [`PoolErrorType`](crate::PoolErrorType) are the usual choice.
    fn push_error(&mut self, transaction: &Transaction, error_type: &str, message: &str);
}
