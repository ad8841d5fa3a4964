//! # Domain Layer - Transaction Pool
//!
//! - `entities`: `PoolConfig`
//! - `errors`: `PoolErrorType` wire codes
//! - `value_objects`: `ProcessorResult`, `TransactionErrorResponse`
//! - `processor`: `PoolProcessor`, the reference validator

pub mod entities;
pub mod errors;
pub mod processor;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use processor::PoolProcessor;
pub use value_objects::*;
