//! # Error Types
//!
//! Errors raised while constructing chain entities.

use thiserror::Error;

/// Errors produced by entity construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// A builder was finished without a required field.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}
