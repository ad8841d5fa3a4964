//! # DPoS Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Genesis and block helpers shared by all suites
//! └── integration/
//!     ├── scenarios.rs  # Fixed-value block scenarios
//!     ├── properties.rs # Invertibility, vote weight, nonce properties
//!     ├── pool_flow.rs  # Pool validation feeding the engine
//!     └── telemetry.rs  # Metrics exposition
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::properties::
//! ```

#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
mod integration;
