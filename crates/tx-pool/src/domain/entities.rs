//! Pool configuration.

pub use shared_types::{Address, Amount, Transaction, TransactionId};

use std::env;

/// Configuration for the pool processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum accepted transactions held by one processor.
    pub max_transactions: usize,
    /// Maximum accepted transactions per sender.
    pub max_per_sender: usize,
    /// Minimum fee a transaction must pay.
    pub min_fee: Amount,
    /// Also list accepted transactions for broadcast.
    pub broadcast_accepted: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 5000,
            max_per_sender: 16,
            min_fee: Amount::zero(),
            broadcast_accepted: true,
        }
    }
}

impl PoolConfig {
    /// Creates a minimal config for testing.
    pub fn for_testing() -> Self {
        Self {
            max_transactions: 100,
            max_per_sender: 4,
            ..Default::default()
        }
    }

    /// Reads `LEDGER_POOL_MAX_TRANSACTIONS`, `LEDGER_POOL_MAX_PER_SENDER`,
    /// `LEDGER_POOL_MIN_FEE` and `LEDGER_POOL_BROADCAST`. Unparseable values
    /// fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_transactions: env::var("LEDGER_POOL_MAX_TRANSACTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_transactions),
            max_per_sender: env::var("LEDGER_POOL_MAX_PER_SENDER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_per_sender),
            min_fee: env::var("LEDGER_POOL_MIN_FEE")
                .ok()
                .and_then(|v| Amount::from_dec_str(&v).ok())
                .unwrap_or(defaults.min_fee),
            broadcast_accepted: env::var("LEDGER_POOL_BROADCAST")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.broadcast_accepted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_config_is_smaller() {
        let config = PoolConfig::for_testing();
        assert!(config.max_transactions < PoolConfig::default().max_transactions);
        assert_eq!(config.min_fee, Amount::zero());
        assert!(config.broadcast_accepted);
    }
}
