//! # Ledger Telemetry
//!
//! Logging and metrics shared by the block state engine and the transaction
//! pool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEDGER_SERVICE_NAME` | `dpos-ledger` | Service name in logs |
//! | `LEDGER_LOG_LEVEL` | `info` | Log level filter |
//! | `LEDGER_JSON_LOGS` | `false` | JSON log lines |
//! | `LEDGER_NETWORK` | `testnet` | Network name |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, BLOCKS_APPLIED, BLOCKS_REVERTED,
    BLOCK_APPLY_DURATION, BLOCK_ROLLBACKS, CHAIN_HEIGHT, POOL_OUTCOMES, POOL_SIZE,
    TRANSACTIONS_APPLIED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad filter".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad filter");
    }
}
