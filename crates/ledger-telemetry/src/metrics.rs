//! Prometheus metrics for the ledger engine and transaction pool.
//!
//! All metrics follow the naming convention: `ledger_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_applied_total)
//! - **Gauge**: Value that can go up or down (e.g., chain_height)
//! - **Histogram**: Distribution of values (e.g., block_apply_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BLOCK STATE METRICS
    // =========================================================================

    /// Blocks fully applied
    pub static ref BLOCKS_APPLIED: IntCounter = IntCounter::new(
        "ledger_block_state_blocks_applied_total",
        "Total number of blocks applied to wallet state"
    ).expect("metric creation failed");

    /// Blocks reverted during fork resolution
    pub static ref BLOCKS_REVERTED: IntCounter = IntCounter::new(
        "ledger_block_state_blocks_reverted_total",
        "Total number of blocks reverted from wallet state"
    ).expect("metric creation failed");

    /// Block applications rolled back after a failing transaction
    pub static ref BLOCK_ROLLBACKS: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_block_state_rollbacks_total", "Block applications rolled back"),
        &["reason"]  // reason: insufficient_balance/nonce/unknown_type/other
    ).expect("metric creation failed");

    /// Transactions applied as part of committed blocks
    pub static ref TRANSACTIONS_APPLIED: IntCounter = IntCounter::new(
        "ledger_block_state_transactions_applied_total",
        "Total number of transactions applied in committed blocks"
    ).expect("metric creation failed");

    /// Current chain height as seen by the engine
    pub static ref CHAIN_HEIGHT: IntGauge = IntGauge::new(
        "ledger_block_state_chain_height",
        "Height of the last applied block"
    ).expect("metric creation failed");

    /// Block application duration
    pub static ref BLOCK_APPLY_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ledger_block_state_apply_duration_seconds",
            "Time spent applying a block to wallet state"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSACTION POOL METRICS
    // =========================================================================

    /// Pool validation outcomes
    pub static ref POOL_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_pool_transactions_total", "Pool validation outcomes"),
        &["outcome"]  // outcome: accept/invalid/excess
    ).expect("metric creation failed");

    /// Transactions currently accepted by the pool processor
    pub static ref POOL_SIZE: IntGauge = IntGauge::new(
        "ledger_pool_transactions_accepted",
        "Number of transactions accepted by the pool processor"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Call once at startup; a second call reports `AlreadyReg` as an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Block state
        Box::new(BLOCKS_APPLIED.clone()),
        Box::new(BLOCKS_REVERTED.clone()),
        Box::new(BLOCK_ROLLBACKS.clone()),
        Box::new(TRANSACTIONS_APPLIED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(BLOCK_APPLY_DURATION.clone()),
        // Pool
        Box::new(POOL_OUTCOMES.clone()),
        Box::new(POOL_SIZE.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
