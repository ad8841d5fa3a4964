//! Cross-crate integration suites.

mod pool_flow;
mod properties;
mod scenarios;
mod telemetry;
