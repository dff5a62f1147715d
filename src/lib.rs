//! Monte Carlo counterparty risk engine.
//!
//! Prices a single derivative trade under Geometric Brownian Motion and
//! reports its present value (PV) and potential future exposure (PFE).
//! The engine is synchronous and stateless: each call owns its random
//! generator and buffers, so calls from any number of threads are independent.

pub mod config;
pub mod errors;
pub mod models;
pub mod risk;
pub mod server;
pub mod state;
pub mod wire;

pub use config::EngineConfig;
pub use errors::{EngineError, EngineResult};
pub use risk::calculator::RiskCalculator;
pub use state::{ExposurePoint, MarketParams, RiskResult, TradeRequest};

/// Serialized `TradeRequestMsg` in, serialized `ValuationResultMsg` out,
/// using the default engine configuration.
pub fn calculate_risk(request: &[u8]) -> EngineResult<Vec<u8>> {
    RiskCalculator::default().calculate_risk_bytes(request)
}
