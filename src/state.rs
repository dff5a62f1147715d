use crate::config::AppConfig;
use crate::models::payoff::Contract;
use crate::risk::calculator::RiskCalculator;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Market inputs (immutable per calculation) ──

/// GBM market parameters with the terms every pricing routine needs
/// precomputed once. Stack-allocated, Copy.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MarketParams {
    pub spot: f64,
    pub rate: f64,
    pub volatility: f64,
    pub maturity: f64,
    // Precomputed
    pub sqrt_t: f64,
    pub sigma_sqrt_t: f64,
    /// (r - sigma^2/2) * T
    pub drift_t: f64,
    /// exp(-r * T)
    pub discount: f64,
}

impl MarketParams {
    #[inline]
    pub fn new(spot: f64, rate: f64, volatility: f64, maturity: f64) -> Self {
        let sqrt_t = maturity.sqrt();
        Self {
            spot,
            rate,
            volatility,
            maturity,
            sqrt_t,
            sigma_sqrt_t: volatility * sqrt_t,
            drift_t: (rate - 0.5 * volatility * volatility) * maturity,
            discount: (-rate * maturity).exp(),
        }
    }

    /// Risk-neutral forward S0 * exp(rT).
    #[inline]
    pub fn forward(&self) -> f64 {
        self.spot * (self.rate * self.maturity).exp()
    }
}

// ── Decoded, validated trade request ──

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TradeRequest {
    pub trade_id: String,
    pub counterparty_id: String,
    pub contract: Contract,
    /// Signed payoff multiplier. Negative = short.
    pub notional: f64,
    pub market: MarketParams,
    pub path_count: usize,
    pub confidence_level: f64,
    pub rng_seed: Option<u64>,
    /// 0 = terminal exposure only.
    pub time_steps: u32,
}

// ── Result ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ExposurePoint {
    pub time: f64,
    pub expected_exposure: f64,
    pub pfe: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RiskResult {
    pub trade_id: String,
    pub counterparty_id: String,
    pub pv: f64,
    pub pfe: f64,
    pub confidence_level: f64,
    pub path_count: usize,
    pub standard_error: f64,
    pub expected_exposure: f64,
    pub analytic_pv: f64,
    pub rng_seed: u64,
    pub exposure_profile: Vec<ExposurePoint>,
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub requests_received: AtomicU64,
    pub calculations_ok: AtomicU64,
    pub decode_errors: AtomicU64,
    pub invalid_requests: AtomicU64,
    pub simulation_failures: AtomicU64,
    pub config_errors: AtomicU64,
    pub paths_simulated: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            calculations_ok: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            invalid_requests: AtomicU64::new(0),
            simulation_failures: AtomicU64::new(0),
            config_errors: AtomicU64::new(0),
            paths_simulated: AtomicU64::new(0),
        }
    }

    pub fn record_error(&self, e: &crate::errors::EngineError) {
        use crate::errors::EngineError;
        let counter = match e {
            EngineError::Decode(_) => &self.decode_errors,
            EngineError::InvalidParameter { .. } => &self.invalid_requests,
            EngineError::SimulationFailure(_) => &self.simulation_failures,
            EngineError::Config(_) => &self.config_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

// ── Application shared state (service only; the engine itself is stateless) ──

pub struct AppState {
    pub config: AppConfig,
    pub calculator: RiskCalculator,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            calculator: RiskCalculator::new(config.engine),
            config,
            started_at: chrono::Utc::now(),
            counters: PerfCounters::new(),
        })
    }
}
