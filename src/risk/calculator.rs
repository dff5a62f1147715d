use crate::config::EngineConfig;
use crate::errors::EngineResult;
use crate::models::black_scholes::BlackScholes;
use crate::models::gbm::{self, PathStepper, SimulationRequest};
use crate::risk::exposure::{exposure_stats, mean_estimate};
use crate::risk::validation::{check_limits, validate_request};
use crate::state::{ExposurePoint, RiskResult, TradeRequest};
use crate::wire::{self, TradeRequestMsg};
use std::time::Instant;

/// Monte Carlo PV / PFE calculator for a single trade.
///
/// Stateless apart from immutable configuration: every call owns its
/// generator and buffers, so one instance can serve any number of threads.
///
/// Conventions:
/// - `pv` is the mean of notional * payoff * exp(-rT) over all paths.
/// - Exposure is max(notional * value, 0), undiscounted, at the exposure date.
///   At maturity the value is the payoff; at earlier profile dates it is the
///   Black-Scholes mark-to-market of the path's price.
/// - `pfe` is the nearest-rank `confidence_level` quantile of exposure at
///   maturity.
pub struct RiskCalculator {
    config: EngineConfig,
    bs: BlackScholes,
}

impl RiskCalculator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            bs: BlackScholes::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bytes in, bytes out: decode, validate, simulate, aggregate, encode.
    pub fn calculate_risk_bytes(&self, request: &[u8]) -> EngineResult<Vec<u8>> {
        let msg = wire::decode_request(request)?;
        let result = self.calculate_risk_msg(&msg)?;
        Ok(wire::encode_result(&result))
    }

    pub fn calculate_risk_msg(&self, msg: &TradeRequestMsg) -> EngineResult<RiskResult> {
        let req = validate_request(msg, &self.config)?;
        self.calculate(&req)
    }

    /// Price a request. Caps from the engine config are enforced here too, so
    /// a hand-built `TradeRequest` cannot exceed them.
    pub fn calculate(&self, req: &TradeRequest) -> EngineResult<RiskResult> {
        check_limits(req, &self.config)?;
        let started = Instant::now();
        let seed = gbm::resolve_seed(req.rng_seed);

        let (terminal, exposure_profile) = if req.time_steps == 0 {
            let paths = gbm::simulate(&SimulationRequest {
                market: req.market,
                path_count: req.path_count,
                seed: Some(seed),
            })?;
            (paths.terminal, Vec::new())
        } else {
            self.simulate_profile(req, seed)?
        };

        tracing::debug!(
            trade_id = %req.trade_id,
            paths = terminal.len(),
            steps = req.time_steps,
            seed,
            "simulation complete"
        );

        let contract = req.contract;
        let notional = req.notional;
        let discount = req.market.discount;

        // One scratch buffer: discounted payoffs first, then exposures
        let mut scratch: Vec<f64> = terminal
            .iter()
            .map(|&s| notional * contract.payoff(s) * discount)
            .collect();
        let pv = mean_estimate(&scratch)?;

        for (slot, &s) in scratch.iter_mut().zip(terminal.iter()) {
            *slot = (notional * contract.payoff(s)).max(0.0);
        }
        drop(terminal);
        let exposure = exposure_stats(&mut scratch, req.confidence_level)?;

        let m = &req.market;
        let analytic_pv = notional * self.bs.price(&contract, m.spot, m.rate, m.volatility, m.maturity);

        tracing::debug!(
            trade_id = %req.trade_id,
            contract = contract.name(),
            pv = pv.mean,
            se = pv.standard_error,
            analytic_pv,
            pfe = exposure.pfe,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "risk calculated"
        );

        Ok(RiskResult {
            trade_id: req.trade_id.clone(),
            counterparty_id: req.counterparty_id.clone(),
            pv: pv.mean,
            pfe: exposure.pfe,
            confidence_level: req.confidence_level,
            path_count: req.path_count,
            standard_error: pv.standard_error,
            expected_exposure: exposure.expected_exposure,
            analytic_pv,
            rng_seed: seed,
            exposure_profile,
        })
    }

    /// Step all paths across the exposure grid, aggregating EE / PFE at each
    /// date. Returns terminal prices plus the profile.
    fn simulate_profile(&self, req: &TradeRequest, seed: u64) -> EngineResult<(Vec<f64>, Vec<ExposurePoint>)> {
        let contract = req.contract;
        let notional = req.notional;
        let m = req.market;

        let mut stepper = PathStepper::new(&m, req.path_count, req.time_steps, seed)?;
        let mut scratch: Vec<f64> = Vec::with_capacity(req.path_count);
        let mut profile = Vec::with_capacity(stepper.steps() as usize);

        while let Some((t, prices)) = stepper.advance()? {
            let tau = m.maturity - t;
            scratch.clear();
            if tau <= 0.0 {
                scratch.extend(prices.iter().map(|&s| (notional * contract.payoff(s)).max(0.0)));
            } else {
                scratch.extend(
                    prices
                        .iter()
                        .map(|&s| (notional * self.bs.price(&contract, s, m.rate, m.volatility, tau)).max(0.0)),
                );
            }
            let stats = exposure_stats(&mut scratch, req.confidence_level)?;
            profile.push(ExposurePoint {
                time: t,
                expected_exposure: stats.expected_exposure,
                pfe: stats.pfe,
            });
        }

        Ok((stepper.into_prices(), profile))
    }
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
