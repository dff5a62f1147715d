//! Geometric Brownian Motion path generation.
//!
//! Terminal values use the exact solution
//!
//!   S_T = S0 * exp((r - sigma^2/2) * T + sigma * sqrt(T) * Z),  Z ~ N(0, 1)
//!
//! so there is no discretisation bias and cost is O(path_count). Every call
//! owns its generator: a `ChaCha8Rng` seeded from the caller's seed, or from
//! a seed drawn off the thread-local entropy source. The seed actually used is
//! returned so any run can be replayed.

use crate::errors::{EngineError, EngineResult};
use crate::state::MarketParams;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

#[derive(Debug, Clone, Copy)]
pub struct SimulationRequest {
    pub market: MarketParams,
    pub path_count: usize,
    pub seed: Option<u64>,
}

/// Terminal prices from one simulation run. Owned by the caller, never
/// shared or cached.
#[derive(Debug, Clone)]
pub struct SimulatedPaths {
    pub terminal: Vec<f64>,
    pub seed: u64,
}

/// Check the GBM domain: spot > 0, maturity > 0, volatility >= 0, all finite.
pub fn check_market(market: &MarketParams) -> EngineResult<()> {
    if !market.spot.is_finite() || market.spot <= 0.0 {
        return Err(EngineError::invalid("spot", format!("must be finite and > 0, got {}", market.spot)));
    }
    if !market.rate.is_finite() {
        return Err(EngineError::invalid("risk_free_rate", format!("must be finite, got {}", market.rate)));
    }
    if !market.volatility.is_finite() || market.volatility < 0.0 {
        return Err(EngineError::invalid(
            "volatility",
            format!("must be finite and >= 0, got {}", market.volatility),
        ));
    }
    if !market.maturity.is_finite() || market.maturity <= 0.0 {
        return Err(EngineError::invalid(
            "maturity",
            format!("must be finite and > 0, got {}", market.maturity),
        ));
    }
    Ok(())
}

/// Use the caller's seed, or draw a fresh one from the thread-local source.
#[inline]
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

/// Simulate `path_count` independent terminal prices.
pub fn simulate(req: &SimulationRequest) -> EngineResult<SimulatedPaths> {
    check_market(&req.market)?;
    if req.path_count == 0 {
        return Err(EngineError::invalid("path_count", "must be >= 1"));
    }

    let seed = resolve_seed(req.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let terminal = simulate_with_rng(&req.market, req.path_count, &mut rng)?;

    Ok(SimulatedPaths { terminal, seed })
}

/// Core loop over a caller-owned generator. Pre-sized output, single pass.
pub fn simulate_with_rng<R: Rng + ?Sized>(
    market: &MarketParams,
    path_count: usize,
    rng: &mut R,
) -> EngineResult<Vec<f64>> {
    let s0 = market.spot;
    let drift = market.drift_t;
    let diffusion = market.sigma_sqrt_t;

    let mut terminal = Vec::with_capacity(path_count);
    terminal.extend((0..path_count).map(|_| {
        let z: f64 = rng.sample(StandardNormal);
        s0 * (drift + diffusion * z).exp()
    }));

    check_prices(&terminal)?;
    Ok(terminal)
}

/// Advances every path across a uniform time grid with exact log-normal
/// increments. Holds one price per path, so memory stays O(path_count)
/// however many dates are observed.
pub struct PathStepper {
    rng: ChaCha8Rng,
    state: Vec<f64>,
    maturity: f64,
    dt: f64,
    drift_dt: f64,
    vol_sqrt_dt: f64,
    steps: u32,
    step: u32,
}

impl PathStepper {
    pub fn new(market: &MarketParams, path_count: usize, steps: u32, seed: u64) -> EngineResult<Self> {
        check_market(market)?;
        if path_count == 0 {
            return Err(EngineError::invalid("path_count", "must be >= 1"));
        }
        if steps == 0 {
            return Err(EngineError::invalid("time_steps", "must be >= 1 for a stepped simulation"));
        }

        let dt = market.maturity / steps as f64;
        let sigma = market.volatility;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: vec![market.spot; path_count],
            maturity: market.maturity,
            dt,
            drift_dt: (market.rate - 0.5 * sigma * sigma) * dt,
            vol_sqrt_dt: sigma * dt.sqrt(),
            steps,
            step: 0,
        })
    }

    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Move all paths one date forward. Returns the date and the prices at
    /// that date, or None once maturity has been reached.
    pub fn advance(&mut self) -> EngineResult<Option<(f64, &[f64])>> {
        if self.step >= self.steps {
            return Ok(None);
        }
        self.step += 1;

        let (drift, vol) = (self.drift_dt, self.vol_sqrt_dt);
        let rng = &mut self.rng;
        for s in self.state.iter_mut() {
            let z: f64 = rng.sample(StandardNormal);
            *s *= (drift + vol * z).exp();
        }
        check_prices(&self.state)?;

        // Pin the last date to T exactly
        let t = if self.step == self.steps {
            self.maturity
        } else {
            self.step as f64 * self.dt
        };
        Ok(Some((t, &self.state)))
    }

    /// Prices at the current date (terminal once all steps have run).
    pub fn into_prices(self) -> Vec<f64> {
        self.state
    }
}

fn check_prices(prices: &[f64]) -> EngineResult<()> {
    if let Some((i, s)) = prices
        .iter()
        .enumerate()
        .find(|(_, s)| !s.is_finite() || **s <= 0.0)
    {
        tracing::error!(path = i, price = *s, "non-finite or non-positive simulated price");
        return Err(EngineError::SimulationFailure(format!(
            "path {i} produced price {s}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> MarketParams {
        MarketParams::new(100.0, 0.03, 0.2, 1.0)
    }

    #[test]
    fn test_zero_vol_is_forward_exactly() {
        let m = MarketParams::new(100.0, 0.03, 0.0, 1.0);
        let paths = simulate(&SimulationRequest { market: m, path_count: 1_000, seed: Some(7) }).unwrap();
        let expected = 100.0 * (0.03f64 * 1.0).exp();
        for (i, s) in paths.terminal.iter().enumerate() {
            assert_eq!(*s, expected, "path {i} should equal S0*exp(rT) exactly");
        }
    }

    #[test]
    fn test_count_and_positivity() {
        for n in [1usize, 2, 17, 10_000] {
            let paths = simulate(&SimulationRequest { market: market(), path_count: n, seed: Some(1) }).unwrap();
            assert_eq!(paths.terminal.len(), n);
            assert!(paths.terminal.iter().all(|s| s.is_finite() && *s > 0.0));
        }
    }

    #[test]
    fn test_seed_determinism() {
        let req = SimulationRequest { market: market(), path_count: 5_000, seed: Some(42) };
        let a = simulate(&req).unwrap();
        let b = simulate(&req).unwrap();
        assert_eq!(a.terminal, b.terminal, "same seed must reproduce the same paths");
        assert_eq!(a.seed, 42);

        let c = simulate(&SimulationRequest { seed: Some(43), ..req }).unwrap();
        assert_ne!(a.terminal, c.terminal, "different seeds should differ");
    }

    #[test]
    fn test_unseeded_reports_replayable_seed() {
        let req = SimulationRequest { market: market(), path_count: 500, seed: None };
        let first = simulate(&req).unwrap();
        let replay = simulate(&SimulationRequest { seed: Some(first.seed), ..req }).unwrap();
        assert_eq!(first.terminal, replay.terminal);
    }

    #[test]
    fn test_terminal_mean_is_forward() {
        let req = SimulationRequest { market: market(), path_count: 200_000, seed: Some(11) };
        let paths = simulate(&req).unwrap();
        let mean = paths.terminal.iter().sum::<f64>() / paths.terminal.len() as f64;
        let fwd = market().forward();
        // sd of S_T ~ 20.6, se ~ 0.046
        assert!((mean - fwd).abs() < 0.25, "mean={mean} should be near forward={fwd}");
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let bad = [
            (MarketParams::new(0.0, 0.03, 0.2, 1.0), "spot"),
            (MarketParams::new(100.0, 0.03, -0.1, 1.0), "volatility"),
            (MarketParams::new(100.0, 0.03, 0.2, 0.0), "maturity"),
            (MarketParams::new(100.0, f64::NAN, 0.2, 1.0), "risk_free_rate"),
        ];
        for (m, field) in bad {
            let err = simulate(&SimulationRequest { market: m, path_count: 10, seed: Some(1) }).unwrap_err();
            assert_eq!(err.field(), Some(field), "expected {field} rejection, got {err}");
        }

        let err = simulate(&SimulationRequest { market: market(), path_count: 0, seed: Some(1) }).unwrap_err();
        assert_eq!(err.field(), Some("path_count"));
    }

    #[test]
    fn test_overflow_is_simulation_failure() {
        let m = MarketParams::new(1e300, 500.0, 0.2, 10.0);
        let err = simulate(&SimulationRequest { market: m, path_count: 10, seed: Some(1) }).unwrap_err();
        assert!(matches!(err, EngineError::SimulationFailure(_)), "got {err}");
    }

    #[test]
    fn test_stepper_dates_and_terminal() {
        let mut stepper = PathStepper::new(&market(), 1_000, 4, 9).unwrap();
        let mut times = Vec::new();
        while let Some((t, prices)) = stepper.advance().unwrap() {
            assert_eq!(prices.len(), 1_000);
            assert!(prices.iter().all(|s| s.is_finite() && *s > 0.0));
            times.push(t);
        }
        assert_eq!(times, vec![0.25, 0.5, 0.75, 1.0]);
        assert!(stepper.advance().unwrap().is_none());
        assert_eq!(stepper.into_prices().len(), 1_000);
    }

    #[test]
    fn test_stepper_zero_vol_tracks_forward() {
        let m = MarketParams::new(100.0, 0.05, 0.0, 2.0);
        let mut stepper = PathStepper::new(&m, 10, 8, 3).unwrap();
        while let Some((t, prices)) = stepper.advance().unwrap() {
            let expected = 100.0 * (0.05 * t).exp();
            assert!(prices.iter().all(|s| (s - expected).abs() < 1e-9), "t={t}");
        }
    }
}
