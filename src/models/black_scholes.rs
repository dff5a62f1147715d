use crate::models::payoff::Contract;
use statrs::distribution::{ContinuousCDF, Normal};

/// Black-Scholes European prices under the same GBM dynamics the simulator
/// uses.
///
/// C = S * Phi(d1) - K * e^{-r*tau} * Phi(d2)
/// P = K * e^{-r*tau} * Phi(-d2) - S * Phi(-d1)
/// F = S - K * e^{-r*tau}
///
/// where d1 = (ln(S/K) + (r + sigma^2/2)*tau) / (sigma * sqrt(tau))
/// and d2 = d1 - sigma * sqrt(tau).
///
/// Used for the analytic reference value and for mark-to-market of paths at
/// intermediate exposure dates. No allocations.
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        // Normal::new(0, 1) only fails if std_dev <= 0
        let normal = Normal::new(0.0, 1.0).unwrap_or(Normal::standard());
        Self { normal }
    }

    /// Value of `contract` (per unit notional) with spot `s` and `tau` years
    /// to expiry. Pure function.
    #[inline]
    pub fn price(&self, contract: &Contract, s: f64, rate: f64, sigma: f64, tau: f64) -> f64 {
        let tau = tau.max(0.0);
        let k = contract.strike();
        let df_k = k * (-rate * tau).exp();

        if let Contract::Forward { .. } = contract {
            return s - df_k;
        }

        let sigma_sqrt_t = sigma * tau.sqrt();

        // Zero variance or expiry: discounted intrinsic on the forward
        if sigma_sqrt_t < 1e-12 {
            return match contract {
                Contract::Call { .. } => (s - df_k).max(0.0),
                Contract::Put { .. } => (df_k - s).max(0.0),
                Contract::Forward { .. } => s - df_k,
            };
        }

        let d1 = ((s / k).ln() + (rate + 0.5 * sigma * sigma) * tau) / sigma_sqrt_t;
        let d2 = d1 - sigma_sqrt_t;

        let value = match contract {
            Contract::Call { .. } => s * self.normal.cdf(d1) - df_k * self.normal.cdf(d2),
            Contract::Put { .. } => df_k * self.normal.cdf(-d2) - s * self.normal.cdf(-d1),
            Contract::Forward { .. } => s - df_k,
        };

        // Rounding can push deep OTM values a hair below zero
        value.max(0.0)
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}
