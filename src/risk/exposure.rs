//! Statistical aggregation over simulated scenarios.
//!
//! PV:  mean of discounted payoffs, with Monte Carlo standard error s / sqrt(n)
//! PFE: nearest-rank quantile of positive exposure,
//!      1-based rank ceil(q * n), zero-based index rank - 1 clamped to [0, n-1]
//!
//! Quantiles are found by selection (O(n)), not a full sort; the element
//! returned is the one a sort-then-index would pick.

use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanEstimate {
    pub mean: f64,
    pub standard_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureStats {
    pub expected_exposure: f64,
    pub pfe: f64,
}

/// Sample mean and its standard error. Standard error is 0 for n = 1.
pub fn mean_estimate(values: &[f64]) -> EngineResult<MeanEstimate> {
    if values.is_empty() {
        return Err(EngineError::SimulationFailure("empty scenario set".into()));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let standard_error = if values.len() > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (n - 1.0)).sqrt() / n.sqrt()
    } else {
        0.0
    };

    if !mean.is_finite() || !standard_error.is_finite() {
        return Err(EngineError::SimulationFailure(format!(
            "non-finite estimate: mean={mean}, se={standard_error}"
        )));
    }
    Ok(MeanEstimate { mean, standard_error })
}

pub fn check_confidence(q: f64) -> EngineResult<()> {
    if !(0.0..=1.0).contains(&q) {
        return Err(EngineError::invalid(
            "confidence_level",
            format!("must be in [0, 1], got {q}"),
        ));
    }
    Ok(())
}

/// Zero-based index of the nearest-rank q-quantile in a sample of n.
///
/// `q` is read as the decimal it was written as: a product `q * n` within one
/// ulp of an integer counts as that integer, so 0.07 * 100 gives rank 7
/// rather than 8. Anything further off takes the ceiling.
#[inline]
pub fn nearest_rank_index(q: f64, n: usize) -> usize {
    debug_assert!(n > 0);
    let x = q * n as f64;
    let nearest = x.round();
    let rank = if nearest > 0.0 && (x - nearest).abs() <= ulp(nearest) {
        nearest
    } else {
        x.ceil()
    };
    (rank.max(0.0) as usize).saturating_sub(1).min(n - 1)
}

/// Spacing to the next representable f64 above a positive finite `x`.
#[inline]
fn ulp(x: f64) -> f64 {
    f64::from_bits(x.to_bits() + 1) - x
}

/// Nearest-rank quantile. Reorders `values` in place.
pub fn nearest_rank_quantile(values: &mut [f64], q: f64) -> EngineResult<f64> {
    check_confidence(q)?;
    if values.is_empty() {
        return Err(EngineError::SimulationFailure("empty scenario set".into()));
    }
    let idx = nearest_rank_index(q, values.len());
    let (_, v, _) = values.select_nth_unstable_by(idx, |a, b| a.total_cmp(b));
    Ok(*v)
}

/// Expected exposure and PFE over per-path exposures (already floored at 0).
/// Reorders `exposures` in place.
pub fn exposure_stats(exposures: &mut [f64], q: f64) -> EngineResult<ExposureStats> {
    let expected_exposure = mean_estimate(exposures)?.mean;
    let pfe = nearest_rank_quantile(exposures, q)?;
    Ok(ExposureStats { expected_exposure, pfe })
}
