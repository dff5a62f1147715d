//! Underlying dynamics and contract valuation.
//!
//! `gbm` simulates the underlying, `payoff` maps a price to a cash flow and
//! `black_scholes` gives the closed-form value under the same dynamics.

pub mod black_scholes;
pub mod gbm;
pub mod payoff;
