use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::models::gbm;
use crate::models::payoff::Contract;
use crate::risk::exposure::check_confidence;
use crate::state::{MarketParams, TradeRequest};
use crate::wire::TradeRequestMsg;

/// Turn a decoded wire request into a validated `TradeRequest`.
/// Checks run in field order; the first violation is returned, naming the
/// field. Nothing is simulated for a request that fails here.
pub fn validate_request(msg: &TradeRequestMsg, cfg: &EngineConfig) -> EngineResult<TradeRequest> {
    // 1. Market
    let market = MarketParams::new(msg.spot_price, msg.risk_free_rate, msg.volatility, msg.maturity);
    gbm::check_market(&market)?;

    // 2. Contract
    if !msg.strike.is_finite() {
        return Err(EngineError::invalid("strike", format!("must be finite, got {}", msg.strike)));
    }
    let contract = Contract::from_trade_type(&msg.trade_type, msg.strike).ok_or_else(|| {
        EngineError::invalid(
            "trade_type",
            format!("unsupported trade type {:?} (expected CALL, PUT, FORWARD or OPTION)", msg.trade_type),
        )
    })?;
    if contract.is_option() && msg.strike <= 0.0 {
        return Err(EngineError::invalid("strike", format!("must be > 0 for options, got {}", msg.strike)));
    }
    if msg.strike < 0.0 {
        return Err(EngineError::invalid("strike", format!("must be >= 0, got {}", msg.strike)));
    }

    // 3. Notional: unset or zero means one unit
    let notional = match msg.notional {
        None => 1.0,
        Some(n) if !n.is_finite() => {
            return Err(EngineError::invalid("notional", format!("must be finite, got {n}")));
        }
        Some(n) if n == 0.0 => 1.0,
        Some(n) => n,
    };

    // 4. Simulation controls
    let path_count = match msg.path_count {
        None => cfg.default_path_count,
        Some(n) if n < 1 => {
            return Err(EngineError::invalid("path_count", format!("must be >= 1, got {n}")));
        }
        Some(n) => n as u64,
    };
    if path_count > cfg.max_path_count {
        return Err(EngineError::invalid(
            "path_count",
            format!("must be <= {}, got {path_count}", cfg.max_path_count),
        ));
    }
    let path_count = usize::try_from(path_count)
        .map_err(|_| EngineError::invalid("path_count", format!("{path_count} exceeds address space")))?;

    let confidence_level = msg.confidence_level.unwrap_or(cfg.default_confidence);
    check_confidence(confidence_level)?;

    let time_steps = msg.time_steps.unwrap_or(0);
    if time_steps > cfg.max_time_steps {
        return Err(EngineError::invalid(
            "time_steps",
            format!("must be <= {}, got {time_steps}", cfg.max_time_steps),
        ));
    }

    let req = TradeRequest {
        trade_id: msg.trade_id.clone(),
        counterparty_id: msg.counterparty_id.clone(),
        contract,
        notional,
        market,
        path_count,
        confidence_level,
        rng_seed: msg.rng_seed,
        time_steps,
    };
    check_limits(&req, cfg)?;
    Ok(req)
}

/// Re-check an already built `TradeRequest` against the engine's invariants
/// and caps. Requests assembled by hand, bypassing `validate_request`, go
/// through the same gate before anything is simulated.
pub fn check_limits(req: &TradeRequest, cfg: &EngineConfig) -> EngineResult<()> {
    let m = &req.market;
    gbm::check_market(m)?;
    let rebuilt = MarketParams::new(m.spot, m.rate, m.volatility, m.maturity);
    if rebuilt != *m {
        return Err(EngineError::invalid("market", "precomputed terms do not match inputs"));
    }

    let strike = req.contract.strike();
    if !strike.is_finite() || strike < 0.0 || (req.contract.is_option() && strike == 0.0) {
        return Err(EngineError::invalid("strike", format!("out of range for {}: {strike}", req.contract.name())));
    }
    if !req.notional.is_finite() {
        return Err(EngineError::invalid("notional", format!("must be finite, got {}", req.notional)));
    }
    if req.path_count == 0 || req.path_count as u64 > cfg.max_path_count {
        return Err(EngineError::invalid(
            "path_count",
            format!("must be in [1, {}], got {}", cfg.max_path_count, req.path_count),
        ));
    }
    check_confidence(req.confidence_level)?;
    if req.time_steps > cfg.max_time_steps {
        return Err(EngineError::invalid(
            "time_steps",
            format!("must be <= {}, got {}", cfg.max_time_steps, req.time_steps),
        ));
    }
    Ok(())
}
