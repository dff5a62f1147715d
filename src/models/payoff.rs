/// Contract payoffs at maturity, per unit of notional.
///
/// Call:    max(S_T - K, 0)
/// Put:     max(K - S_T, 0)
/// Forward: S_T - K
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Contract {
    Call { strike: f64 },
    Put { strike: f64 },
    Forward { strike: f64 },
}

impl Contract {
    /// Build a contract from a trade type string. `OPTION` is priced as a
    /// call. Returns None for unrecognised types.
    pub fn from_trade_type(trade_type: &str, strike: f64) -> Option<Self> {
        match trade_type.trim().to_ascii_uppercase().as_str() {
            "CALL" | "OPTION" => Some(Contract::Call { strike }),
            "PUT" => Some(Contract::Put { strike }),
            "FORWARD" => Some(Contract::Forward { strike }),
            _ => None,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Contract::Call { .. } => "call",
            Contract::Put { .. } => "put",
            Contract::Forward { .. } => "forward",
        }
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        match *self {
            Contract::Call { strike } | Contract::Put { strike } | Contract::Forward { strike } => strike,
        }
    }

    #[inline]
    pub fn is_option(&self) -> bool {
        !matches!(self, Contract::Forward { .. })
    }

    /// Payoff for terminal price `s`. Pure function.
    #[inline]
    pub fn payoff(&self, s: f64) -> f64 {
        match *self {
            Contract::Call { strike } => (s - strike).max(0.0),
            Contract::Put { strike } => (strike - s).max(0.0),
            Contract::Forward { strike } => s - strike,
        }
    }
}
