/// Domain-specific error types for the risk engine.
/// Every failure is terminal for the single calculation that raised it:
/// - No retries inside the engine
/// - No partial results
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("simulation failure: {0}")]
    SimulationFailure(String),

    #[error("config error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used in service error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Decode(_) => "decode_error",
            EngineError::InvalidParameter { .. } => "invalid_parameter",
            EngineError::SimulationFailure(_) => "simulation_failure",
            EngineError::Config(_) => "config_error",
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            EngineError::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<prost::DecodeError> for EngineError {
    fn from(e: prost::DecodeError) -> Self {
        EngineError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Decode(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
