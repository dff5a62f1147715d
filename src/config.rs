use crate::errors::{EngineError, EngineResult};

/// Engine defaults and hard caps. Immutable for the lifetime of a
/// `RiskCalculator`; safe to share across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub default_path_count: u64,
    pub max_path_count: u64,
    pub default_confidence: f64,
    pub max_time_steps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_path_count: 100_000,
            max_path_count: 10_000_000,
            default_confidence: 0.95,
            max_time_steps: 1_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let default_path_count = env_var_or("RISK_DEFAULT_PATH_COUNT", "100000")
            .parse::<u64>()
            .map_err(|e| EngineError::Config(format!("RISK_DEFAULT_PATH_COUNT: {e}")))?;

        let max_path_count = env_var_or("RISK_MAX_PATH_COUNT", "10000000")
            .parse::<u64>()
            .map_err(|e| EngineError::Config(format!("RISK_MAX_PATH_COUNT: {e}")))?;

        let default_confidence = env_var_or("RISK_DEFAULT_CONFIDENCE", "0.95")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("RISK_DEFAULT_CONFIDENCE: {e}")))?;

        let max_time_steps = env_var_or("RISK_MAX_TIME_STEPS", "1000")
            .parse::<u32>()
            .map_err(|e| EngineError::Config(format!("RISK_MAX_TIME_STEPS: {e}")))?;

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        let engine = EngineConfig {
            default_path_count,
            max_path_count,
            default_confidence,
            max_time_steps,
        };
        engine.check()?;

        Ok(Self {
            engine,
            server_port,
        })
    }
}

impl EngineConfig {
    /// Reject configurations under which every request would fail.
    pub fn check(&self) -> EngineResult<()> {
        if self.max_path_count == 0 {
            return Err(EngineError::Config("RISK_MAX_PATH_COUNT must be >= 1".into()));
        }
        if self.default_path_count == 0 || self.default_path_count > self.max_path_count {
            return Err(EngineError::Config(format!(
                "RISK_DEFAULT_PATH_COUNT must be in [1, {}], got {}",
                self.max_path_count, self.default_path_count
            )));
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(EngineError::Config(format!(
                "RISK_DEFAULT_CONFIDENCE must be in [0, 1], got {}",
                self.default_confidence
            )));
        }
        Ok(())
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
