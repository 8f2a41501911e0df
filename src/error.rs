//! Library error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown strategy '{name}'. Available: {available}")]
    UnknownStrategy { name: String, available: String },

    #[error("invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("strategy config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl StrategyError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type StrategyResult<T> = Result<T, StrategyError>;

/// Guard helpers shared by the per-strategy `validate()` implementations
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> StrategyResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(StrategyError::invalid(name, format!("must be > 0, got {}", value)))
    }
}

pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> StrategyResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(StrategyError::invalid(name, format!("must be >= 0, got {}", value)))
    }
}

pub(crate) fn ensure_period(name: &'static str, value: usize) -> StrategyResult<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(StrategyError::invalid(name, "period must be at least 1"))
    }
}
