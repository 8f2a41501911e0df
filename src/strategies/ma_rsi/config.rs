//! MA + RSI configuration

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyError, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaRsiConfig {
    /// Fast EMA period (default: 10)
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,

    /// Slow EMA period (default: 30)
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,

    /// RSI period (default: 14)
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// No new longs above this RSI (default: 70)
    #[serde(default = "default_rsi_upper")]
    pub rsi_upper: f64,

    /// No new shorts below this RSI (default: 30)
    #[serde(default = "default_rsi_lower")]
    pub rsi_lower: f64,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Take profit distance in pips, 0 = disabled (default: 50)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,

    /// Stop loss distance in pips, 0 = disabled (default: 30)
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pips: f64,

    /// Trail the stop behind price (default: false)
    #[serde(default)]
    pub trailing_stop: bool,
}

fn default_fast_period() -> usize {
    10
}
fn default_slow_period() -> usize {
    30
}
fn default_rsi_period() -> usize {
    14
}
fn default_rsi_upper() -> f64 {
    70.0
}
fn default_rsi_lower() -> f64 {
    30.0
}
fn default_volume() -> f64 {
    0.1
}
fn default_take_profit() -> f64 {
    50.0
}
fn default_stop_loss() -> f64 {
    30.0
}

impl Default for MaRsiConfig {
    fn default() -> Self {
        Self {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            rsi_period: default_rsi_period(),
            rsi_upper: default_rsi_upper(),
            rsi_lower: default_rsi_lower(),
            volume: default_volume(),
            take_profit_pips: default_take_profit(),
            stop_loss_pips: default_stop_loss(),
            trailing_stop: false,
        }
    }
}

impl MaRsiConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("fast_period", self.fast_period)?;
        ensure_period("slow_period", self.slow_period)?;
        ensure_period("rsi_period", self.rsi_period)?;
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::invalid(
                "fast_period",
                format!(
                    "must be below slow_period ({} >= {})",
                    self.fast_period, self.slow_period
                ),
            ));
        }
        if !(0.0..=100.0).contains(&self.rsi_lower)
            || !(0.0..=100.0).contains(&self.rsi_upper)
            || self.rsi_lower >= self.rsi_upper
        {
            return Err(StrategyError::invalid(
                "rsi_lower",
                "RSI band must satisfy 0 <= lower < upper <= 100",
            ));
        }
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
