//! MACD Sample configuration

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyError, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdSampleConfig {
    /// Take profit in pips (default: 50)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,

    /// Trailing stop distance in pips, 0 = disabled (default: 30)
    #[serde(default = "default_trailing_stop")]
    pub trailing_stop_pips: f64,

    /// Minimum |MACD| in pips to open (default: 3)
    #[serde(default = "default_open_level")]
    pub macd_open_level: f64,

    /// Minimum |MACD| in pips to close (default: 2)
    #[serde(default = "default_close_level")]
    pub macd_close_level: f64,

    /// Trend EMA period (default: 26)
    #[serde(default = "default_trend_period")]
    pub trend_period: usize,

    #[serde(default = "default_fast")]
    pub fast_period: usize,

    #[serde(default = "default_slow")]
    pub slow_period: usize,

    #[serde(default = "default_signal")]
    pub signal_period: usize,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_take_profit() -> f64 {
    50.0
}
fn default_trailing_stop() -> f64 {
    30.0
}
fn default_open_level() -> f64 {
    3.0
}
fn default_close_level() -> f64 {
    2.0
}
fn default_trend_period() -> usize {
    26
}
fn default_fast() -> usize {
    12
}
fn default_slow() -> usize {
    26
}
fn default_signal() -> usize {
    9
}
fn default_volume() -> f64 {
    0.1
}

impl Default for MacdSampleConfig {
    fn default() -> Self {
        Self {
            take_profit_pips: default_take_profit(),
            trailing_stop_pips: default_trailing_stop(),
            macd_open_level: default_open_level(),
            macd_close_level: default_close_level(),
            trend_period: default_trend_period(),
            fast_period: default_fast(),
            slow_period: default_slow(),
            signal_period: default_signal(),
            volume: default_volume(),
        }
    }
}

impl MacdSampleConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("trend_period", self.trend_period)?;
        ensure_period("fast_period", self.fast_period)?;
        ensure_period("slow_period", self.slow_period)?;
        ensure_period("signal_period", self.signal_period)?;
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::invalid(
                "fast_period",
                "must be below slow_period",
            ));
        }
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("trailing_stop_pips", self.trailing_stop_pips)?;
        ensure_non_negative("macd_open_level", self.macd_open_level)?;
        ensure_non_negative("macd_close_level", self.macd_close_level)?;
        ensure_non_negative("volume", self.volume)
    }
}
