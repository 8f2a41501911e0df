use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyError, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XHullTrendConfig {
    /// Hull period (default: 20)
    #[serde(default = "default_hull_period")]
    pub hull_period: usize,

    /// EMA period of the signal line (default: 5)
    #[serde(default = "default_signal_period")]
    pub signal_period: usize,

    /// Reverse on the opposite crossing; otherwise only enter when flat (default: true)
    #[serde(default = "default_close_on_opposite")]
    pub close_on_opposite: bool,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 0)
    #[serde(default)]
    pub take_profit_pips: f64,

    /// 0 = disabled (default: 0)
    #[serde(default)]
    pub stop_loss_pips: f64,
}

fn default_hull_period() -> usize {
    20
}
fn default_signal_period() -> usize {
    5
}
fn default_close_on_opposite() -> bool {
    true
}
fn default_volume() -> f64 {
    0.1
}

impl Default for XHullTrendConfig {
    fn default() -> Self {
        Self {
            hull_period: default_hull_period(),
            signal_period: default_signal_period(),
            close_on_opposite: default_close_on_opposite(),
            volume: default_volume(),
            take_profit_pips: 0.0,
            stop_loss_pips: 0.0,
        }
    }
}

impl XHullTrendConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("signal_period", self.signal_period)?;
        if self.hull_period < 2 {
            return Err(StrategyError::invalid("hull_period", "must be at least 2"));
        }
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
