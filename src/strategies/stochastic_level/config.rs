use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyError, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticLevelConfig {
    /// %K lookback (default: 5)
    #[serde(default = "default_k_period")]
    pub k_period: usize,

    /// %D smoothing (default: 3)
    #[serde(default = "default_d_period")]
    pub d_period: usize,

    /// %K slowing (default: 3)
    #[serde(default = "default_slowing")]
    pub slowing: usize,

    /// Buy crosses must happen below this level (default: 20)
    #[serde(default = "default_oversold")]
    pub oversold: f64,

    /// Sell crosses must happen above this level (default: 80)
    #[serde(default = "default_overbought")]
    pub overbought: f64,

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

fn default_k_period() -> usize {
    5
}
fn default_d_period() -> usize {
    3
}
fn default_slowing() -> usize {
    3
}
fn default_oversold() -> f64 {
    20.0
}
fn default_overbought() -> f64 {
    80.0
}
fn default_volume() -> f64 {
    0.1
}

impl Default for StochasticLevelConfig {
    fn default() -> Self {
        Self {
            k_period: default_k_period(),
            d_period: default_d_period(),
            slowing: default_slowing(),
            oversold: default_oversold(),
            overbought: default_overbought(),
            volume: default_volume(),
            take_profit_pips: 0.0,
            stop_loss_pips: 0.0,
        }
    }
}

impl StochasticLevelConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("k_period", self.k_period)?;
        ensure_period("d_period", self.d_period)?;
        ensure_period("slowing", self.slowing)?;
        if !(0.0..=100.0).contains(&self.oversold)
            || !(0.0..=100.0).contains(&self.overbought)
            || self.oversold >= self.overbought
        {
            return Err(StrategyError::invalid(
                "oversold",
                "levels must satisfy 0 <= oversold < overbought <= 100",
            ));
        }
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
