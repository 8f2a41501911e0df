use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyError, StrategyResult};
use crate::Timeframe;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WilliamsDonchianConfig {
    /// Williams %R period (default: 14)
    #[serde(default = "default_wpr_period")]
    pub wpr_period: usize,

    /// %R level a long entry must climb out of (default: -80)
    #[serde(default = "default_oversold")]
    pub oversold: f64,

    /// %R level a short entry must fall out of (default: -20)
    #[serde(default = "default_overbought")]
    pub overbought: f64,

    /// Trend EMA period (default: 50)
    #[serde(default = "default_trend_period")]
    pub trend_period: usize,

    /// Series the trend EMA runs on, primary series when absent
    #[serde(default)]
    pub trend_timeframe: Option<Timeframe>,

    /// Donchian channel period for exits (default: 20)
    #[serde(default = "default_donchian_period")]
    pub donchian_period: usize,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 0)
    #[serde(default)]
    pub take_profit_pips: f64,

    /// 0 = disabled (default: 40)
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pips: f64,
}

fn default_wpr_period() -> usize {
    14
}
fn default_oversold() -> f64 {
    -80.0
}
fn default_overbought() -> f64 {
    -20.0
}
fn default_trend_period() -> usize {
    50
}
fn default_donchian_period() -> usize {
    20
}
fn default_volume() -> f64 {
    0.1
}
fn default_stop_loss() -> f64 {
    40.0
}

impl Default for WilliamsDonchianConfig {
    fn default() -> Self {
        Self {
            wpr_period: default_wpr_period(),
            oversold: default_oversold(),
            overbought: default_overbought(),
            trend_period: default_trend_period(),
            trend_timeframe: None,
            donchian_period: default_donchian_period(),
            volume: default_volume(),
            take_profit_pips: 0.0,
            stop_loss_pips: default_stop_loss(),
        }
    }
}

impl WilliamsDonchianConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("wpr_period", self.wpr_period)?;
        ensure_period("trend_period", self.trend_period)?;
        ensure_period("donchian_period", self.donchian_period)?;
        if !(-100.0..=0.0).contains(&self.oversold)
            || !(-100.0..=0.0).contains(&self.overbought)
            || self.oversold >= self.overbought
        {
            return Err(StrategyError::invalid(
                "oversold",
                "levels must satisfy -100 <= oversold < overbought <= 0",
            ));
        }
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
