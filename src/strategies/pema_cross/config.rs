use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PemaCrossConfig {
    /// Period of each EMA stage (default: 14)
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 60)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,

    /// 0 = disabled (default: 30)
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pips: f64,
}

fn default_ema_period() -> usize {
    14
}
fn default_volume() -> f64 {
    0.1
}
fn default_take_profit() -> f64 {
    60.0
}
fn default_stop_loss() -> f64 {
    30.0
}

impl Default for PemaCrossConfig {
    fn default() -> Self {
        Self {
            ema_period: default_ema_period(),
            volume: default_volume(),
            take_profit_pips: default_take_profit(),
            stop_loss_pips: default_stop_loss(),
        }
    }
}

impl PemaCrossConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("ema_period", self.ema_period)?;
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
