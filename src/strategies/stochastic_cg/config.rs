use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticCgConfig {
    /// Centre of gravity window (default: 10)
    #[serde(default = "default_length")]
    pub length: usize,

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

fn default_length() -> usize {
    10
}
fn default_volume() -> f64 {
    0.1
}

impl Default for StochasticCgConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            volume: default_volume(),
            take_profit_pips: 0.0,
            stop_loss_pips: 0.0,
        }
    }
}

impl StochasticCgConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("length", self.length)?;
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
