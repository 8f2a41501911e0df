use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZigZagBreakoutConfig {
    /// Candles a pivot must dominate (default: 12)
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Minimum swing size in pips (default: 5)
    #[serde(default = "default_deviation")]
    pub deviation_pips: f64,

    /// Minimum candles between opposite pivots (default: 3)
    #[serde(default = "default_backstep")]
    pub backstep: usize,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 0)
    #[serde(default)]
    pub take_profit_pips: f64,
}

fn default_depth() -> usize {
    12
}
fn default_deviation() -> f64 {
    5.0
}
fn default_backstep() -> usize {
    3
}
fn default_volume() -> f64 {
    0.1
}

impl Default for ZigZagBreakoutConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            deviation_pips: default_deviation(),
            backstep: default_backstep(),
            volume: default_volume(),
            take_profit_pips: 0.0,
        }
    }
}

impl ZigZagBreakoutConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("depth", self.depth)?;
        ensure_non_negative("deviation_pips", self.deviation_pips)?;
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)
    }
}
