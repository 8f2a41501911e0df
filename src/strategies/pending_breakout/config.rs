use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBreakoutConfig {
    /// Distance beyond the previous candle range in pips (default: 5)
    #[serde(default = "default_offset")]
    pub offset_pips: f64,

    /// Cancel unfilled orders after this many candles (default: 3)
    #[serde(default = "default_expiry_bars")]
    pub expiry_bars: usize,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 30)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,
}

fn default_offset() -> f64 {
    5.0
}
fn default_expiry_bars() -> usize {
    3
}
fn default_volume() -> f64 {
    0.1
}
fn default_take_profit() -> f64 {
    30.0
}

impl Default for PendingBreakoutConfig {
    fn default() -> Self {
        Self {
            offset_pips: default_offset(),
            expiry_bars: default_expiry_bars(),
            volume: default_volume(),
            take_profit_pips: default_take_profit(),
        }
    }
}

impl PendingBreakoutConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_non_negative("offset_pips", self.offset_pips)?;
        ensure_period("expiry_bars", self.expiry_bars)?;
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)
    }
}
