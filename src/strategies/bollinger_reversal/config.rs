use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, ensure_positive, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BollingerReversalConfig {
    /// Bollinger period (default: 20)
    #[serde(default = "default_bb_period")]
    pub bb_period: usize,

    /// Band width in standard deviations (default: 2.0)
    #[serde(default = "default_bb_deviation")]
    pub bb_deviation: f64,

    /// ATR period for the stop (default: 14)
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Stop distance as ATR multiple (default: 2.0)
    #[serde(default = "default_atr_multiplier")]
    pub atr_multiplier: f64,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_bb_period() -> usize {
    20
}
fn default_bb_deviation() -> f64 {
    2.0
}
fn default_atr_period() -> usize {
    14
}
fn default_atr_multiplier() -> f64 {
    2.0
}
fn default_volume() -> f64 {
    0.1
}

impl Default for BollingerReversalConfig {
    fn default() -> Self {
        Self {
            bb_period: default_bb_period(),
            bb_deviation: default_bb_deviation(),
            atr_period: default_atr_period(),
            atr_multiplier: default_atr_multiplier(),
            volume: default_volume(),
        }
    }
}

impl BollingerReversalConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("bb_period", self.bb_period)?;
        ensure_period("atr_period", self.atr_period)?;
        ensure_positive("bb_deviation", self.bb_deviation)?;
        ensure_positive("atr_multiplier", self.atr_multiplier)?;
        ensure_non_negative("volume", self.volume)
    }
}
