use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, ensure_positive, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadScalperConfig {
    /// Momentum lookback (default: 10)
    #[serde(default = "default_momentum_period")]
    pub momentum_period: usize,

    /// Minimum distance of momentum from 100 to enter (default: 0.05)
    #[serde(default = "default_momentum_threshold")]
    pub momentum_threshold: f64,

    /// Widest acceptable spread in pips (default: 2.0)
    #[serde(default = "default_max_spread")]
    pub max_spread_pips: f64,

    /// Quotes older than this many seconds count as stale (default: 60)
    #[serde(default = "default_max_quote_age")]
    pub max_quote_age_secs: i64,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 10)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,

    /// 0 = disabled (default: 10)
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pips: f64,
}

fn default_momentum_period() -> usize {
    10
}
fn default_momentum_threshold() -> f64 {
    0.05
}
fn default_max_spread() -> f64 {
    2.0
}
fn default_max_quote_age() -> i64 {
    60
}
fn default_volume() -> f64 {
    0.1
}
fn default_take_profit() -> f64 {
    10.0
}
fn default_stop_loss() -> f64 {
    10.0
}

impl Default for SpreadScalperConfig {
    fn default() -> Self {
        Self {
            momentum_period: default_momentum_period(),
            momentum_threshold: default_momentum_threshold(),
            max_spread_pips: default_max_spread(),
            max_quote_age_secs: default_max_quote_age(),
            volume: default_volume(),
            take_profit_pips: default_take_profit(),
            stop_loss_pips: default_stop_loss(),
        }
    }
}

impl SpreadScalperConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("momentum_period", self.momentum_period)?;
        ensure_non_negative("momentum_threshold", self.momentum_threshold)?;
        ensure_positive("max_spread_pips", self.max_spread_pips)?;
        ensure_non_negative("max_quote_age_secs", self.max_quote_age_secs as f64)?;
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}
