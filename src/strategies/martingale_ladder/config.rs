use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MartingaleLadderConfig {
    /// Starting volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Volume factor after a losing trade (default: 2.0)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Consecutive multiplications before falling back to the start volume (default: 5)
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Take profit in pips (default: 30)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,

    /// Stop loss in pips (default: 30)
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pips: f64,
}

fn default_volume() -> f64 {
    0.1
}
fn default_multiplier() -> f64 {
    2.0
}
fn default_max_steps() -> u32 {
    5
}
fn default_take_profit() -> f64 {
    30.0
}
fn default_stop_loss() -> f64 {
    30.0
}

impl Default for MartingaleLadderConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            multiplier: default_multiplier(),
            max_steps: default_max_steps(),
            take_profit_pips: default_take_profit(),
            stop_loss_pips: default_stop_loss(),
        }
    }
}

impl MartingaleLadderConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_non_negative("volume", self.volume)?;
        ensure_positive("multiplier", self.multiplier)?;
        ensure_positive("take_profit_pips", self.take_profit_pips)?;
        ensure_positive("stop_loss_pips", self.stop_loss_pips)
    }
}
