use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, ensure_positive, StrategyError, StrategyResult};

/// Upper bound on grid slots
pub const MAX_SLOTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMartingaleConfig {
    /// Trend EMA period deciding the cycle direction (default: 50)
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,

    /// Adverse move in pips before the next slot opens (default: 20)
    #[serde(default = "default_grid_step")]
    pub grid_step_pips: f64,

    /// Slots per cycle, at most 10 (default: 10)
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,

    /// Volume of the first slot (default: 0.01)
    #[serde(default = "default_base_volume")]
    pub base_volume: f64,

    /// Volume factor between consecutive slots (default: 1.5)
    #[serde(default = "default_volume_multiplier")]
    pub volume_multiplier: f64,

    /// Per-slot take profit in pips (default: 15)
    #[serde(default = "default_take_profit")]
    pub take_profit_pips: f64,

    /// Per-slot trailing stop in pips, 0 = disabled (default: 10)
    #[serde(default = "default_trailing_stop")]
    pub trailing_stop_pips: f64,
}

fn default_ema_period() -> usize {
    50
}
fn default_grid_step() -> f64 {
    20.0
}
fn default_max_slots() -> usize {
    MAX_SLOTS
}
fn default_base_volume() -> f64 {
    0.01
}
fn default_volume_multiplier() -> f64 {
    1.5
}
fn default_take_profit() -> f64 {
    15.0
}
fn default_trailing_stop() -> f64 {
    10.0
}

impl Default for GridMartingaleConfig {
    fn default() -> Self {
        Self {
            ema_period: default_ema_period(),
            grid_step_pips: default_grid_step(),
            max_slots: default_max_slots(),
            base_volume: default_base_volume(),
            volume_multiplier: default_volume_multiplier(),
            take_profit_pips: default_take_profit(),
            trailing_stop_pips: default_trailing_stop(),
        }
    }
}

impl GridMartingaleConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("ema_period", self.ema_period)?;
        ensure_positive("grid_step_pips", self.grid_step_pips)?;
        if self.max_slots == 0 || self.max_slots > MAX_SLOTS {
            return Err(StrategyError::invalid(
                "max_slots",
                format!("must be between 1 and {}", MAX_SLOTS),
            ));
        }
        ensure_non_negative("base_volume", self.base_volume)?;
        ensure_positive("volume_multiplier", self.volume_multiplier)?;
        ensure_positive("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("trailing_stop_pips", self.trailing_stop_pips)
    }

    /// Volume of slot `index` (0-based)
    pub fn slot_volume(&self, index: usize) -> f64 {
        self.base_volume * self.volume_multiplier.powi(index as i32)
    }
}
