//! Grid Martingale Strategy
//!
//! Opens a cycle in the direction of the trend EMA and adds a slot each time
//! price moves `grid_step_pips` against the most recent one, every slot larger
//! than the previous by `volume_multiplier`. Slots are managed one by one: each
//! has its own take profit and trailing stop and is closed with a market order
//! of its own volume. The cycle ends when every slot is closed.

mod config;
mod strategy;

pub use config::{GridMartingaleConfig, MAX_SLOTS};
pub use strategy::GridMartingaleStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "grid_martingale";
pub const DESCRIPTION: &str = "Ten-slot martingale grid in the EMA trend direction";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: GridMartingaleConfig = config
        .strategy_params()
        .context("Failed to parse grid_martingale config")?;
    params.validate()?;
    Ok(Box::new(GridMartingaleStrategy::new(
        params,
        config.timeframe()?,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("ema_period", "EMA Period", "Trend EMA period").optimize(20.0, 100.0, 20.0),
        ParamSpec::float("grid_step_pips", "Grid Step", "Pips between slots")
            .optimize(10.0, 40.0, 10.0),
        ParamSpec::int("max_slots", "Max Slots", "Slots per cycle"),
        ParamSpec::float("base_volume", "Base Volume", "First slot volume"),
        ParamSpec::float("volume_multiplier", "Multiplier", "Volume factor per slot")
            .optimize(1.0, 2.0, 0.5),
        ParamSpec::float("take_profit_pips", "Take Profit", "Per-slot take profit in pips"),
        ParamSpec::float("trailing_stop_pips", "Trailing Stop", "Per-slot trailing stop in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<GridMartingaleConfig>()
}
