//! Pending Breakout Strategy
//!
//! Brackets the previous candle with a buy stop above its high and a sell stop
//! below its low (plus an offset). The first order to fill cancels the other
//! and its price becomes the stop loss. Unfilled brackets expire after a
//! number of candles and are re-armed on the next one.

mod config;
mod strategy;

pub use config::PendingBreakoutConfig;
pub use strategy::PendingBreakoutStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "pending_breakout";
pub const DESCRIPTION: &str = "Stop-order bracket around the previous candle, one cancels other";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: PendingBreakoutConfig = config
        .strategy_params()
        .context("Failed to parse pending_breakout config")?;
    params.validate()?;
    Ok(Box::new(PendingBreakoutStrategy::new(
        params,
        config.timeframe()?,
    )))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::float("offset_pips", "Offset", "Distance beyond the range in pips")
            .optimize(0.0, 20.0, 5.0),
        ParamSpec::int("expiry_bars", "Expiry", "Candles before unfilled orders expire")
            .optimize(1.0, 5.0, 1.0),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<PendingBreakoutConfig>()
}
