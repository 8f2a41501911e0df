//! ZigZag Breakout Strategy
//!
//! Records ZigZag swings and trades closes beyond them: above the last
//! confirmed swing high buys, below the last swing low sells. The stop goes to
//! the opposite swing. Each swing level is traded at most once.

mod config;
mod strategy;
mod zigzag;

pub use config::ZigZagBreakoutConfig;
pub use strategy::ZigZagBreakoutStrategy;
pub use zigzag::{Pivot, PivotKind, ZigZag};

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "zigzag_breakout";
pub const DESCRIPTION: &str = "Breakout of confirmed ZigZag swings with stop at the opposite pivot";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: ZigZagBreakoutConfig = config
        .strategy_params()
        .context("Failed to parse zigzag_breakout config")?;
    params.validate()?;
    Ok(Box::new(ZigZagBreakoutStrategy::new(
        params,
        config.timeframe()?,
        &config.security,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("depth", "Depth", "Candles a pivot must dominate").optimize(6.0, 24.0, 6.0),
        ParamSpec::float("deviation_pips", "Deviation", "Minimum swing in pips")
            .optimize(0.0, 20.0, 5.0),
        ParamSpec::int("backstep", "Backstep", "Candles between opposite pivots"),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<ZigZagBreakoutConfig>()
}
