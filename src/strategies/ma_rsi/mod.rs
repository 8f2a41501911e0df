//! MA + RSI Strategy
//!
//! Fast/slow EMA crossover confirmed by RSI: a bullish cross is only taken
//! while RSI is below the upper band, a bearish one while it is above the
//! lower band. Positions reverse on the opposite signal. Stop loss and take
//! profit are installed once through `start_protection` in pips.

mod config;
mod strategy;

pub use config::MaRsiConfig;
pub use strategy::MaRsiStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "ma_rsi";
pub const DESCRIPTION: &str = "EMA crossover confirmed by RSI with pip protection";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: MaRsiConfig = config
        .strategy_params()
        .context("Failed to parse ma_rsi config")?;
    params.validate()?;
    Ok(Box::new(MaRsiStrategy::new(params, config.timeframe()?)?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("fast_period", "Fast EMA", "Fast EMA period").optimize(5.0, 20.0, 5.0),
        ParamSpec::int("slow_period", "Slow EMA", "Slow EMA period").optimize(20.0, 60.0, 10.0),
        ParamSpec::int("rsi_period", "RSI Period", "RSI period"),
        ParamSpec::float("rsi_upper", "RSI Upper", "No longs above this RSI"),
        ParamSpec::float("rsi_lower", "RSI Lower", "No shorts below this RSI"),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips")
            .optimize(0.0, 100.0, 25.0),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips")
            .optimize(10.0, 50.0, 10.0),
        ParamSpec::flag("trailing_stop", "Trailing", "Trail the stop loss"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<MaRsiConfig>()
}
