//! Heikin-Ashi Smoothed Strategy
//!
//! Two-stage smoothed Heikin-Ashi candles; a change of colour from bearish
//! to bullish opens (or reverses into) a long, the opposite change a short.

mod config;
mod indicator;
mod strategy;

pub use config::HeikinAshiSmoothedConfig;
pub use indicator::{HaValue, SmoothedHeikinAshi};
pub use strategy::HeikinAshiSmoothedStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "heikin_ashi_smoothed";
pub const DESCRIPTION: &str = "Colour changes of double-smoothed Heikin-Ashi candles";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: HeikinAshiSmoothedConfig = config
        .strategy_params()
        .context("Failed to parse heikin_ashi_smoothed config")?;
    params.validate()?;
    Ok(Box::new(HeikinAshiSmoothedStrategy::new(
        params,
        config.timeframe()?,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::text("ma_method1", "MA Method 1", "First smoothing method"),
        ParamSpec::int("ma_period1", "MA Period 1", "First smoothing period")
            .optimize(2.0, 12.0, 2.0),
        ParamSpec::text("ma_method2", "MA Method 2", "Second smoothing method"),
        ParamSpec::int("ma_period2", "MA Period 2", "Second smoothing period")
            .optimize(1.0, 5.0, 1.0),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<HeikinAshiSmoothedConfig>()
}
