//! MACD Sample Strategy
//!
//! The MACD Sample expert shipped with MetaTrader:
//! - Long when MACD is below zero, crosses above its signal line, exceeds the
//!   open level and the trend EMA is rising (mirror for shorts)
//! - Close when MACD crosses back on the other side of zero beyond the close
//!   level
//! - Take profit set on entry, trailing stop managed bar by bar

mod config;
mod strategy;

pub use config::MacdSampleConfig;
pub use strategy::MacdSampleStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "macd_sample";
pub const DESCRIPTION: &str = "Classic MACD Sample expert with trailing stop";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: MacdSampleConfig = config
        .strategy_params()
        .context("Failed to parse macd_sample config")?;
    params.validate()?;
    Ok(Box::new(MacdSampleStrategy::new(params, config.timeframe()?)?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips")
            .optimize(20.0, 100.0, 20.0),
        ParamSpec::float("trailing_stop_pips", "Trailing Stop", "Trailing stop in pips")
            .optimize(10.0, 50.0, 10.0),
        ParamSpec::float("macd_open_level", "MACD Open", "MACD open level in pips"),
        ParamSpec::float("macd_close_level", "MACD Close", "MACD close level in pips"),
        ParamSpec::int("trend_period", "Trend MA", "Trend EMA period"),
        ParamSpec::int("fast_period", "Fast EMA", "MACD fast period"),
        ParamSpec::int("slow_period", "Slow EMA", "MACD slow period"),
        ParamSpec::int("signal_period", "Signal", "MACD signal period"),
        ParamSpec::float("volume", "Volume", "Order volume"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<MacdSampleConfig>()
}
