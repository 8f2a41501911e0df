//! Williams %R + Donchian Strategy
//!
//! Entries: %R climbing out of the oversold zone while price is above the
//! trend EMA (long), or falling out of the overbought zone below it (short).
//! The trend EMA can run on a slower series than the entry signal.
//!
//! Exits: close beyond the previous Donchian channel against the position,
//! plus optional pip stop/take through protection.

mod config;
mod strategy;

pub use config::WilliamsDonchianConfig;
pub use strategy::WilliamsDonchianStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "williams_donchian";
pub const DESCRIPTION: &str = "Williams %R entries with EMA trend filter and Donchian exits";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: WilliamsDonchianConfig = config
        .strategy_params()
        .context("Failed to parse williams_donchian config")?;
    params.validate()?;
    Ok(Box::new(WilliamsDonchianStrategy::new(
        params,
        config.timeframe()?,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("wpr_period", "%R Period", "Williams %R period").optimize(7.0, 21.0, 7.0),
        ParamSpec::float("oversold", "Oversold", "Oversold %R level"),
        ParamSpec::float("overbought", "Overbought", "Overbought %R level"),
        ParamSpec::int("trend_period", "Trend EMA", "Trend EMA period").optimize(20.0, 100.0, 20.0),
        ParamSpec::text("trend_timeframe", "Trend Timeframe", "Series for the trend EMA"),
        ParamSpec::int("donchian_period", "Donchian", "Exit channel period")
            .optimize(10.0, 30.0, 10.0),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<WilliamsDonchianConfig>()
}
