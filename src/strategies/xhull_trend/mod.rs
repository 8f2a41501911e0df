//! XHullTrend Strategy
//!
//! Hull moving average against its own EMA signal line. The Hull line
//! crossing above the signal goes long, crossing below goes short.

mod config;
mod hull;
mod strategy;

pub use config::XHullTrendConfig;
pub use hull::HullMa;
pub use strategy::XHullTrendStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "xhull_trend";
pub const DESCRIPTION: &str = "Hull moving average crossing its EMA signal line";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: XHullTrendConfig = config
        .strategy_params()
        .context("Failed to parse xhull_trend config")?;
    params.validate()?;
    Ok(Box::new(XHullTrendStrategy::new(params, config.timeframe()?)?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("hull_period", "Hull Period", "Hull MA period").optimize(10.0, 40.0, 10.0),
        ParamSpec::int("signal_period", "Signal", "Signal EMA period").optimize(3.0, 9.0, 2.0),
        ParamSpec::flag("close_on_opposite", "Reverse", "Reverse on opposite crossing"),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<XHullTrendConfig>()
}
