//! Stochastic Centre of Gravity Strategy
//!
//! Ehlers' stochastic CG oscillator against its damped trigger line: the
//! oscillator crossing above the trigger goes long, below goes short.

mod config;
mod indicator;
mod strategy;

pub use config::StochasticCgConfig;
pub use indicator::{CgValue, StochasticCg};
pub use strategy::StochasticCgStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "stochastic_cg";
pub const DESCRIPTION: &str = "Ehlers stochastic centre-of-gravity trigger crossings";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: StochasticCgConfig = config
        .strategy_params()
        .context("Failed to parse stochastic_cg config")?;
    params.validate()?;
    Ok(Box::new(StochasticCgStrategy::new(params, config.timeframe()?)?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("length", "Length", "Centre of gravity window").optimize(5.0, 20.0, 5.0),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<StochasticCgConfig>()
}
