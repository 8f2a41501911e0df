//! Stochastic Level Strategy
//!
//! %K crossing %D inside the oversold zone opens (or reverses into) a long,
//! crossing inside the overbought zone a short.

mod config;
mod strategy;

pub use config::StochasticLevelConfig;
pub use strategy::StochasticLevelStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "stochastic_level";
pub const DESCRIPTION: &str = "Stochastic %K/%D crossings in oversold/overbought zones";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: StochasticLevelConfig = config
        .strategy_params()
        .context("Failed to parse stochastic_level config")?;
    params.validate()?;
    Ok(Box::new(StochasticLevelStrategy::new(
        params,
        config.timeframe()?,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("k_period", "%K Period", "Stochastic lookback").optimize(5.0, 21.0, 4.0),
        ParamSpec::int("d_period", "%D Period", "Signal smoothing"),
        ParamSpec::int("slowing", "Slowing", "%K slowing"),
        ParamSpec::float("oversold", "Oversold", "Oversold level").optimize(10.0, 30.0, 10.0),
        ParamSpec::float("overbought", "Overbought", "Overbought level")
            .optimize(70.0, 90.0, 10.0),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<StochasticLevelConfig>()
}
