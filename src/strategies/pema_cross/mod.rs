//! PEMA Slope Strategy
//!
//! Trades turns of an eight-stage EMA cascade: a trough in the PEMA line
//! opens a long, a peak opens a short, each reversing any opposite position.

mod config;
mod pema;
mod strategy;

pub use config::PemaCrossConfig;
pub use pema::Pema;
pub use strategy::PemaCrossStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "pema_cross";
pub const DESCRIPTION: &str = "Slope turns of an eight-stage EMA cascade";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: PemaCrossConfig = config
        .strategy_params()
        .context("Failed to parse pema_cross config")?;
    params.validate()?;
    Ok(Box::new(PemaCrossStrategy::new(params, config.timeframe()?)?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("ema_period", "EMA Period", "Period of each stage").optimize(7.0, 35.0, 7.0),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<PemaCrossConfig>()
}
