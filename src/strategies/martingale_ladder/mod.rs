//! Martingale Ladder Strategy
//!
//! Follows the direction of the last finished candle with a fixed pip stop
//! and target. After a losing round trip the next volume is multiplied, up to
//! `max_steps` times in a row; a win (or running out of steps) resets it.

mod config;
mod strategy;

pub use config::MartingaleLadderConfig;
pub use strategy::MartingaleLadderStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "martingale_ladder";
pub const DESCRIPTION: &str = "Candle-direction entries with martingale sizing after losses";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: MartingaleLadderConfig = config
        .strategy_params()
        .context("Failed to parse martingale_ladder config")?;
    params.validate()?;
    Ok(Box::new(MartingaleLadderStrategy::new(
        params,
        config.timeframe()?,
    )))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::float("volume", "Volume", "Starting volume"),
        ParamSpec::float("multiplier", "Multiplier", "Volume factor after a loss")
            .optimize(1.5, 3.0, 0.5),
        ParamSpec::int("max_steps", "Max Steps", "Consecutive multiplications")
            .optimize(2.0, 6.0, 1.0),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips")
            .optimize(10.0, 50.0, 10.0),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips")
            .optimize(10.0, 50.0, 10.0),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<MartingaleLadderConfig>()
}
