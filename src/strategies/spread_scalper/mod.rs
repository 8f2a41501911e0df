//! Spread Scalper Strategy
//!
//! Momentum entries on candle close, taken only while the live spread is
//! tight. Subscribes to level-1 quotes; a missing, stale or too wide quote
//! skips the candle.

mod config;
mod strategy;

pub use config::SpreadScalperConfig;
pub use strategy::SpreadScalperStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "spread_scalper";
pub const DESCRIPTION: &str = "Momentum scalper gated by the current bid/ask spread";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: SpreadScalperConfig = config
        .strategy_params()
        .context("Failed to parse spread_scalper config")?;
    params.validate()?;
    Ok(Box::new(SpreadScalperStrategy::new(
        params,
        config.timeframe()?,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("momentum_period", "Momentum", "Momentum lookback")
            .optimize(5.0, 20.0, 5.0),
        ParamSpec::float("momentum_threshold", "Threshold", "Momentum distance from 100")
            .optimize(0.02, 0.1, 0.02),
        ParamSpec::float("max_spread_pips", "Max Spread", "Widest spread in pips"),
        ParamSpec::int("max_quote_age_secs", "Quote Age", "Stale quote limit in seconds"),
        ParamSpec::float("volume", "Volume", "Order volume"),
        ParamSpec::float("take_profit_pips", "Take Profit", "Take profit in pips"),
        ParamSpec::float("stop_loss_pips", "Stop Loss", "Stop loss in pips"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<SpreadScalperConfig>()
}
