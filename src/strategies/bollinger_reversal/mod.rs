//! Bollinger Reversal Strategy
//!
//! Fades excursions outside the Bollinger bands: after a close below the lower
//! band, buy when price closes back inside; after a close above the upper
//! band, sell when it closes back inside. The stop sits an ATR multiple away
//! from the entry and the position is closed at the middle band.

mod config;
mod strategy;

pub use config::BollingerReversalConfig;
pub use strategy::BollingerReversalStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "bollinger_reversal";
pub const DESCRIPTION: &str = "Bollinger band re-entry with ATR stop and middle-band exit";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: BollingerReversalConfig = config
        .strategy_params()
        .context("Failed to parse bollinger_reversal config")?;
    params.validate()?;
    Ok(Box::new(BollingerReversalStrategy::new(
        params,
        config.timeframe()?,
    )?))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int("bb_period", "BB Period", "Bollinger period").optimize(10.0, 30.0, 5.0),
        ParamSpec::float("bb_deviation", "BB Deviation", "Band width in deviations")
            .optimize(1.5, 3.0, 0.5),
        ParamSpec::int("atr_period", "ATR Period", "ATR period"),
        ParamSpec::float("atr_multiplier", "ATR Multiplier", "Stop distance in ATRs")
            .optimize(1.0, 3.0, 0.5),
        ParamSpec::float("volume", "Volume", "Order volume"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<BollingerReversalConfig>()
}
