//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable overrides for the data directory and starting capital.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{StrategyError, StrategyResult};
use crate::security::Security;
use crate::Timeframe;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_strategy_name")]
    pub strategy_name: String,
    /// Strategy parameters, including the primary `timeframe`
    #[serde(default = "default_strategy_params")]
    pub strategy: serde_json::Value,
    #[serde(default)]
    pub security: Security,
    #[serde(default)]
    pub backtest: BacktestConfig,
    /// Grid search values for optimization (optional).
    /// Each key is a strategy param name, value is array of values to test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<HashMap<String, Vec<serde_json::Value>>>,
}

fn default_strategy_name() -> String {
    "ma_rsi".to_string()
}

fn default_strategy_params() -> serde_json::Value {
    serde_json::json!({ "timeframe": "1h" })
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `EA_DATA_DIR` and `EA_INITIAL_CAPITAL` from the environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("EA_DATA_DIR") {
            self.backtest.data_dir = dir;
        }
        if let Ok(capital) = std::env::var("EA_INITIAL_CAPITAL") {
            self.backtest.initial_capital = capital
                .parse()
                .with_context(|| format!("EA_INITIAL_CAPITAL is not a number: {}", capital))?;
        }
        Ok(())
    }

    /// Primary timeframe from the strategy section
    pub fn timeframe(&self) -> StrategyResult<Timeframe> {
        let raw = self
            .strategy
            .get("timeframe")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                StrategyError::InvalidTimeframe(
                    "missing \"timeframe\" in strategy section".to_string(),
                )
            })?;
        raw.parse().map_err(StrategyError::InvalidTimeframe)
    }

    /// Set timeframe in strategy config
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.set_param("timeframe", serde_json::json!(timeframe.to_string()));
    }

    /// Overwrite a single strategy parameter
    pub fn set_param(&mut self, name: &str, value: serde_json::Value) {
        if !self.strategy.is_object() {
            self.strategy = serde_json::json!({});
        }
        if let Some(obj) = self.strategy.as_object_mut() {
            obj.insert(name.to_string(), value);
        }
    }

    /// Deserialize the strategy section into a typed per-strategy config
    pub fn strategy_params<T: DeserializeOwned>(&self) -> StrategyResult<T> {
        Ok(serde_json::from_value(self.strategy.clone())?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strategy_name: default_strategy_name(),
            strategy: default_strategy_params(),
            security: Security::default(),
            backtest: BacktestConfig::default(),
            grid: None,
        }
    }
}

/// Backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Commission as a fraction of traded notional, charged on every fill
    #[serde(default)]
    pub commission: f64,
    /// Slippage as a fraction of price applied to market fills without a quote
    #[serde(default)]
    pub slippage: f64,
    /// Spread in pips used to synthesize quotes when no quote file exists
    #[serde(default = "default_synthetic_spread")]
    pub synthetic_spread_pips: f64,
}

fn default_data_dir() -> String {
    "data".to_string()
}
fn default_initial_capital() -> f64 {
    10_000.0
}
fn default_synthetic_spread() -> f64 {
    1.0
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            data_dir: default_data_dir(),
            initial_capital: default_initial_capital(),
            commission: 0.0,
            slippage: 0.0,
            synthetic_spread_pips: default_synthetic_spread(),
        }
    }
}
