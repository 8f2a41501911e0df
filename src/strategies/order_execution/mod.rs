//! Order Execution Strategy
//!
//! Replays trade instructions from a CSV file instead of generating signals.
//! Each instruction id is executed at most once, on the first candle at or
//! after its timestamp, and only for the traded symbol. After every candle
//! the account state is appended to a snapshot CSV.

mod config;
mod instructions;
mod snapshot;
mod strategy;

pub use config::OrderExecutionConfig;
pub use instructions::{load_instructions, Instruction, InstructionError};
pub use snapshot::{AccountSnapshot, SnapshotWriter};
pub use strategy::OrderExecutionStrategy;

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::params::{defaults_of, ParamSpec};
use crate::{Config, Strategy};

pub const NAME: &str = "order_execution";
pub const DESCRIPTION: &str = "Executes trade instructions from a CSV file";

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let params: OrderExecutionConfig = config
        .strategy_params()
        .context("Failed to parse order_execution config")?;
    params.validate()?;
    Ok(Box::new(OrderExecutionStrategy::new(
        params,
        config.timeframe()?,
    )))
}

pub fn params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::text("instructions_path", "Instructions", "Instruction CSV path"),
        ParamSpec::text("snapshot_path", "Snapshot", "Account snapshot CSV path"),
    ]
}

pub fn defaults() -> HashMap<String, serde_json::Value> {
    defaults_of::<OrderExecutionConfig>()
}
