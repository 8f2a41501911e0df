//! Expert Advisor Strategies
//!
//! A catalog of MetaTrader-style Expert Advisors expressed as event-driven
//! strategies, with a simulated host for replaying historical candles and
//! quotes, performance metrics, and parameter optimization.

pub mod backtest;
pub mod broker;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod optimizer;
pub mod params;
pub mod protection;
pub mod security;
pub mod strategies;
pub mod types;

pub use config::{BacktestConfig, Config};
pub use error::{StrategyError, StrategyResult};
pub use protection::{ProtectionDistance, ProtectionSettings};
pub use security::Security;
pub use strategies::{Strategy, StrategyContext, Subscription};
pub use types::*;
