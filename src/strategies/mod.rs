//! Trading Strategies Module
//!
//! Every strategy is an independent, event-driven rule set:
//! - declares typed parameters (per-strategy `config.rs`)
//! - subscribes to one or more candle series and optionally level-1 quotes
//! - feeds its indicators on each finished candle and places orders through
//!   the [`StrategyContext`] supplied by the host
//!
//! Strategies are registered by name in a global registry so the CLI and the
//! optimizer can build them from configuration.

pub mod bollinger_reversal;
pub mod grid_martingale;
pub mod heikin_ashi_smoothed;
pub mod ma_rsi;
pub mod macd_sample;
pub mod martingale_ladder;
pub mod order_execution;
pub mod pema_cross;
pub mod pending_breakout;
pub mod spread_scalper;
pub mod stochastic_cg;
pub mod stochastic_level;
pub mod williams_donchian;
pub mod xhull_trend;
pub mod zigzag_breakout;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::error::StrategyError;
use crate::params::ParamSpec;
use crate::protection::ProtectionSettings;
use crate::security::Security;
use crate::{Candle, Config, Fill, Order, OrderId, Quote, Timeframe};

// =============================================================================
// Host interface
// =============================================================================

/// Market data stream a strategy wants delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    Candles(Timeframe),
    Level1,
}

/// Order and position API the host exposes to a running strategy.
///
/// Order helpers return `None` when the order was skipped: non-positive or
/// below-minimum volume, invalid price, or a stopped strategy.
pub trait StrategyContext {
    fn security(&self) -> &Security;

    fn current_time(&self) -> DateTime<Utc>;

    /// Signed net position: positive long, negative short
    fn position(&self) -> f64;

    /// Average entry price of the open position
    fn position_price(&self) -> Option<f64>;

    /// Mark-to-market account value
    fn portfolio_value(&self) -> f64;

    fn realized_pnl(&self) -> f64;

    fn last_quote(&self) -> Option<Quote>;

    fn buy_market(&mut self, volume: f64) -> Option<OrderId>;

    fn sell_market(&mut self, volume: f64) -> Option<OrderId>;

    fn buy_stop(&mut self, volume: f64, price: f64) -> Option<OrderId>;

    fn sell_stop(&mut self, volume: f64, price: f64) -> Option<OrderId>;

    /// Returns false if the order is unknown or no longer active
    fn cancel_order(&mut self, id: OrderId) -> bool;

    fn cancel_active_orders(&mut self);

    fn is_order_active(&self, id: OrderId) -> bool;

    /// Absolute protective stop for the open position (ignored while flat)
    fn set_stop_loss(&mut self, price: f64);

    /// Absolute protective target for the open position (ignored while flat)
    fn set_take_profit(&mut self, price: f64);

    fn clear_protection(&mut self);

    /// Distance-based protection applied to every position opened from now on
    fn start_protection(&mut self, settings: ProtectionSettings);

    /// Stop the strategy: resting orders are cancelled, new orders refused
    fn stop(&mut self, reason: &str);

    fn is_stopped(&self) -> bool;

    /// Flatten the net position with a market order
    fn close_position(&mut self) -> Option<OrderId> {
        let pos = self.position();
        if pos > 0.0 {
            self.sell_market(pos)
        } else if pos < 0.0 {
            self.buy_market(-pos)
        } else {
            None
        }
    }
}

// =============================================================================
// Strategy Trait - The contract all strategies must implement
// =============================================================================

/// Event-driven strategy. The host calls these synchronously, one event at a
/// time; fills caused by an order arrive through `on_own_trade` after the
/// callback that placed it has returned.
pub trait Strategy: Send {
    /// Strategy identifier (matches the registry name)
    fn name(&self) -> &'static str;

    /// Data streams to deliver. The first candle subscription is the
    /// primary series the host matches orders against.
    fn subscriptions(&self) -> Vec<Subscription>;

    /// Called once before the first event
    fn on_start(&mut self, _ctx: &mut dyn StrategyContext) {}

    /// A candle of one of the subscribed series has finished
    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle);

    /// Level-1 quote update (only with a `Level1` subscription)
    fn on_level1(&mut self, _ctx: &mut dyn StrategyContext, _quote: &Quote) {}

    /// One of the strategy's orders was executed
    fn on_own_trade(&mut self, _ctx: &mut dyn StrategyContext, fill: &Fill) {
        tracing::debug!(
            strategy = self.name(),
            order = %fill.order_id,
            side = ?fill.side,
            price = fill.price,
            volume = fill.volume,
            "Order executed"
        );
    }

    /// An order was rejected by the host
    fn on_order_failed(&mut self, order: &Order) {
        tracing::warn!(
            strategy = self.name(),
            order = %order.id,
            status = ?order.status,
            "Order failed"
        );
    }

    /// Called once when the run ends or the strategy stopped itself
    fn on_stop(&mut self, _ctx: &mut dyn StrategyContext) {}
}

// =============================================================================
// Strategy Registry - Dynamic registration without hardcoding
// =============================================================================

/// Factory function type for creating strategies from config
pub type StrategyFactory = fn(&Config) -> Result<Box<dyn Strategy>>;

/// Registry entry: constructor plus the metadata shown by `list`
#[derive(Clone, Copy)]
pub struct StrategyInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub factory: StrategyFactory,
    pub params: fn() -> Vec<ParamSpec>,
    pub defaults: fn() -> HashMap<String, serde_json::Value>,
}

/// Global strategy registry
static REGISTRY: OnceLock<RwLock<HashMap<&'static str, StrategyInfo>>> = OnceLock::new();

macro_rules! info_of {
    ($module:ident) => {
        StrategyInfo {
            name: $module::NAME,
            description: $module::DESCRIPTION,
            factory: $module::create,
            params: $module::params,
            defaults: $module::defaults,
        }
    };
}

fn get_registry() -> &'static RwLock<HashMap<&'static str, StrategyInfo>> {
    REGISTRY.get_or_init(|| {
        let entries = [
            info_of!(bollinger_reversal),
            info_of!(grid_martingale),
            info_of!(heikin_ashi_smoothed),
            info_of!(ma_rsi),
            info_of!(macd_sample),
            info_of!(martingale_ladder),
            info_of!(order_execution),
            info_of!(pema_cross),
            info_of!(pending_breakout),
            info_of!(spread_scalper),
            info_of!(stochastic_cg),
            info_of!(stochastic_level),
            info_of!(williams_donchian),
            info_of!(xhull_trend),
            info_of!(zigzag_breakout),
        ];
        RwLock::new(entries.into_iter().map(|e| (e.name, e)).collect())
    })
}

/// Create a strategy from configuration
pub fn create_strategy(config: &Config) -> Result<Box<dyn Strategy>> {
    let info = strategy_info(&config.strategy_name)?;
    (info.factory)(config)
}

/// Look up a registered strategy by name
pub fn strategy_info(name: &str) -> Result<StrategyInfo, StrategyError> {
    let registry = get_registry().read().unwrap_or_else(|e| e.into_inner());
    registry.get(name).copied().ok_or_else(|| {
        let mut available: Vec<_> = registry.keys().copied().collect();
        available.sort_unstable();
        StrategyError::UnknownStrategy {
            name: name.to_string(),
            available: available.join(", "),
        }
    })
}

/// Get sorted list of available strategy names
pub fn available_strategies() -> Vec<&'static str> {
    let registry = get_registry().read().unwrap_or_else(|e| e.into_inner());
    let mut names: Vec<_> = registry.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Register a new strategy (for plugins or testing)
pub fn register_strategy(info: StrategyInfo) {
    get_registry()
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(info.name, info);
}

/// Volume after normalisation, or `None` with a warning when it cannot be traded
pub(crate) fn tradable_volume(
    ctx: &dyn StrategyContext,
    strategy: &'static str,
    volume: f64,
) -> Option<f64> {
    if volume <= 0.0 {
        tracing::warn!(strategy, volume, "Volume must be positive, order skipped");
        return None;
    }
    let normalized = ctx.security().normalize_volume(volume);
    if normalized <= 0.0 {
        tracing::warn!(
            strategy,
            volume,
            min_volume = ctx.security().min_volume,
            "Volume below instrument minimum, order skipped"
        );
        return None;
    }
    Some(normalized)
}

/// Open or reverse into a long position of `volume`
pub(crate) fn enter_long(ctx: &mut dyn StrategyContext, volume: f64) -> Option<OrderId> {
    let pos = ctx.position();
    if pos > 0.0 {
        return None;
    }
    ctx.buy_market(volume + pos.abs())
}

/// Open or reverse into a short position of `volume`
pub(crate) fn enter_short(ctx: &mut dyn StrategyContext, volume: f64) -> Option<OrderId> {
    let pos = ctx.position();
    if pos < 0.0 {
        return None;
    }
    ctx.sell_market(volume + pos.abs())
}

/// Drives a single strategy through a [`SimBroker`] candle by candle
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{Strategy, Subscription};
    use crate::backtest::dispatch;
    use crate::broker::SimBroker;
    use crate::config::BacktestConfig;
    use crate::security::Security;
    use crate::{Candle, Quote, Timeframe};

    pub struct Harness {
        pub broker: SimBroker,
        pub strategy: Box<dyn Strategy>,
        pub primary: Timeframe,
    }

    impl Harness {
        pub fn new(strategy: Box<dyn Strategy>) -> Self {
            Self::with_backtest(strategy, &BacktestConfig::default())
        }

        pub fn with_backtest(strategy: Box<dyn Strategy>, config: &BacktestConfig) -> Self {
            let primary = strategy
                .subscriptions()
                .into_iter()
                .find_map(|s| match s {
                    Subscription::Candles(tf) => Some(tf),
                    Subscription::Level1 => None,
                })
                .unwrap_or(Timeframe::hours(1));
            let mut broker = SimBroker::new(Security::default(), config);
            let mut strategy = strategy;
            strategy.on_start(&mut broker);
            Self {
                broker,
                strategy,
                primary,
            }
        }

        /// Feed a finished candle of the primary series
        pub fn feed(&mut self, candle: &Candle) {
            self.broker.set_time(candle.close_time(self.primary));
            let strategy = self.strategy.as_mut();
            self.broker.process_candle(candle, |b| dispatch(&mut *strategy, b));
            self.dispatch();
            self.strategy
                .on_candle(&mut self.broker, self.primary, candle);
            self.dispatch();
        }

        /// Feed a finished candle of a secondary series
        pub fn feed_on(&mut self, timeframe: Timeframe, candle: &Candle) {
            self.broker.set_time(candle.close_time(timeframe));
            self.strategy.on_candle(&mut self.broker, timeframe, candle);
            self.dispatch();
        }

        pub fn quote(&mut self, quote: &Quote) {
            self.broker.set_time(quote.time);
            let strategy = self.strategy.as_mut();
            self.broker.process_quote(quote, |b| dispatch(&mut *strategy, b));
            self.dispatch();
            self.strategy.on_level1(&mut self.broker, quote);
            self.dispatch();
        }

        pub fn feed_all(&mut self, candles: &[Candle]) {
            for candle in candles {
                self.feed(candle);
            }
        }

        fn dispatch(&mut self) {
            dispatch(self.strategy.as_mut(), &mut self.broker);
        }
    }

    pub fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// Hourly candle number `index`
    pub fn candle(index: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new_unchecked(
            start_time() + Duration::hours(index),
            open,
            high,
            low,
            close,
            100.0,
        )
    }

    /// Hourly candles with a small range around each close
    pub fn closes(start: i64, values: &[f64]) -> Vec<Candle> {
        let mut prev = values.first().copied().unwrap_or(1.0);
        values
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = prev;
                prev = close;
                candle(
                    start + i as i64,
                    open,
                    open.max(close) + 0.0002,
                    open.min(close) - 0.0002,
                    close,
                )
            })
            .collect()
    }

    pub fn config_for(name: &str, params: serde_json::Value) -> crate::Config {
        let mut config = crate::Config {
            strategy_name: name.to_string(),
            ..crate::Config::default()
        };
        if let serde_json::Value::Object(map) = params {
            for (key, value) in map {
                config.set_param(&key, value);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_strategies_registered() {
        let names = available_strategies();
        assert_eq!(names.len(), 15);
        assert!(names.contains(&"macd_sample"));
        assert!(names.contains(&"order_execution"));
    }

    #[test]
    fn test_unknown_strategy_lists_available() {
        let err = strategy_info("nope").err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("ma_rsi"));
    }

    #[test]
    fn test_every_strategy_builds_from_defaults() {
        for name in available_strategies() {
            let info = strategy_info(name).unwrap();
            let mut config = Config {
                strategy_name: name.to_string(),
                ..Config::default()
            };
            for (key, value) in (info.defaults)() {
                config.set_param(&key, value);
            }
            config.set_param("timeframe", serde_json::json!("1h"));
            let strategy = create_strategy(&config)
                .unwrap_or_else(|e| panic!("{} failed to build: {}", name, e));
            assert_eq!(strategy.name(), name);
            assert!(!strategy.subscriptions().is_empty());
        }
    }

    #[test]
    fn test_param_specs_exist_in_defaults() {
        for name in available_strategies() {
            let info = strategy_info(name).unwrap();
            let defaults = (info.defaults)();
            for spec in (info.params)() {
                assert!(
                    defaults.contains_key(spec.name),
                    "{}: param '{}' has no default",
                    name,
                    spec.name
                );
            }
        }
    }
}
