//! Streaming technical indicators
//!
//! Strategies receive one finished candle at a time, so every indicator here
//! is fed incrementally and returns `None` until it has seen enough data to be
//! formed. Standard indicators wrap the `ta` crate; the few that `ta` does not
//! provide (or computes differently from the MetaTrader originals) are written
//! by hand:
//!
//! - Moving averages: SMA, EMA (ta), WMA, SMMA (manual)
//! - Momentum: RSI, MACD (ta), Stochastic, Williams %R, Momentum
//! - Volatility: ATR with Wilder smoothing (manual), Bollinger Bands (ta)
//! - Channels: Highest, Lowest (ta), Donchian
//! - [`History`]: a short rolling buffer for crossover detection

mod channels;
mod history;
mod moving_average;
mod oscillators;
mod volatility;

pub use channels::{Donchian, DonchianValue, Highest, Lowest};
pub use history::History;
pub use moving_average::{Ema, MaMethod, MovingAverage, Sma, Smma, Wma};
pub use oscillators::{Macd, MacdValue, Momentum, Rsi, Stochastic, StochasticValue, WilliamsR};
pub use volatility::{Atr, BandsValue, Bollinger};

use crate::error::StrategyError;

pub(crate) fn ta_error(name: &'static str, err: ta::errors::TaError) -> StrategyError {
    StrategyError::invalid(name, format!("{:?}", err))
}

/// `a` crossed above `b` between the previous and the current bar
pub fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a <= prev_b && a > b
}

/// `a` crossed below `b` between the previous and the current bar
pub fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a >= prev_b && a < b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_helpers() {
        assert!(crossed_above(1.0, 2.0, 3.0, 2.5));
        assert!(!crossed_above(3.0, 2.0, 3.5, 2.5));
        assert!(crossed_below(3.0, 2.0, 1.0, 2.5));
        assert!(!crossed_below(1.0, 2.0, 0.5, 2.5));
    }
}
