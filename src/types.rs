//! Core data types used across the strategy catalog

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when validating candle data
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("open ({open}) must be between low ({low}) and high ({high})")]
    OpenOutOfRange { open: f64, low: f64, high: f64 },

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLCV candlestick data. `datetime` is the candle open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle with validation
    pub fn new(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self::new_unchecked(datetime, open, high, low, close, volume);
        candle.validate()?;
        Ok(candle)
    }

    /// Create a candle without validation (for trusted sources or synthetic data)
    pub fn new_unchecked(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            datetime,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Validate the candle data
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.open < self.low || self.open > self.high {
            return Err(CandleValidationError::OpenOutOfRange {
                open: self.open,
                low: self.low,
                high: self.high,
            });
        }

        if self.close < self.low || self.close > self.high {
            return Err(CandleValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        if self.volume < 0.0 {
            return Err(CandleValidationError::NegativeVolume(self.volume));
        }

        Ok(())
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Candle close time for a given series length
    pub fn close_time(&self, timeframe: Timeframe) -> DateTime<Utc> {
        self.datetime + timeframe.duration()
    }
}

impl ta::Open for Candle {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for Candle {
    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Level-1 quote (best bid / best ask)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub time: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    pub fn mid(&self) -> f64 {
        (self.ask + self.bid) / 2.0
    }
}

/// Trading instrument symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Candle series length, parsed from strings such as `15m`, `4h`, `1d`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    seconds: i64,
}

impl Timeframe {
    pub const fn from_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    pub const fn minutes(n: i64) -> Self {
        Self { seconds: n * 60 }
    }

    pub const fn hours(n: i64) -> Self {
        Self { seconds: n * 3600 }
    }

    pub const fn days(n: i64) -> Self {
        Self { seconds: n * 86_400 }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.seconds)
    }

    /// Number of bars of this length in a calendar year
    pub fn bars_per_year(&self) -> f64 {
        (365.0 * 86_400.0) / self.seconds as f64
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds;
        if s % 604_800 == 0 {
            write!(f, "{}w", s / 604_800)
        } else if s % 86_400 == 0 {
            write!(f, "{}d", s / 86_400)
        } else if s % 3600 == 0 {
            write!(f, "{}h", s / 3600)
        } else if s % 60 == 0 {
            write!(f, "{}m", s / 60)
        } else {
            write!(f, "{}s", s)
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() < 2 {
            return Err(format!("Invalid timeframe: '{}'", s));
        }
        let (value, unit) = s.split_at(s.len() - 1);
        let n: i64 = value
            .parse()
            .map_err(|_| format!("Invalid timeframe: '{}'", s))?;
        if n <= 0 {
            return Err(format!("Timeframe must be positive: '{}'", s));
        }
        let seconds = match unit {
            "s" => n,
            "m" => n * 60,
            "h" => n * 3600,
            "d" => n * 86_400,
            "w" => n * 604_800,
            _ => return Err(format!("Unknown timeframe unit in '{}'", s)),
        };
        Ok(Self { seconds })
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for buys, -1 for sells
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

/// Host-assigned order handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Stop,
    /// Generated by the host when a protective level is hit
    Protective,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    Filled,
    Canceled,
    Rejected,
}

/// Order information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub volume: f64,
    /// Trigger price for stop orders, None for market orders
    pub price: Option<f64>,
    pub fill_price: Option<f64>,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub comment: String,
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }
}

/// Own trade (execution of one of the strategy's orders)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub side: Side,
    pub price: f64,
    pub volume: f64,
    pub time: DateTime<Utc>,
}

/// Completed (or partially closed) round trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    /// Direction of the position that was closed
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
    pub reason: String,
}

impl Trade {
    pub fn return_pct(&self) -> f64 {
        self.side.sign() * ((self.exit_price - self.entry_price) / self.entry_price) * 100.0
    }
}

/// Portfolio statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_commission: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse_and_display() {
        let tf: Timeframe = "15m".parse().unwrap();
        assert_eq!(tf.seconds(), 900);
        assert_eq!(tf.to_string(), "15m");

        let tf: Timeframe = "4h".parse().unwrap();
        assert_eq!(tf, Timeframe::hours(4));
        assert_eq!(Timeframe::days(1).to_string(), "1d");
        assert_eq!(Timeframe::days(7).to_string(), "1w");

        assert!("0m".parse::<Timeframe>().is_err());
        assert!("abc".parse::<Timeframe>().is_err());
        assert!("5y".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_serde_as_string() {
        let tf = Timeframe::hours(1);
        let json = serde_json::to_string(&tf).unwrap();
        assert_eq!(json, "\"1h\"");
        let back: Timeframe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tf);
    }

    #[test]
    fn test_candle_validation() {
        let now = Utc::now();
        assert!(Candle::new(now, 100.0, 105.0, 95.0, 102.0, 10.0).is_ok());
        assert!(matches!(
            Candle::new(now, 100.0, 95.0, 105.0, 102.0, 10.0),
            Err(CandleValidationError::HighLessThanLow { .. })
        ));
        assert!(matches!(
            Candle::new(now, 100.0, 105.0, 95.0, 106.0, 10.0),
            Err(CandleValidationError::CloseOutOfRange { .. })
        ));
        assert!(matches!(
            Candle::new(now, 100.0, 105.0, 95.0, 102.0, -1.0),
            Err(CandleValidationError::NegativeVolume(_))
        ));
    }

    #[test]
    fn test_short_trade_return_pct() {
        let now = Utc::now();
        let trade = Trade {
            symbol: Symbol::new("EURUSD"),
            side: Side::Sell,
            entry_price: 100.0,
            exit_price: 90.0,
            quantity: 1.0,
            entry_time: now,
            exit_time: now,
            pnl: 10.0,
            commission: 0.0,
            net_pnl: 10.0,
            reason: "Signal".to_string(),
        };
        assert!((trade.return_pct() - 10.0).abs() < 1e-9);
    }
}
