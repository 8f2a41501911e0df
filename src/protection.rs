//! Protective stop-loss / take-profit handling
//!
//! A strategy either installs distance-based protection once with
//! [`ProtectionSettings`] (applied to every position the host opens) or sets
//! absolute stop/take prices for the current position. Levels only exist while
//! a position is open and are dropped when it returns to flat.

use serde::{Deserialize, Serialize};

use crate::security::Security;
use crate::{Candle, Quote, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    /// Price units
    Absolute,
    /// Percent of the entry price
    Percent,
    /// Multiples of the price step
    Steps,
    /// MetaTrader pips
    Pips,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionDistance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl ProtectionDistance {
    pub fn absolute(value: f64) -> Self {
        Self {
            value,
            unit: DistanceUnit::Absolute,
        }
    }

    pub fn percent(value: f64) -> Self {
        Self {
            value,
            unit: DistanceUnit::Percent,
        }
    }

    pub fn steps(value: f64) -> Self {
        Self {
            value,
            unit: DistanceUnit::Steps,
        }
    }

    pub fn pips(value: f64) -> Self {
        Self {
            value,
            unit: DistanceUnit::Pips,
        }
    }

    /// Price offset for this distance relative to `reference`
    pub fn offset(&self, security: &Security, reference: f64) -> f64 {
        match self.unit {
            DistanceUnit::Absolute => self.value,
            DistanceUnit::Percent => reference * self.value / 100.0,
            DistanceUnit::Steps => self.value * security.price_step,
            DistanceUnit::Pips => security.pips(self.value),
        }
    }
}

/// Distance-based protection installed by `start_protection`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectionSettings {
    pub take_profit: Option<ProtectionDistance>,
    pub stop_loss: Option<ProtectionDistance>,
    /// Move the stop behind price as the position gains
    pub trailing_stop: bool,
}

impl ProtectionSettings {
    /// Build settings from pip distances where zero disables the leg,
    /// the usual shape of EA inputs
    pub fn from_pips(take_profit_pips: f64, stop_loss_pips: f64, trailing_stop: bool) -> Self {
        Self {
            take_profit: (take_profit_pips > 0.0).then(|| ProtectionDistance::pips(take_profit_pips)),
            stop_loss: (stop_loss_pips > 0.0).then(|| ProtectionDistance::pips(stop_loss_pips)),
            trailing_stop,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.take_profit.is_none() && self.stop_loss.is_none()
    }
}

/// Which protective level was touched and the price it fills at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtectionHit {
    StopLoss(f64),
    TakeProfit(f64),
}

impl ProtectionHit {
    pub fn price(&self) -> f64 {
        match *self {
            ProtectionHit::StopLoss(p) | ProtectionHit::TakeProfit(p) => p,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ProtectionHit::StopLoss(_) => "Stop Loss",
            ProtectionHit::TakeProfit(_) => "Take Profit",
        }
    }
}

/// Protective levels of the open position
#[derive(Debug, Clone, Default)]
pub struct ProtectionState {
    settings: Option<ProtectionSettings>,
    side: Option<Side>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    trail_offset: Option<f64>,
}

impl ProtectionState {
    pub fn install(&mut self, settings: ProtectionSettings) {
        self.settings = Some(settings);
    }

    pub fn settings(&self) -> Option<&ProtectionSettings> {
        self.settings.as_ref()
    }

    pub fn stop_loss(&self) -> Option<f64> {
        self.stop_loss
    }

    pub fn take_profit(&self) -> Option<f64> {
        self.take_profit
    }

    /// A new position was opened (or flipped) at `entry_price`
    pub fn on_position_opened(&mut self, side: Side, entry_price: f64, security: &Security) {
        self.clear();
        self.side = Some(side);

        let Some(settings) = self.settings else {
            return;
        };
        let sign = side.sign();
        if let Some(sl) = settings.stop_loss {
            let offset = sl.offset(security, entry_price);
            self.stop_loss = Some(entry_price - sign * offset);
            if settings.trailing_stop {
                self.trail_offset = Some(offset);
            }
        }
        if let Some(tp) = settings.take_profit {
            self.take_profit = Some(entry_price + sign * tp.offset(security, entry_price));
        }
    }

    pub fn clear(&mut self) {
        self.side = None;
        self.stop_loss = None;
        self.take_profit = None;
        self.trail_offset = None;
    }

    /// Drop the levels but keep tracking the open position
    pub fn reset_levels(&mut self) {
        self.stop_loss = None;
        self.take_profit = None;
        self.trail_offset = None;
    }

    /// Returns false when no position is open
    pub fn set_stop_loss(&mut self, price: f64) -> bool {
        if self.side.is_none() {
            return false;
        }
        self.stop_loss = Some(price);
        true
    }

    /// Returns false when no position is open
    pub fn set_take_profit(&mut self, price: f64) -> bool {
        if self.side.is_none() {
            return false;
        }
        self.take_profit = Some(price);
        true
    }

    /// Ratchet a trailing stop toward `price`; never loosens it
    pub fn update_trailing(&mut self, price: f64) {
        let (Some(side), Some(offset)) = (self.side, self.trail_offset) else {
            return;
        };
        let candidate = price - side.sign() * offset;
        self.stop_loss = Some(match (side, self.stop_loss) {
            (Side::Buy, Some(sl)) => sl.max(candidate),
            (Side::Sell, Some(sl)) => sl.min(candidate),
            (_, None) => candidate,
        });
    }

    /// Check the levels against a finished candle. When both levels are
    /// inside the candle range the stop is assumed to have traded first.
    pub fn check_candle(&self, candle: &Candle) -> Option<ProtectionHit> {
        let side = self.side?;
        match side {
            Side::Buy => {
                if let Some(sl) = self.stop_loss {
                    if candle.low <= sl {
                        return Some(ProtectionHit::StopLoss(candle.open.min(sl)));
                    }
                }
                if let Some(tp) = self.take_profit {
                    if candle.high >= tp {
                        return Some(ProtectionHit::TakeProfit(candle.open.max(tp)));
                    }
                }
            }
            Side::Sell => {
                if let Some(sl) = self.stop_loss {
                    if candle.high >= sl {
                        return Some(ProtectionHit::StopLoss(candle.open.max(sl)));
                    }
                }
                if let Some(tp) = self.take_profit {
                    if candle.low <= tp {
                        return Some(ProtectionHit::TakeProfit(candle.open.min(tp)));
                    }
                }
            }
        }
        None
    }

    /// Check the levels against a quote: longs exit on the bid, shorts on the ask
    pub fn check_quote(&self, quote: &Quote) -> Option<ProtectionHit> {
        let side = self.side?;
        let price = match side {
            Side::Buy => quote.bid,
            Side::Sell => quote.ask,
        };
        let sign = side.sign();
        if let Some(sl) = self.stop_loss {
            if sign * (price - sl) <= 0.0 {
                return Some(ProtectionHit::StopLoss(price));
            }
        }
        if let Some(tp) = self.take_profit {
            if sign * (price - tp) >= 0.0 {
                return Some(ProtectionHit::TakeProfit(price));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn security() -> Security {
        Security::new("EURUSD", 0.00001, 5)
    }

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new_unchecked(Utc::now(), open, high, low, close, 1.0)
    }

    #[test]
    fn test_levels_from_pips_long_and_short() {
        let mut state = ProtectionState::default();
        state.install(ProtectionSettings::from_pips(50.0, 20.0, false));

        state.on_position_opened(Side::Buy, 1.1000, &security());
        assert_relative_eq!(state.take_profit().unwrap(), 1.1050, epsilon = 1e-9);
        assert_relative_eq!(state.stop_loss().unwrap(), 1.0980, epsilon = 1e-9);

        state.on_position_opened(Side::Sell, 1.1000, &security());
        assert_relative_eq!(state.take_profit().unwrap(), 1.0950, epsilon = 1e-9);
        assert_relative_eq!(state.stop_loss().unwrap(), 1.1020, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_pips_disable_leg() {
        let settings = ProtectionSettings::from_pips(0.0, 15.0, false);
        assert!(settings.take_profit.is_none());
        assert!(settings.stop_loss.is_some());
        assert!(ProtectionSettings::from_pips(0.0, 0.0, true).is_empty());
    }

    #[test]
    fn test_manual_levels_require_open_position() {
        let mut state = ProtectionState::default();
        assert!(!state.set_stop_loss(1.0));
        assert!(state.stop_loss().is_none());

        state.on_position_opened(Side::Buy, 1.2, &security());
        assert!(state.set_stop_loss(1.1));
        assert_eq!(state.stop_loss(), Some(1.1));

        state.clear();
        assert!(state.stop_loss().is_none());
    }

    #[test]
    fn test_trailing_only_tightens() {
        let mut state = ProtectionState::default();
        state.install(ProtectionSettings::from_pips(0.0, 10.0, true));
        state.on_position_opened(Side::Buy, 1.1000, &security());

        state.update_trailing(1.1030);
        assert_relative_eq!(state.stop_loss().unwrap(), 1.1020, epsilon = 1e-9);

        state.update_trailing(1.1010);
        assert_relative_eq!(state.stop_loss().unwrap(), 1.1020, epsilon = 1e-9);
    }

    #[test]
    fn test_stop_wins_when_both_levels_touched() {
        let mut state = ProtectionState::default();
        state.install(ProtectionSettings::from_pips(10.0, 10.0, false));
        state.on_position_opened(Side::Buy, 1.1000, &security());

        let hit = state.check_candle(&candle(1.1000, 1.1020, 1.0980, 1.1000));
        assert!(matches!(hit, Some(ProtectionHit::StopLoss(_))));
    }

    #[test]
    fn test_gap_through_stop_fills_at_open() {
        let mut state = ProtectionState::default();
        state.install(ProtectionSettings::from_pips(0.0, 10.0, false));
        state.on_position_opened(Side::Buy, 1.1000, &security());

        let hit = state.check_candle(&candle(1.0950, 1.0960, 1.0940, 1.0955)).unwrap();
        assert_relative_eq!(hit.price(), 1.0950, epsilon = 1e-9);
    }

    #[test]
    fn test_short_take_profit_on_quote() {
        let mut state = ProtectionState::default();
        state.install(ProtectionSettings::from_pips(10.0, 0.0, false));
        state.on_position_opened(Side::Sell, 1.1000, &security());

        let quote = Quote {
            time: Utc::now(),
            bid: 1.0983,
            ask: 1.0985,
        };
        assert!(matches!(
            state.check_quote(&quote),
            Some(ProtectionHit::TakeProfit(_))
        ));
    }
}
