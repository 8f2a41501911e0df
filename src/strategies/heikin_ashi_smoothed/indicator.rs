//! Smoothed Heikin-Ashi
//!
//! Stage one smooths each OHLC component with a moving average, the smoothed
//! candle is converted to Heikin-Ashi, and stage two smooths the Heikin-Ashi
//! open and close again.

use crate::error::StrategyResult;
use crate::indicators::{MaMethod, MovingAverage};
use crate::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaValue {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl HaValue {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

#[derive(Debug, Clone)]
pub struct SmoothedHeikinAshi {
    open: MovingAverage,
    high: MovingAverage,
    low: MovingAverage,
    close: MovingAverage,
    ha_open: Option<f64>,
    ha_close: Option<f64>,
    smooth_open: MovingAverage,
    smooth_high: MovingAverage,
    smooth_low: MovingAverage,
    smooth_close: MovingAverage,
}

impl SmoothedHeikinAshi {
    pub fn new(
        method1: MaMethod,
        period1: usize,
        method2: MaMethod,
        period2: usize,
    ) -> StrategyResult<Self> {
        Ok(Self {
            open: MovingAverage::new(method1, period1)?,
            high: MovingAverage::new(method1, period1)?,
            low: MovingAverage::new(method1, period1)?,
            close: MovingAverage::new(method1, period1)?,
            ha_open: None,
            ha_close: None,
            smooth_open: MovingAverage::new(method2, period2)?,
            smooth_high: MovingAverage::new(method2, period2)?,
            smooth_low: MovingAverage::new(method2, period2)?,
            smooth_close: MovingAverage::new(method2, period2)?,
        })
    }

    pub fn next(&mut self, candle: &Candle) -> Option<HaValue> {
        let o = self.open.next(candle.open);
        let h = self.high.next(candle.high);
        let l = self.low.next(candle.low);
        let c = self.close.next(candle.close);
        let (Some(o), Some(h), Some(l), Some(c)) = (o, h, l, c) else {
            return None;
        };

        let ha_open = match (self.ha_open, self.ha_close) {
            (Some(prev_open), Some(prev_close)) => (prev_open + prev_close) / 2.0,
            _ => (o + c) / 2.0,
        };
        let ha_close = (o + h + l + c) / 4.0;
        let ha_high = h.max(ha_open).max(ha_close);
        let ha_low = l.min(ha_open).min(ha_close);
        self.ha_open = Some(ha_open);
        self.ha_close = Some(ha_close);

        let open = self.smooth_open.next(ha_open);
        let high = self.smooth_high.next(ha_high);
        let low = self.smooth_low.next(ha_low);
        let close = self.smooth_close.next(ha_close);
        Some(HaValue {
            open: open?,
            high: high?,
            low: low?,
            close: close?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::closes;

    #[test]
    fn test_colour_follows_trend() {
        let mut ha = SmoothedHeikinAshi::new(MaMethod::Sma, 2, MaMethod::Sma, 2).unwrap();
        let prices: Vec<f64> = (0..10).map(|i| 1.1000 + i as f64 * 0.0010).collect();
        let mut last = None;
        for candle in closes(0, &prices) {
            last = ha.next(&candle);
        }
        let value = last.unwrap();
        assert!(value.is_bullish());
        assert!(value.high >= value.close && value.low <= value.open);
    }
}
