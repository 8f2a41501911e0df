use ta::indicators::{Maximum, Minimum};
use ta::Next;

use super::ta_error;
use crate::error::StrategyResult;
use crate::Candle;

/// Highest value over the last `period` inputs
#[derive(Debug, Clone)]
pub struct Highest {
    inner: Maximum,
    period: usize,
    count: usize,
}

impl Highest {
    pub fn new(period: usize) -> StrategyResult<Self> {
        Ok(Self {
            inner: Maximum::new(period).map_err(|e| ta_error("period", e))?,
            period,
            count: 0,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        let v = self.inner.next(input);
        self.count += 1;
        (self.count >= self.period).then_some(v)
    }
}

/// Lowest value over the last `period` inputs
#[derive(Debug, Clone)]
pub struct Lowest {
    inner: Minimum,
    period: usize,
    count: usize,
}

impl Lowest {
    pub fn new(period: usize) -> StrategyResult<Self> {
        Ok(Self {
            inner: Minimum::new(period).map_err(|e| ta_error("period", e))?,
            period,
            count: 0,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        let v = self.inner.next(input);
        self.count += 1;
        (self.count >= self.period).then_some(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DonchianValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Donchian channel over candle highs and lows (current candle included)
#[derive(Debug, Clone)]
pub struct Donchian {
    highest: Highest,
    lowest: Lowest,
    value: Option<DonchianValue>,
}

impl Donchian {
    pub fn new(period: usize) -> StrategyResult<Self> {
        Ok(Self {
            highest: Highest::new(period)?,
            lowest: Lowest::new(period)?,
            value: None,
        })
    }

    pub fn next(&mut self, candle: &Candle) -> Option<DonchianValue> {
        let upper = self.highest.next(candle.high);
        let lower = self.lowest.next(candle.low);
        self.value = match (upper, lower) {
            (Some(upper), Some(lower)) => Some(DonchianValue {
                upper,
                middle: (upper + lower) / 2.0,
                lower,
            }),
            _ => None,
        };
        self.value
    }

    pub fn value(&self) -> Option<DonchianValue> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_highest_lowest_window() {
        let mut hi = Highest::new(3).unwrap();
        let mut lo = Lowest::new(3).unwrap();
        let data = [5.0, 3.0, 8.0, 1.0, 2.0, 4.0];
        let highs: Vec<_> = data.iter().map(|&v| hi.next(v)).collect();
        let lows: Vec<_> = data.iter().map(|&v| lo.next(v)).collect();
        assert_eq!(highs, vec![None, None, Some(8.0), Some(8.0), Some(8.0), Some(4.0)]);
        assert_eq!(lows, vec![None, None, Some(3.0), Some(1.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_donchian_middle() {
        let mut dc = Donchian::new(2).unwrap();
        let now = Utc::now();
        dc.next(&Candle::new_unchecked(now, 10.0, 12.0, 9.0, 11.0, 1.0));
        let v = dc
            .next(&Candle::new_unchecked(now, 11.0, 14.0, 10.0, 13.0, 1.0))
            .unwrap();
        assert_eq!(v.upper, 14.0);
        assert_eq!(v.lower, 9.0);
        assert_eq!(v.middle, 11.5);
    }
}
