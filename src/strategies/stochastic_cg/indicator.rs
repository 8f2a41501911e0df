//! Ehlers Stochastic Centre of Gravity
//!
//! 1. Centre of gravity of the median price over `length` candles
//! 2. Stochastic of that value over the same window
//! 3. 4-3-2-1 weighted smoothing, rescaled to [-1, 1]
//!
//! The trigger line is the previous oscillator value, shifted and damped:
//! `trigger = 0.96 * (prev + 0.02)`.

use std::collections::VecDeque;

use crate::error::{ensure_period, StrategyResult};
use crate::indicators::History;
use crate::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CgValue {
    pub oscillator: f64,
    pub trigger: f64,
}

#[derive(Debug, Clone)]
pub struct StochasticCg {
    length: usize,
    prices: VecDeque<f64>,
    cg: VecDeque<f64>,
    raw: History<f64>,
    prev_oscillator: Option<f64>,
}

impl StochasticCg {
    pub fn new(length: usize) -> StrategyResult<Self> {
        ensure_period("length", length)?;
        Ok(Self {
            length,
            prices: VecDeque::with_capacity(length),
            cg: VecDeque::with_capacity(length),
            raw: History::new(4),
            prev_oscillator: None,
        })
    }

    pub fn next(&mut self, candle: &Candle) -> Option<CgValue> {
        push_bounded(&mut self.prices, (candle.high + candle.low) / 2.0, self.length);
        if self.prices.len() < self.length {
            return None;
        }

        // Newest price carries weight 1
        let (num, den) = self
            .prices
            .iter()
            .rev()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (i, p)| {
                (num + (i as f64 + 1.0) * p, den + p)
            });
        let cg = if den != 0.0 {
            -num / den + (self.length as f64 + 1.0) / 2.0
        } else {
            0.0
        };
        push_bounded(&mut self.cg, cg, self.length);
        if self.cg.len() < self.length {
            return None;
        }

        let (lo, hi) = self
            .cg
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let stoch = if hi > lo { (cg - lo) / (hi - lo) } else { 0.0 };
        self.raw.push(stoch);
        if !self.raw.is_full() {
            return None;
        }

        let smoothed = (4.0 * self.raw.get(0)?
            + 3.0 * self.raw.get(1)?
            + 2.0 * self.raw.get(2)?
            + self.raw.get(3)?)
            / 10.0;
        let oscillator = 2.0 * (smoothed - 0.5);
        let trigger = self.prev_oscillator.map_or(oscillator, |p| 0.96 * (p + 0.02));
        self.prev_oscillator = Some(oscillator);
        Some(CgValue {
            oscillator,
            trigger,
        })
    }
}

fn push_bounded(buf: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if buf.len() == capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::closes;

    #[test]
    fn test_oscillator_bounded() {
        let mut cg = StochasticCg::new(5).unwrap();
        let prices: Vec<f64> = (0..40)
            .map(|i| 1.1 + 0.01 * ((i as f64) * 0.4).sin())
            .collect();
        let mut seen = 0;
        for candle in closes(0, &prices) {
            if let Some(v) = cg.next(&candle) {
                assert!((-1.0..=1.0).contains(&v.oscillator));
                seen += 1;
            }
        }
        assert!(seen > 20);
    }

    #[test]
    fn test_trigger_lags_previous_value() {
        let mut cg = StochasticCg::new(3).unwrap();
        let prices: Vec<f64> = (0..15).map(|i| 1.1 + 0.001 * (i % 4) as f64).collect();
        let values: Vec<CgValue> = closes(0, &prices)
            .iter()
            .filter_map(|c| cg.next(c))
            .collect();
        for pair in values.windows(2) {
            let expected = 0.96 * (pair[0].oscillator + 0.02);
            assert!((pair[1].trigger - expected).abs() < 1e-12);
        }
    }
}
