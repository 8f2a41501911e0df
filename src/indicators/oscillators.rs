use std::collections::VecDeque;
use ta::indicators::{MovingAverageConvergenceDivergence, RelativeStrengthIndex};
use ta::Next;

use super::{ta_error, Highest, Lowest, Sma};
use crate::error::{ensure_period, StrategyResult};
use crate::Candle;

/// Relative Strength Index, formed after `period + 1` inputs
#[derive(Debug, Clone)]
pub struct Rsi {
    inner: RelativeStrengthIndex,
    period: usize,
    count: usize,
    value: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> StrategyResult<Self> {
        let inner = RelativeStrengthIndex::new(period).map_err(|e| ta_error("rsi_period", e))?;
        Ok(Self {
            inner,
            period,
            count: 0,
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        let v = self.inner.next(input);
        self.count += 1;
        self.value = (self.count > self.period).then_some(v);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone)]
pub struct Macd {
    inner: MovingAverageConvergenceDivergence,
    warmup: usize,
    count: usize,
    value: Option<MacdValue>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> StrategyResult<Self> {
        let inner = MovingAverageConvergenceDivergence::new(fast, slow, signal)
            .map_err(|e| ta_error("macd", e))?;
        Ok(Self {
            inner,
            warmup: slow.max(fast) + signal,
            count: 0,
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<MacdValue> {
        let out = self.inner.next(input);
        self.count += 1;
        self.value = (self.count >= self.warmup).then_some(MacdValue {
            macd: out.macd,
            signal: out.signal,
            histogram: out.histogram,
        });
        self.value
    }

    pub fn value(&self) -> Option<MacdValue> {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

/// Stochastic oscillator with MetaTrader-style slowing:
/// `%K = 100 * Σ(close - LL) / Σ(HH - LL)` over `slowing` bars, `%D = SMA(%K)`.
#[derive(Debug, Clone)]
pub struct Stochastic {
    highest: Highest,
    lowest: Lowest,
    slowing: usize,
    numerators: VecDeque<f64>,
    denominators: VecDeque<f64>,
    d: Sma,
    value: Option<StochasticValue>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, slowing: usize) -> StrategyResult<Self> {
        ensure_period("slowing", slowing)?;
        Ok(Self {
            highest: Highest::new(k_period)?,
            lowest: Lowest::new(k_period)?,
            slowing,
            numerators: VecDeque::with_capacity(slowing),
            denominators: VecDeque::with_capacity(slowing),
            d: Sma::new(d_period)?,
            value: None,
        })
    }

    pub fn next(&mut self, candle: &Candle) -> Option<StochasticValue> {
        let hh = self.highest.next(candle.high);
        let ll = self.lowest.next(candle.low);
        let (hh, ll) = match (hh, ll) {
            (Some(h), Some(l)) => (h, l),
            _ => return None,
        };

        if self.numerators.len() == self.slowing {
            self.numerators.pop_front();
            self.denominators.pop_front();
        }
        self.numerators.push_back(candle.close - ll);
        self.denominators.push_back(hh - ll);
        if self.numerators.len() < self.slowing {
            return None;
        }

        let num: f64 = self.numerators.iter().sum();
        let den: f64 = self.denominators.iter().sum();
        let k = if den > 0.0 { 100.0 * num / den } else { 50.0 };
        self.value = self.d.next(k).map(|d| StochasticValue { k, d });
        self.value
    }

    pub fn value(&self) -> Option<StochasticValue> {
        self.value
    }
}

/// Williams %R in the range [-100, 0]
#[derive(Debug, Clone)]
pub struct WilliamsR {
    highest: Highest,
    lowest: Lowest,
    value: Option<f64>,
}

impl WilliamsR {
    pub fn new(period: usize) -> StrategyResult<Self> {
        Ok(Self {
            highest: Highest::new(period)?,
            lowest: Lowest::new(period)?,
            value: None,
        })
    }

    pub fn next(&mut self, candle: &Candle) -> Option<f64> {
        let hh = self.highest.next(candle.high);
        let ll = self.lowest.next(candle.low);
        self.value = match (hh, ll) {
            (Some(h), Some(l)) => {
                let range = h - l;
                if range > 0.0 {
                    Some(((h - candle.close) / range) * -100.0)
                } else {
                    Some(-50.0)
                }
            }
            _ => None,
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Momentum as a ratio: `100 * close / close[period]`
#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    window: VecDeque<f64>,
}

impl Momentum {
    pub fn new(period: usize) -> StrategyResult<Self> {
        ensure_period("momentum_period", period)?;
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period + 1),
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        if self.window.len() == self.period + 1 {
            self.window.pop_front();
        }
        self.window.push_back(input);
        if self.window.len() <= self.period {
            return None;
        }
        let base = self.window.front().copied()?;
        (base != 0.0).then(|| 100.0 * input / base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        Candle::new_unchecked(Utc::now(), close, high, low, close, 1.0)
    }

    #[test]
    fn test_williams_r_bounds() {
        let mut wr = WilliamsR::new(3).unwrap();
        assert_eq!(wr.next(&candle(10.0, 8.0, 9.0)), None);
        assert_eq!(wr.next(&candle(11.0, 9.0, 10.0)), None);
        // Close at the window high
        assert_relative_eq!(wr.next(&candle(12.0, 10.0, 12.0)).unwrap(), 0.0);
        // Close at the window low (8.0 dropped, low is now 9.0)
        assert_relative_eq!(wr.next(&candle(12.0, 9.0, 9.0)).unwrap(), -100.0);
    }

    #[test]
    fn test_stochastic_at_top_of_range() {
        let mut stoch = Stochastic::new(3, 2, 1).unwrap();
        let mut last = None;
        for i in 0..6 {
            let p = 100.0 + i as f64;
            last = stoch.next(&candle(p, p - 1.0, p));
        }
        let v = last.unwrap();
        assert_relative_eq!(v.k, 100.0);
        assert_relative_eq!(v.d, 100.0);
    }

    #[test]
    fn test_momentum_ratio() {
        let mut m = Momentum::new(2).unwrap();
        assert_eq!(m.next(100.0), None);
        assert_eq!(m.next(105.0), None);
        assert_relative_eq!(m.next(110.0).unwrap(), 110.0);
    }

    #[test]
    fn test_macd_warmup() {
        let mut macd = Macd::new(3, 6, 3).unwrap();
        let outputs: Vec<_> = (0..12).map(|i| macd.next(100.0 + i as f64)).collect();
        assert!(outputs[..8].iter().all(|v| v.is_none()));
        assert!(outputs[8].is_some());
        // Rising series: fast EMA above slow EMA
        assert!(outputs[11].unwrap().macd > 0.0);
    }

    #[test]
    fn test_rsi_rising_series_is_high() {
        let mut rsi = Rsi::new(5).unwrap();
        let mut last = None;
        for i in 0..20 {
            last = rsi.next(100.0 + i as f64);
        }
        assert!(last.unwrap() > 70.0);
    }
}
