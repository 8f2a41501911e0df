use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};
use ta::Next;

use super::ta_error;
use crate::error::{ensure_period, StrategyResult};

/// Simple Moving Average
#[derive(Debug, Clone)]
pub struct Sma {
    inner: SimpleMovingAverage,
    period: usize,
    count: usize,
    value: Option<f64>,
}

impl Sma {
    pub fn new(period: usize) -> StrategyResult<Self> {
        let inner = SimpleMovingAverage::new(period).map_err(|e| ta_error("period", e))?;
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
        self.value = (self.count >= self.period).then_some(v);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_formed(&self) -> bool {
        self.value.is_some()
    }
}

/// Exponential Moving Average, formed after `period` inputs
#[derive(Debug, Clone)]
pub struct Ema {
    inner: ExponentialMovingAverage,
    period: usize,
    count: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> StrategyResult<Self> {
        let inner = ExponentialMovingAverage::new(period).map_err(|e| ta_error("period", e))?;
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
        self.value = (self.count >= self.period).then_some(v);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_formed(&self) -> bool {
        self.value.is_some()
    }
}

/// Linear Weighted Moving Average (not in the ta crate)
#[derive(Debug, Clone)]
pub struct Wma {
    window: VecDeque<f64>,
    period: usize,
    weight_sum: f64,
    value: Option<f64>,
}

impl Wma {
    pub fn new(period: usize) -> StrategyResult<Self> {
        ensure_period("period", period)?;
        Ok(Self {
            window: VecDeque::with_capacity(period),
            period,
            weight_sum: (1..=period).map(|x| x as f64).sum(),
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(input);
        if self.window.len() < self.period {
            self.value = None;
            return None;
        }
        let weighted: f64 = self
            .window
            .iter()
            .enumerate()
            .map(|(j, &v)| v * (j + 1) as f64)
            .sum();
        self.value = Some(weighted / self.weight_sum);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Smoothed Moving Average (MetaTrader MODE_SMMA / Wilder smoothing).
/// Seeded with the SMA of the first `period` inputs.
#[derive(Debug, Clone)]
pub struct Smma {
    period: usize,
    seed: Vec<f64>,
    value: Option<f64>,
}

impl Smma {
    pub fn new(period: usize) -> StrategyResult<Self> {
        ensure_period("period", period)?;
        Ok(Self {
            period,
            seed: Vec::with_capacity(period),
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        match self.value {
            Some(prev) => {
                let n = self.period as f64;
                self.value = Some((prev * (n - 1.0) + input) / n);
            }
            None => {
                self.seed.push(input);
                if self.seed.len() == self.period {
                    self.value = Some(self.seed.iter().sum::<f64>() / self.period as f64);
                    self.seed.clear();
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Averaging method, named after the MetaTrader `ENUM_MA_METHOD` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaMethod {
    Sma,
    Ema,
    Smma,
    Wma,
}

/// Moving average with a method chosen at runtime
#[derive(Debug, Clone)]
pub enum MovingAverage {
    Sma(Sma),
    Ema(Ema),
    Smma(Smma),
    Wma(Wma),
}

impl MovingAverage {
    pub fn new(method: MaMethod, period: usize) -> StrategyResult<Self> {
        Ok(match method {
            MaMethod::Sma => Self::Sma(Sma::new(period)?),
            MaMethod::Ema => Self::Ema(Ema::new(period)?),
            MaMethod::Smma => Self::Smma(Smma::new(period)?),
            MaMethod::Wma => Self::Wma(Wma::new(period)?),
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        match self {
            Self::Sma(ma) => ma.next(input),
            Self::Ema(ma) => ma.next(input),
            Self::Smma(ma) => ma.next(input),
            Self::Wma(ma) => ma.next(input),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Sma(ma) => ma.value(),
            Self::Ema(ma) => ma.value(),
            Self::Smma(ma) => ma.value(),
            Self::Wma(ma) => ma.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma_warmup_and_value() {
        let mut sma = Sma::new(3).unwrap();
        assert_eq!(sma.next(1.0), None);
        assert_eq!(sma.next(2.0), None);
        assert_relative_eq!(sma.next(3.0).unwrap(), 2.0);
        assert_relative_eq!(sma.next(4.0).unwrap(), 3.0);
    }

    #[test]
    fn test_wma_weights_newest_most() {
        let mut wma = Wma::new(3).unwrap();
        wma.next(1.0);
        wma.next(2.0);
        // (1*1 + 2*2 + 3*3) / 6
        assert_relative_eq!(wma.next(3.0).unwrap(), 14.0 / 6.0);
    }

    #[test]
    fn test_smma_seeded_with_sma() {
        let mut smma = Smma::new(2).unwrap();
        assert_eq!(smma.next(2.0), None);
        assert_relative_eq!(smma.next(4.0).unwrap(), 3.0);
        assert_relative_eq!(smma.next(5.0).unwrap(), 4.0);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(Sma::new(0).is_err());
        assert!(Wma::new(0).is_err());
        assert!(MovingAverage::new(MaMethod::Smma, 0).is_err());
    }

    #[test]
    fn test_ema_constant_series() {
        let mut ema = Ema::new(5).unwrap();
        let mut last = None;
        for _ in 0..10 {
            last = ema.next(7.0);
        }
        assert_relative_eq!(last.unwrap(), 7.0, epsilon = 1e-12);
    }
}
