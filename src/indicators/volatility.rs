use ta::indicators::BollingerBands;
use ta::Next;

use super::ta_error;
use crate::error::{ensure_period, StrategyResult};
use crate::Candle;

/// Average True Range using Wilder's smoothing
///
/// `ATR = (prev_ATR * (period - 1) + TR) / period`, seeded with the SMA of the
/// first `period` true ranges. The ta crate smooths with a plain EMA instead,
/// which drifts from the MetaTrader values, so this one is computed here.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed: Vec<f64>,
    value: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> StrategyResult<Self> {
        ensure_period("atr_period", period)?;
        Ok(Self {
            period,
            prev_close: None,
            seed: Vec::with_capacity(period),
            value: None,
        })
    }

    pub fn next(&mut self, candle: &Candle) -> Option<f64> {
        let tr = match self.prev_close {
            None => candle.high - candle.low,
            Some(pc) => {
                let hl = candle.high - candle.low;
                let hc = (candle.high - pc).abs();
                let lc = (candle.low - pc).abs();
                hl.max(hc).max(lc)
            }
        };
        self.prev_close = Some(candle.close);

        match self.value {
            Some(prev) => {
                let n = self.period as f64;
                self.value = Some((prev * (n - 1.0) + tr) / n);
            }
            None => {
                self.seed.push(tr);
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

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandsValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands
#[derive(Debug, Clone)]
pub struct Bollinger {
    inner: BollingerBands,
    period: usize,
    count: usize,
    value: Option<BandsValue>,
}

impl Bollinger {
    pub fn new(period: usize, deviation: f64) -> StrategyResult<Self> {
        let inner =
            BollingerBands::new(period, deviation).map_err(|e| ta_error("bollinger", e))?;
        Ok(Self {
            inner,
            period,
            count: 0,
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<BandsValue> {
        let out = self.inner.next(input);
        self.count += 1;
        self.value = (self.count >= self.period).then_some(BandsValue {
            upper: out.upper,
            middle: out.average,
            lower: out.lower,
        });
        self.value
    }

    pub fn value(&self) -> Option<BandsValue> {
        self.value
    }
}
