//! Streaming ZigZag pivot recorder
//!
//! Uses a rolling highest-high and lowest-low over `depth` candles. A candle
//! making a new `depth` high extends an up leg, or starts one if price has
//! moved at least `deviation` away from the last low and `backstep` candles
//! have passed since it. When a leg flips, the extreme of the old leg becomes
//! a confirmed swing.

use crate::error::{ensure_period, StrategyResult};
use crate::indicators::{Highest, Lowest};
use crate::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub kind: PivotKind,
    pub price: f64,
    pub bar: usize,
}

#[derive(Debug, Clone)]
pub struct ZigZag {
    highest: Highest,
    lowest: Lowest,
    deviation: f64,
    backstep: usize,
    bar: usize,
    leg: Option<Pivot>,
    swing_high: Option<f64>,
    swing_low: Option<f64>,
}

impl ZigZag {
    /// `deviation` is in price units
    pub fn new(depth: usize, deviation: f64, backstep: usize) -> StrategyResult<Self> {
        ensure_period("depth", depth)?;
        Ok(Self {
            highest: Highest::new(depth)?,
            lowest: Lowest::new(depth)?,
            deviation,
            backstep,
            bar: 0,
            leg: None,
            swing_high: None,
            swing_low: None,
        })
    }

    pub fn next(&mut self, candle: &Candle) {
        let hh = self.highest.next(candle.high);
        let ll = self.lowest.next(candle.low);
        self.bar += 1;

        if hh.is_some_and(|hh| candle.high >= hh) {
            self.on_new_high(candle.high);
        }
        if ll.is_some_and(|ll| candle.low <= ll) {
            self.on_new_low(candle.low);
        }
    }

    fn on_new_high(&mut self, high: f64) {
        let bar = self.bar;
        match self.leg {
            Some(Pivot {
                kind: PivotKind::High,
                price,
                ..
            }) => {
                if high > price {
                    self.leg = Some(Pivot {
                        kind: PivotKind::High,
                        price: high,
                        bar,
                    });
                }
            }
            Some(low) => {
                if high - low.price >= self.deviation && bar - low.bar >= self.backstep {
                    self.swing_low = Some(low.price);
                    self.leg = Some(Pivot {
                        kind: PivotKind::High,
                        price: high,
                        bar,
                    });
                }
            }
            None => {
                self.leg = Some(Pivot {
                    kind: PivotKind::High,
                    price: high,
                    bar,
                })
            }
        }
    }

    fn on_new_low(&mut self, low: f64) {
        let bar = self.bar;
        match self.leg {
            Some(Pivot {
                kind: PivotKind::Low,
                price,
                ..
            }) => {
                if low < price {
                    self.leg = Some(Pivot {
                        kind: PivotKind::Low,
                        price: low,
                        bar,
                    });
                }
            }
            Some(high) => {
                if high.price - low >= self.deviation && bar - high.bar >= self.backstep {
                    self.swing_high = Some(high.price);
                    self.leg = Some(Pivot {
                        kind: PivotKind::Low,
                        price: low,
                        bar,
                    });
                }
            }
            None => {
                self.leg = Some(Pivot {
                    kind: PivotKind::Low,
                    price: low,
                    bar,
                })
            }
        }
    }

    /// Last confirmed swing high
    pub fn swing_high(&self) -> Option<f64> {
        self.swing_high
    }

    /// Last confirmed swing low
    pub fn swing_low(&self) -> Option<f64> {
        self.swing_low
    }

    /// Extreme of the leg still forming
    pub fn current_leg(&self) -> Option<Pivot> {
        self.leg
    }
}
