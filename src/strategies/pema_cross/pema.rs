//! Pentuple-style EMA cascade
//!
//! Eight EMAs chained on each other, combined with binomial weights:
//! `PEMA = 8e1 - 28e2 + 56e3 - 70e4 + 56e5 - 28e6 + 8e7 - e8`.
//! The combination cancels most of the lag of a single EMA.

use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::error::StrategyResult;
use crate::indicators::ta_error;

const WEIGHTS: [f64; 8] = [8.0, -28.0, 56.0, -70.0, 56.0, -28.0, 8.0, -1.0];

#[derive(Debug, Clone)]
pub struct Pema {
    stages: Vec<ExponentialMovingAverage>,
    period: usize,
    count: usize,
    value: Option<f64>,
}

impl Pema {
    pub fn new(period: usize) -> StrategyResult<Self> {
        let stages = (0..WEIGHTS.len())
            .map(|_| ExponentialMovingAverage::new(period).map_err(|e| ta_error("ema_period", e)))
            .collect::<StrategyResult<Vec<_>>>()?;
        Ok(Self {
            stages,
            period,
            count: 0,
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        let mut stage_input = input;
        let mut pema = 0.0;
        for (stage, weight) in self.stages.iter_mut().zip(WEIGHTS) {
            stage_input = stage.next(stage_input);
            pema += weight * stage_input;
        }
        self.count += 1;
        self.value = (self.count >= self.period).then_some(pema);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
