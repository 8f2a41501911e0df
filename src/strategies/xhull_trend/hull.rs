use crate::error::StrategyResult;
use crate::indicators::Wma;

/// Hull moving average: `WMA(2 * WMA(n/2) - WMA(n), sqrt(n))`
#[derive(Debug, Clone)]
pub struct HullMa {
    half: Wma,
    full: Wma,
    smooth: Wma,
    value: Option<f64>,
}

impl HullMa {
    pub fn new(period: usize) -> StrategyResult<Self> {
        let half = (period / 2).max(1);
        let sqrt = ((period as f64).sqrt().round() as usize).max(1);
        Ok(Self {
            half: Wma::new(half)?,
            full: Wma::new(period)?,
            smooth: Wma::new(sqrt)?,
            value: None,
        })
    }

    pub fn next(&mut self, input: f64) -> Option<f64> {
        let half = self.half.next(input);
        let full = self.full.next(input);
        if let (Some(half), Some(full)) = (half, full) {
            self.value = self.smooth.next(2.0 * half - full);
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
