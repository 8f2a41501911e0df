use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_period, StrategyResult};
use crate::indicators::MaMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeikinAshiSmoothedConfig {
    /// Averaging of the raw candle (default: smma)
    #[serde(default = "default_method1")]
    pub ma_method1: MaMethod,

    /// Period of the first smoothing (default: 6)
    #[serde(default = "default_period1")]
    pub ma_period1: usize,

    /// Averaging of the Heikin-Ashi candle (default: wma)
    #[serde(default = "default_method2")]
    pub ma_method2: MaMethod,

    /// Period of the second smoothing (default: 2)
    #[serde(default = "default_period2")]
    pub ma_period2: usize,

    /// Order volume in lots (default: 0.1)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// 0 = disabled (default: 0)
    #[serde(default)]
    pub take_profit_pips: f64,

    /// 0 = disabled (default: 0)
    #[serde(default)]
    pub stop_loss_pips: f64,
}

fn default_method1() -> MaMethod {
    MaMethod::Smma
}
fn default_period1() -> usize {
    6
}
fn default_method2() -> MaMethod {
    MaMethod::Wma
}
fn default_period2() -> usize {
    2
}
fn default_volume() -> f64 {
    0.1
}

impl Default for HeikinAshiSmoothedConfig {
    fn default() -> Self {
        Self {
            ma_method1: default_method1(),
            ma_period1: default_period1(),
            ma_method2: default_method2(),
            ma_period2: default_period2(),
            volume: default_volume(),
            take_profit_pips: 0.0,
            stop_loss_pips: 0.0,
        }
    }
}

impl HeikinAshiSmoothedConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        ensure_period("ma_period1", self.ma_period1)?;
        ensure_period("ma_period2", self.ma_period2)?;
        ensure_non_negative("volume", self.volume)?;
        ensure_non_negative("take_profit_pips", self.take_profit_pips)?;
        ensure_non_negative("stop_loss_pips", self.stop_loss_pips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_parse_lowercase() {
        let config: HeikinAshiSmoothedConfig = serde_json::from_value(serde_json::json!({
            "ma_method1": "ema",
            "ma_method2": "sma"
        }))
        .unwrap();
        assert_eq!(config.ma_method1, MaMethod::Ema);
        assert_eq!(config.ma_method2, MaMethod::Sma);
    }
}
