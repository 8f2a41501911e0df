use tracing::info;

use super::config::ZigZagBreakoutConfig;
use super::zigzag::ZigZag;
use crate::error::StrategyResult;
use crate::protection::ProtectionSettings;
use crate::security::Security;
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, Timeframe};

pub struct ZigZagBreakoutStrategy {
    config: ZigZagBreakoutConfig,
    timeframe: Timeframe,
    zigzag: ZigZag,
    traded_high: Option<f64>,
    traded_low: Option<f64>,
    pending_stop: Option<f64>,
}

impl ZigZagBreakoutStrategy {
    pub fn new(
        config: ZigZagBreakoutConfig,
        timeframe: Timeframe,
        security: &Security,
    ) -> StrategyResult<Self> {
        Ok(Self {
            zigzag: ZigZag::new(
                config.depth,
                security.pips(config.deviation_pips),
                config.backstep,
            )?,
            config,
            timeframe,
            traded_high: None,
            traded_low: None,
            pending_stop: None,
        })
    }
}

impl Strategy for ZigZagBreakoutStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::Candles(self.timeframe)]
    }

    fn on_start(&mut self, ctx: &mut dyn StrategyContext) {
        if self.config.take_profit_pips > 0.0 {
            ctx.start_protection(ProtectionSettings::from_pips(
                self.config.take_profit_pips,
                0.0,
                false,
            ));
        }
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle) {
        if timeframe != self.timeframe {
            return;
        }
        // Levels as of the previous candle, then record this one
        let swing_high = self.zigzag.swing_high();
        let swing_low = self.zigzag.swing_low();
        self.zigzag.next(candle);

        if ctx.position() != 0.0 {
            return;
        }

        if let (Some(high), Some(low)) = (swing_high, swing_low) {
            if candle.close > high && self.traded_high != Some(high) {
                self.traded_high = Some(high);
                self.pending_stop = Some(low);
                if ctx.buy_market(self.config.volume).is_some() {
                    info!(strategy = super::NAME, level = high, stop = low, "Swing high broken");
                }
            } else if candle.close < low && self.traded_low != Some(low) {
                self.traded_low = Some(low);
                self.pending_stop = Some(high);
                if ctx.sell_market(self.config.volume).is_some() {
                    info!(strategy = super::NAME, level = low, stop = high, "Swing low broken");
                }
            }
        }
    }

    fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, _fill: &Fill) {
        if ctx.position() == 0.0 {
            return;
        }
        if let Some(stop) = self.pending_stop.take() {
            ctx.set_stop_loss(stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{candle, Harness};

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Candle {
        candle(i, (high + low) / 2.0, high, low, close)
    }

    #[test]
    fn test_close_above_swing_high_buys_with_stop_at_swing_low() {
        let config = ZigZagBreakoutConfig {
            depth: 3,
            deviation_pips: 10.0,
            backstep: 1,
            ..Default::default()
        };
        let strategy =
            ZigZagBreakoutStrategy::new(config, Timeframe::hours(1), &Security::default()).unwrap();
        let mut h = Harness::new(Box::new(strategy));

        // Up to 1.1050, down to 1.0990, back up through 1.1050
        let bars = [
            (1.1010, 1.1000, 1.1005),
            (1.1030, 1.1015, 1.1025),
            (1.1050, 1.1035, 1.1045),
            (1.1040, 1.1020, 1.1025),
            (1.1020, 1.1005, 1.1010),
            (1.1010, 1.0990, 1.0995),
            (1.1030, 1.1000, 1.1025),
            (1.1048, 1.1025, 1.1045),
        ];
        for (i, (hi, lo, close)) in bars.iter().enumerate() {
            h.feed(&bar(i as i64, *hi, *lo, *close));
        }
        assert_eq!(h.broker.position(), 0.0);

        h.feed(&bar(8, 1.1065, 1.1045, 1.1060));
        assert!(h.broker.position() > 0.0);
        assert_eq!(h.broker.protection().stop_loss(), Some(1.0990));
    }
}
