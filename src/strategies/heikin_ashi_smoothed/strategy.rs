use tracing::info;

use super::config::HeikinAshiSmoothedConfig;
use super::indicator::{HaValue, SmoothedHeikinAshi};
use crate::error::StrategyResult;
use crate::protection::ProtectionSettings;
use crate::strategies::{enter_long, enter_short, Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct HeikinAshiSmoothedStrategy {
    config: HeikinAshiSmoothedConfig,
    timeframe: Timeframe,
    ha: SmoothedHeikinAshi,
    prev: Option<HaValue>,
}

impl HeikinAshiSmoothedStrategy {
    pub fn new(config: HeikinAshiSmoothedConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            ha: SmoothedHeikinAshi::new(
                config.ma_method1,
                config.ma_period1,
                config.ma_method2,
                config.ma_period2,
            )?,
            config,
            timeframe,
            prev: None,
        })
    }
}

impl Strategy for HeikinAshiSmoothedStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::Candles(self.timeframe)]
    }

    fn on_start(&mut self, ctx: &mut dyn StrategyContext) {
        let settings = ProtectionSettings::from_pips(
            self.config.take_profit_pips,
            self.config.stop_loss_pips,
            false,
        );
        if !settings.is_empty() {
            ctx.start_protection(settings);
        }
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle) {
        if timeframe != self.timeframe {
            return;
        }
        let Some(cur) = self.ha.next(candle) else {
            return;
        };
        let Some(prev) = self.prev.replace(cur) else {
            return;
        };

        if prev.is_bearish() && cur.is_bullish() {
            if enter_long(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, "Heikin-Ashi turned bullish");
            }
        } else if prev.is_bullish() && cur.is_bearish() && enter_short(ctx, self.config.volume).is_some()
        {
            info!(strategy = super::NAME, "Heikin-Ashi turned bearish");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::MaMethod;
    use crate::strategies::test_support::{closes, Harness};

    #[test]
    fn test_colour_change_reverses_position() {
        let config = HeikinAshiSmoothedConfig {
            ma_method1: MaMethod::Sma,
            ma_period1: 2,
            ma_method2: MaMethod::Sma,
            ma_period2: 2,
            ..Default::default()
        };
        let strategy = HeikinAshiSmoothedStrategy::new(config, Timeframe::hours(1)).unwrap();
        let mut h = Harness::new(Box::new(strategy));

        let mut prices: Vec<f64> = (0..10).map(|i| 1.1000 - i as f64 * 0.0010).collect();
        prices.extend((1..=10).map(|i| 1.0910 + i as f64 * 0.0010));
        h.feed_all(&closes(0, &prices));
        assert!(h.broker.position() > 0.0);

        let last = *prices.last().unwrap();
        let down: Vec<f64> = (1..=10).map(|i| last - i as f64 * 0.0010).collect();
        h.feed_all(&closes(prices.len() as i64, &down));
        assert!(h.broker.position() < 0.0);
        assert_eq!(h.broker.trades().len(), 1);
    }
}
