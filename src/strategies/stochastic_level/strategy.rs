use tracing::info;

use super::config::StochasticLevelConfig;
use crate::error::StrategyResult;
use crate::indicators::{crossed_above, crossed_below, Stochastic, StochasticValue};
use crate::protection::ProtectionSettings;
use crate::strategies::{enter_long, enter_short, Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct StochasticLevelStrategy {
    config: StochasticLevelConfig,
    timeframe: Timeframe,
    stochastic: Stochastic,
    prev: Option<StochasticValue>,
}

impl StochasticLevelStrategy {
    pub fn new(config: StochasticLevelConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            stochastic: Stochastic::new(config.k_period, config.d_period, config.slowing)?,
            config,
            timeframe,
            prev: None,
        })
    }
}

impl Strategy for StochasticLevelStrategy {
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
        let Some(cur) = self.stochastic.next(candle) else {
            return;
        };
        let Some(prev) = self.prev.replace(cur) else {
            return;
        };

        if crossed_above(prev.k, prev.d, cur.k, cur.d) && cur.k < self.config.oversold {
            if enter_long(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, k = cur.k, d = cur.d, "Oversold cross up");
            }
        } else if crossed_below(prev.k, prev.d, cur.k, cur.d)
            && cur.k > self.config.overbought
            && enter_short(ctx, self.config.volume).is_some()
        {
            info!(strategy = super::NAME, k = cur.k, d = cur.d, "Overbought cross down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{closes, Harness};

    fn strategy(oversold: f64, overbought: f64) -> Box<StochasticLevelStrategy> {
        let config = StochasticLevelConfig {
            oversold,
            overbought,
            ..Default::default()
        };
        Box::new(StochasticLevelStrategy::new(config, Timeframe::hours(1)).unwrap())
    }

    fn dip_and_bounce() -> Vec<f64> {
        // Accelerating decline keeps %K below %D until the bounce
        let mut prices: Vec<f64> = (0..15)
            .map(|i| 1.1000 - (i * i) as f64 * 0.00005)
            .collect();
        let last = prices[prices.len() - 1];
        prices.push(last + 0.0030);
        prices
    }

    #[test]
    fn test_cross_up_in_oversold_zone_buys() {
        let mut h = Harness::new(strategy(30.0, 80.0));
        h.feed_all(&closes(0, &dip_and_bounce()));
        assert!(h.broker.position() > 0.0);
    }

    #[test]
    fn test_cross_above_zone_is_ignored() {
        let mut h = Harness::new(strategy(1.0, 99.0));
        h.feed_all(&closes(0, &dip_and_bounce()));
        assert_eq!(h.broker.position(), 0.0);
    }
}
