use tracing::info;

use super::config::PemaCrossConfig;
use super::pema::Pema;
use crate::error::StrategyResult;
use crate::indicators::History;
use crate::protection::ProtectionSettings;
use crate::strategies::{enter_long, enter_short, Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct PemaCrossStrategy {
    config: PemaCrossConfig,
    timeframe: Timeframe,
    pema: Pema,
    history: History<f64>,
}

impl PemaCrossStrategy {
    pub fn new(config: PemaCrossConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            pema: Pema::new(config.ema_period)?,
            config,
            timeframe,
            history: History::new(3),
        })
    }
}

impl Strategy for PemaCrossStrategy {
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
        let Some(value) = self.pema.next(candle.close) else {
            return;
        };
        self.history.push(value);
        let (Some(cur), Some(prev), Some(prev2)) =
            (self.history.get(0), self.history.get(1), self.history.get(2))
        else {
            return;
        };

        if cur > prev && prev <= prev2 {
            if enter_long(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, pema = cur, "PEMA turned up");
            }
        } else if cur < prev && prev >= prev2 && enter_short(ctx, self.config.volume).is_some() {
            info!(strategy = super::NAME, pema = cur, "PEMA turned down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{closes, Harness};

    fn harness() -> Harness {
        let config = PemaCrossConfig {
            ema_period: 2,
            take_profit_pips: 0.0,
            stop_loss_pips: 0.0,
            ..Default::default()
        };
        Harness::new(Box::new(
            PemaCrossStrategy::new(config, Timeframe::hours(1)).unwrap(),
        ))
    }

    #[test]
    fn test_trough_buys_and_peak_reverses() {
        let mut h = harness();
        let mut prices: Vec<f64> = (0..10).map(|i| 1.1000 - i as f64 * 0.0010).collect();
        prices.extend((1..=6).map(|i| 1.0910 + i as f64 * 0.0010));
        h.feed_all(&closes(0, &prices));
        assert!(h.broker.position() > 0.0);

        let last = *prices.last().unwrap();
        let down: Vec<f64> = (1..=4).map(|i| last - i as f64 * 0.0010).collect();
        h.feed_all(&closes(prices.len() as i64, &down));
        assert!(h.broker.position() < 0.0);
    }
}
