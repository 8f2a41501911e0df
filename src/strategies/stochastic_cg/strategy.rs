use tracing::info;

use super::config::StochasticCgConfig;
use super::indicator::{CgValue, StochasticCg};
use crate::error::StrategyResult;
use crate::indicators::{crossed_above, crossed_below};
use crate::protection::ProtectionSettings;
use crate::strategies::{enter_long, enter_short, Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct StochasticCgStrategy {
    config: StochasticCgConfig,
    timeframe: Timeframe,
    cg: StochasticCg,
    prev: Option<CgValue>,
}

impl StochasticCgStrategy {
    pub fn new(config: StochasticCgConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            cg: StochasticCg::new(config.length)?,
            config,
            timeframe,
            prev: None,
        })
    }
}

impl Strategy for StochasticCgStrategy {
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
        let Some(cur) = self.cg.next(candle) else {
            return;
        };
        let Some(prev) = self.prev.replace(cur) else {
            return;
        };

        if crossed_above(prev.oscillator, prev.trigger, cur.oscillator, cur.trigger) {
            if enter_long(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, oscillator = cur.oscillator, "CG crossed above trigger");
            }
        } else if crossed_below(prev.oscillator, prev.trigger, cur.oscillator, cur.trigger)
            && enter_short(ctx, self.config.volume).is_some()
        {
            info!(strategy = super::NAME, oscillator = cur.oscillator, "CG crossed below trigger");
        }
    }
}
