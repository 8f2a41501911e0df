use tracing::info;

use super::config::XHullTrendConfig;
use super::hull::HullMa;
use crate::error::StrategyResult;
use crate::indicators::{crossed_above, crossed_below, Ema};
use crate::protection::ProtectionSettings;
use crate::strategies::{enter_long, enter_short, Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct XHullTrendStrategy {
    config: XHullTrendConfig,
    timeframe: Timeframe,
    hull: HullMa,
    signal: Ema,
    prev: Option<(f64, f64)>,
}

impl XHullTrendStrategy {
    pub fn new(config: XHullTrendConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            hull: HullMa::new(config.hull_period)?,
            signal: Ema::new(config.signal_period)?,
            config,
            timeframe,
            prev: None,
        })
    }
}

impl Strategy for XHullTrendStrategy {
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
        let Some(hull) = self.hull.next(candle.close) else {
            return;
        };
        let Some(signal) = self.signal.next(hull) else {
            return;
        };
        let Some((prev_hull, prev_signal)) = self.prev.replace((hull, signal)) else {
            return;
        };

        let pos = ctx.position();
        let may_enter = |reversing: bool| self.config.close_on_opposite || !reversing;

        if crossed_above(prev_hull, prev_signal, hull, signal) && may_enter(pos < 0.0) {
            if enter_long(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, hull, signal, "Hull crossed above signal");
            }
        } else if crossed_below(prev_hull, prev_signal, hull, signal)
            && may_enter(pos > 0.0)
            && enter_short(ctx, self.config.volume).is_some()
        {
            info!(strategy = super::NAME, hull, signal, "Hull crossed below signal");
        }
    }
}
