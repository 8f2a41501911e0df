use chrono::Duration;
use tracing::{debug, info};

use super::config::SpreadScalperConfig;
use crate::error::StrategyResult;
use crate::indicators::Momentum;
use crate::protection::ProtectionSettings;
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Quote, Timeframe};

pub struct SpreadScalperStrategy {
    config: SpreadScalperConfig,
    timeframe: Timeframe,
    momentum: Momentum,
    quote: Option<Quote>,
}

impl SpreadScalperStrategy {
    pub fn new(config: SpreadScalperConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            momentum: Momentum::new(config.momentum_period)?,
            config,
            timeframe,
            quote: None,
        })
    }

    /// Spread in pips of the current quote, `None` if missing or stale
    fn live_spread(&self, ctx: &dyn StrategyContext) -> Option<f64> {
        let quote = self.quote?;
        let age = ctx.current_time() - quote.time;
        if age > Duration::seconds(self.config.max_quote_age_secs) {
            return None;
        }
        Some(quote.spread() / ctx.security().pip_size())
    }
}

impl Strategy for SpreadScalperStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::Candles(self.timeframe), Subscription::Level1]
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

    fn on_level1(&mut self, _ctx: &mut dyn StrategyContext, quote: &Quote) {
        self.quote = Some(*quote);
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle) {
        if timeframe != self.timeframe {
            return;
        }
        let Some(momentum) = self.momentum.next(candle.close) else {
            return;
        };
        if ctx.position() != 0.0 {
            return;
        }

        let Some(spread) = self.live_spread(ctx) else {
            debug!(strategy = super::NAME, "No fresh quote, candle skipped");
            return;
        };
        if spread > self.config.max_spread_pips {
            debug!(strategy = super::NAME, spread, "Spread too wide");
            return;
        }

        let threshold = self.config.momentum_threshold;
        if momentum > 100.0 + threshold && candle.is_bullish() {
            if ctx.buy_market(self.config.volume).is_some() {
                info!(strategy = super::NAME, momentum, spread, "Momentum long");
            }
        } else if momentum < 100.0 - threshold
            && candle.is_bearish()
            && ctx.sell_market(self.config.volume).is_some()
        {
            info!(strategy = super::NAME, momentum, spread, "Momentum short");
        }
    }
}
