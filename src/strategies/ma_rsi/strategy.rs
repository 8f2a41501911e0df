use tracing::info;

use super::config::MaRsiConfig;
use crate::error::StrategyResult;
use crate::indicators::{crossed_above, crossed_below, Ema, Rsi};
use crate::protection::ProtectionSettings;
use crate::strategies::{enter_long, enter_short, Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct MaRsiStrategy {
    config: MaRsiConfig,
    timeframe: Timeframe,
    fast: Ema,
    slow: Ema,
    rsi: Rsi,
    prev: Option<(f64, f64)>,
}

impl MaRsiStrategy {
    pub fn new(config: MaRsiConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            fast: Ema::new(config.fast_period)?,
            slow: Ema::new(config.slow_period)?,
            rsi: Rsi::new(config.rsi_period)?,
            config,
            timeframe,
            prev: None,
        })
    }
}

impl Strategy for MaRsiStrategy {
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
            self.config.trailing_stop,
        );
        if !settings.is_empty() {
            ctx.start_protection(settings);
        }
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle) {
        if timeframe != self.timeframe {
            return;
        }
        let fast = self.fast.next(candle.close);
        let slow = self.slow.next(candle.close);
        let rsi = self.rsi.next(candle.close);
        let (Some(fast), Some(slow), Some(rsi)) = (fast, slow, rsi) else {
            return;
        };
        let Some((prev_fast, prev_slow)) = self.prev.replace((fast, slow)) else {
            return;
        };

        if crossed_above(prev_fast, prev_slow, fast, slow) && rsi < self.config.rsi_upper {
            if enter_long(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, fast, slow, rsi, "Bullish cross");
            }
        } else if crossed_below(prev_fast, prev_slow, fast, slow) && rsi > self.config.rsi_lower {
            if enter_short(ctx, self.config.volume).is_some() {
                info!(strategy = super::NAME, fast, slow, rsi, "Bearish cross");
            }
        }
    }
}
