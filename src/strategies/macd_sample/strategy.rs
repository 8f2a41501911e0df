use tracing::{debug, info};

use super::config::MacdSampleConfig;
use crate::error::StrategyResult;
use crate::indicators::{Ema, Macd, MacdValue};
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, Timeframe};

pub struct MacdSampleStrategy {
    config: MacdSampleConfig,
    timeframe: Timeframe,
    macd: Macd,
    trend: Ema,
    prev: Option<(MacdValue, f64)>,
    /// Stop managed by the trailing logic while a position is open
    trailing_stop: Option<f64>,
}

impl MacdSampleStrategy {
    pub fn new(config: MacdSampleConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            macd: Macd::new(config.fast_period, config.slow_period, config.signal_period)?,
            trend: Ema::new(config.trend_period)?,
            config,
            timeframe,
            prev: None,
            trailing_stop: None,
        })
    }

    fn trail(&mut self, ctx: &mut dyn StrategyContext, close: f64) {
        if self.config.trailing_stop_pips <= 0.0 {
            return;
        }
        let Some(entry) = ctx.position_price() else {
            return;
        };
        let distance = ctx.security().pips(self.config.trailing_stop_pips);
        let pos = ctx.position();

        let candidate = if pos > 0.0 && close - entry > distance {
            Some(close - distance)
        } else if pos < 0.0 && entry - close > distance {
            Some(close + distance)
        } else {
            None
        };
        let Some(candidate) = candidate else {
            return;
        };
        let tighter = match self.trailing_stop {
            None => true,
            Some(stop) if pos > 0.0 => candidate > stop,
            Some(stop) => candidate < stop,
        };
        if tighter {
            debug!(strategy = super::NAME, stop = candidate, "Trailing stop moved");
            self.trailing_stop = Some(candidate);
            ctx.set_stop_loss(candidate);
        }
    }
}

impl Strategy for MacdSampleStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::Candles(self.timeframe)]
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle) {
        if timeframe != self.timeframe {
            return;
        }
        let macd = self.macd.next(candle.close);
        let ma = self.trend.next(candle.close);
        let (Some(cur), Some(ma)) = (macd, ma) else {
            return;
        };
        let Some((prev, prev_ma)) = self.prev.replace((cur, ma)) else {
            return;
        };

        let open_level = ctx.security().pips(self.config.macd_open_level);
        let close_level = ctx.security().pips(self.config.macd_close_level);
        let pos = ctx.position();

        if pos == 0.0 {
            self.trailing_stop = None;
            let bullish = cur.macd < 0.0
                && cur.macd > cur.signal
                && prev.macd < prev.signal
                && cur.macd.abs() > open_level
                && ma > prev_ma;
            let bearish = cur.macd > 0.0
                && cur.macd < cur.signal
                && prev.macd > prev.signal
                && cur.macd > open_level
                && ma < prev_ma;

            if bullish {
                if ctx.buy_market(self.config.volume).is_some() {
                    info!(strategy = super::NAME, macd = cur.macd, "Buy signal");
                }
            } else if bearish && ctx.sell_market(self.config.volume).is_some() {
                info!(strategy = super::NAME, macd = cur.macd, "Sell signal");
            }
            return;
        }

        let exit = if pos > 0.0 {
            cur.macd > 0.0
                && cur.macd < cur.signal
                && prev.macd > prev.signal
                && cur.macd > close_level
        } else {
            cur.macd < 0.0
                && cur.macd > cur.signal
                && prev.macd < prev.signal
                && cur.macd.abs() > close_level
        };

        if exit {
            info!(strategy = super::NAME, macd = cur.macd, "Exit signal");
            ctx.close_position();
        } else {
            self.trail(ctx, candle.close);
        }
    }

    fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, fill: &Fill) {
        let pos = ctx.position();
        if pos == 0.0 {
            self.trailing_stop = None;
            return;
        }
        if self.config.take_profit_pips > 0.0 {
            let distance = ctx.security().pips(self.config.take_profit_pips);
            ctx.set_take_profit(fill.price + pos.signum() * distance);
        }
    }
}
