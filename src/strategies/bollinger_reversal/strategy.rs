use tracing::info;

use super::config::BollingerReversalConfig;
use crate::error::StrategyResult;
use crate::indicators::{Atr, BandsValue, Bollinger};
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, Timeframe};

pub struct BollingerReversalStrategy {
    config: BollingerReversalConfig,
    timeframe: Timeframe,
    bands: Bollinger,
    atr: Atr,
    prev: Option<(f64, BandsValue)>,
    /// Stop distance captured at signal time, applied once filled
    pending_stop: Option<f64>,
}

impl BollingerReversalStrategy {
    pub fn new(config: BollingerReversalConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            bands: Bollinger::new(config.bb_period, config.bb_deviation)?,
            atr: Atr::new(config.atr_period)?,
            config,
            timeframe,
            prev: None,
            pending_stop: None,
        })
    }
}

impl Strategy for BollingerReversalStrategy {
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
        let bands = self.bands.next(candle.close);
        let atr = self.atr.next(candle);
        let (Some(bands), Some(atr)) = (bands, atr) else {
            return;
        };
        let Some((prev_close, prev_bands)) = self.prev.replace((candle.close, bands)) else {
            return;
        };

        let pos = ctx.position();
        if pos > 0.0 && candle.close >= bands.middle {
            info!(strategy = super::NAME, close = candle.close, "Middle band reached, closing long");
            ctx.close_position();
            return;
        }
        if pos < 0.0 && candle.close <= bands.middle {
            info!(strategy = super::NAME, close = candle.close, "Middle band reached, closing short");
            ctx.close_position();
            return;
        }
        if pos != 0.0 {
            return;
        }

        let stop_distance = atr * self.config.atr_multiplier;
        if prev_close < prev_bands.lower && candle.close > bands.lower {
            self.pending_stop = Some(stop_distance);
            ctx.buy_market(self.config.volume);
        } else if prev_close > prev_bands.upper && candle.close < bands.upper {
            self.pending_stop = Some(stop_distance);
            ctx.sell_market(self.config.volume);
        }
    }

    fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, fill: &Fill) {
        let pos = ctx.position();
        if pos == 0.0 {
            return;
        }
        if let Some(distance) = self.pending_stop.take() {
            let stop = fill.price - pos.signum() * distance;
            info!(strategy = super::NAME, entry = fill.price, stop, "Position opened");
            ctx.set_stop_loss(stop);
        }
    }
}
