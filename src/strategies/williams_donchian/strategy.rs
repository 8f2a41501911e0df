use tracing::info;

use super::config::WilliamsDonchianConfig;
use crate::error::StrategyResult;
use crate::indicators::{Donchian, DonchianValue, Ema, WilliamsR};
use crate::protection::ProtectionSettings;
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Timeframe};

pub struct WilliamsDonchianStrategy {
    config: WilliamsDonchianConfig,
    timeframe: Timeframe,
    trend_timeframe: Timeframe,
    wpr: WilliamsR,
    trend: Ema,
    channel: Donchian,
    prev_wpr: Option<f64>,
    prev_channel: Option<DonchianValue>,
}

impl WilliamsDonchianStrategy {
    pub fn new(config: WilliamsDonchianConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            wpr: WilliamsR::new(config.wpr_period)?,
            trend: Ema::new(config.trend_period)?,
            channel: Donchian::new(config.donchian_period)?,
            trend_timeframe: config.trend_timeframe.unwrap_or(timeframe),
            config,
            timeframe,
            prev_wpr: None,
            prev_channel: None,
        })
    }

    fn on_signal_candle(&mut self, ctx: &mut dyn StrategyContext, candle: &Candle) {
        let wpr = self.wpr.next(candle);
        let channel = self.channel.next(candle);
        let prev_channel = std::mem::replace(&mut self.prev_channel, channel);
        let Some(wpr) = wpr else {
            return;
        };
        let prev_wpr = self.prev_wpr.replace(wpr);

        let pos = ctx.position();
        if pos != 0.0 {
            let Some(prev_channel) = prev_channel else {
                return;
            };
            if pos > 0.0 && candle.close < prev_channel.lower {
                info!(strategy = super::NAME, close = candle.close, "Donchian exit long");
                ctx.close_position();
            } else if pos < 0.0 && candle.close > prev_channel.upper {
                info!(strategy = super::NAME, close = candle.close, "Donchian exit short");
                ctx.close_position();
            }
            return;
        }

        let (Some(prev_wpr), Some(trend)) = (prev_wpr, self.trend.value()) else {
            return;
        };
        if prev_wpr < self.config.oversold && wpr >= self.config.oversold && candle.close > trend {
            if ctx.buy_market(self.config.volume).is_some() {
                info!(strategy = super::NAME, wpr, trend, "Oversold exit, buying");
            }
        } else if prev_wpr > self.config.overbought
            && wpr <= self.config.overbought
            && candle.close < trend
            && ctx.sell_market(self.config.volume).is_some()
        {
            info!(strategy = super::NAME, wpr, trend, "Overbought exit, selling");
        }
    }
}

impl Strategy for WilliamsDonchianStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        let mut subs = vec![Subscription::Candles(self.timeframe)];
        if self.trend_timeframe != self.timeframe {
            subs.push(Subscription::Candles(self.trend_timeframe));
        }
        subs
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
        // Trend first so a shared series sees the updated EMA
        if timeframe == self.trend_timeframe {
            self.trend.next(candle.close);
        }
        if timeframe == self.timeframe {
            self.on_signal_candle(ctx, candle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{candle, closes, Harness};

    fn config() -> WilliamsDonchianConfig {
        WilliamsDonchianConfig {
            wpr_period: 3,
            trend_period: 3,
            donchian_period: 3,
            stop_loss_pips: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_subscribes_to_trend_series() {
        let strategy = WilliamsDonchianStrategy::new(
            WilliamsDonchianConfig {
                trend_timeframe: Some(Timeframe::hours(4)),
                ..config()
            },
            Timeframe::hours(1),
        )
        .unwrap();
        assert_eq!(
            strategy.subscriptions(),
            vec![
                Subscription::Candles(Timeframe::hours(1)),
                Subscription::Candles(Timeframe::hours(4))
            ]
        );
    }

    #[test]
    fn test_long_needs_uptrend_and_exits_on_channel_break() {
        let strategy = WilliamsDonchianStrategy::new(config(), Timeframe::hours(1)).unwrap();
        let mut h = Harness::new(Box::new(strategy));
        // Uptrend with a shallow pullback that pushes %R into the oversold zone
        let mut prices: Vec<f64> = (0..8).map(|i| 1.1000 + i as f64 * 0.0010).collect();
        prices.extend([1.1065, 1.1050]);
        h.feed_all(&closes(0, &prices));
        assert_eq!(h.broker.position(), 0.0);

        h.feed(&candle(10, 1.1050, 1.1090, 1.1049, 1.1088));
        assert!(h.broker.position() > 0.0);

        h.feed(&candle(11, 1.1088, 1.1089, 1.1000, 1.1005));
        assert_eq!(h.broker.position(), 0.0);
    }

    #[test]
    fn test_slower_trend_series_flips_direction() {
        let strategy = WilliamsDonchianStrategy::new(
            WilliamsDonchianConfig {
                trend_timeframe: Some(Timeframe::hours(4)),
                ..config()
            },
            Timeframe::hours(1),
        )
        .unwrap();
        let mut h = Harness::new(Box::new(strategy));
        for (i, close) in [1.2000, 1.1990, 1.1980].iter().enumerate() {
            h.feed_on(
                Timeframe::hours(4),
                &candle(i as i64 * 4 - 12, *close, *close, *close, *close),
            );
        }
        let mut prices: Vec<f64> = (0..8).map(|i| 1.1000 + i as f64 * 0.0010).collect();
        prices.extend([1.1065, 1.1050]);
        h.feed_all(&closes(0, &prices));
        h.feed(&candle(10, 1.1050, 1.1090, 1.1049, 1.1088));

        // Price below the 4h EMA: the pullback is sold, the rebound only exits
        assert_eq!(h.broker.position(), 0.0);
        let trades = h.broker.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, crate::Side::Sell);
    }
}
