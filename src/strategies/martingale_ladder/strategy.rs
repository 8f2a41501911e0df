use tracing::{info, warn};

use super::config::MartingaleLadderConfig;
use crate::protection::ProtectionSettings;
use crate::strategies::{tradable_volume, Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, Timeframe};

pub struct MartingaleLadderStrategy {
    config: MartingaleLadderConfig,
    timeframe: Timeframe,
    step: u32,
    /// Portfolio value before the current position was opened
    value_at_entry: Option<f64>,
}

impl MartingaleLadderStrategy {
    pub fn new(config: MartingaleLadderConfig, timeframe: Timeframe) -> Self {
        Self {
            config,
            timeframe,
            step: 0,
            value_at_entry: None,
        }
    }

    pub fn current_volume(&self) -> f64 {
        self.config.volume * self.config.multiplier.powi(self.step as i32)
    }

    fn on_round_trip(&mut self, pnl: f64) {
        if pnl >= 0.0 {
            self.step = 0;
        } else if self.step < self.config.max_steps {
            self.step += 1;
        } else {
            warn!(
                strategy = super::NAME,
                max_steps = self.config.max_steps,
                "Martingale ladder exhausted, back to start volume"
            );
            self.step = 0;
        }
        info!(strategy = super::NAME, pnl, step = self.step, "Round trip finished");
    }
}

impl Strategy for MartingaleLadderStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::Candles(self.timeframe)]
    }

    fn on_start(&mut self, ctx: &mut dyn StrategyContext) {
        ctx.start_protection(ProtectionSettings::from_pips(
            self.config.take_profit_pips,
            self.config.stop_loss_pips,
            false,
        ));
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, candle: &Candle) {
        if timeframe != self.timeframe || ctx.position() != 0.0 {
            return;
        }
        let Some(volume) = tradable_volume(ctx, super::NAME, self.current_volume()) else {
            return;
        };
        let value = ctx.portfolio_value();
        let order = if candle.is_bullish() {
            ctx.buy_market(volume)
        } else if candle.is_bearish() {
            ctx.sell_market(volume)
        } else {
            None
        };
        if order.is_some() {
            self.value_at_entry = Some(value);
        }
    }

    fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, _fill: &Fill) {
        if ctx.position() != 0.0 {
            return;
        }
        // Net of commission on both sides
        if let Some(start) = self.value_at_entry.take() {
            self.on_round_trip(ctx.portfolio_value() - start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestConfig;
    use crate::strategies::test_support::{candle, Harness};
    use approx::assert_relative_eq;

    fn harness(max_steps: u32) -> Harness {
        let config = MartingaleLadderConfig {
            max_steps,
            take_profit_pips: 10.0,
            stop_loss_pips: 10.0,
            ..Default::default()
        };
        Harness::new(Box::new(MartingaleLadderStrategy::new(
            config,
            Timeframe::hours(1),
        )))
    }

    /// Bullish candle opens a long at 1.1003, the next bearish candle stops it
    /// out at 1.0993 and the strategy re-enters short at 1.0995
    fn losing_long(h: &mut Harness) {
        h.feed(&candle(0, 1.1000, 1.1005, 1.0998, 1.1003));
        h.feed(&candle(1, 1.1003, 1.1003, 1.0990, 1.0995));
    }

    #[test]
    fn test_volume_doubles_after_loss() {
        let mut h = harness(5);
        losing_long(&mut h);
        assert!(h.broker.trades()[0].pnl < 0.0);
        assert_relative_eq!(h.broker.position(), -0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_win_resets_volume() {
        let mut h = harness(5);
        losing_long(&mut h);
        // Short target at 1.0985 is reached, next entry uses the start volume
        h.feed(&candle(2, 1.0995, 1.0997, 1.0980, 1.0982));
        assert!(h.broker.trades()[1].pnl > 0.0);
        assert_relative_eq!(h.broker.position(), -0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_ladder_resets_after_max_steps() {
        let mut h = harness(1);
        losing_long(&mut h);
        // Short stop at 1.1005 is hit: second loss in a row with max_steps = 1
        h.feed(&candle(2, 1.0995, 1.1010, 1.0994, 1.1008));
        assert_eq!(h.broker.trades().len(), 2);
        assert_relative_eq!(h.broker.position(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_commission_eaten_win_counts_as_loss() {
        let config = MartingaleLadderConfig {
            take_profit_pips: 10.0,
            stop_loss_pips: 10.0,
            ..Default::default()
        };
        let backtest = BacktestConfig {
            commission: 0.001,
            ..BacktestConfig::default()
        };
        let mut h = Harness::with_backtest(
            Box::new(MartingaleLadderStrategy::new(config, Timeframe::hours(1))),
            &backtest,
        );
        // Long at 1.1003, target 1.1013 hit; ten pips on 0.1 lots do not cover commission
        h.feed(&candle(0, 1.1000, 1.1005, 1.0998, 1.1003));
        h.feed(&candle(1, 1.1003, 1.1015, 1.1000, 1.1010));
        let trade = &h.broker.trades()[0];
        assert!(trade.pnl > 0.0);
        assert!(trade.net_pnl < 0.0);
        assert_relative_eq!(h.broker.position(), 0.2, epsilon = 1e-9);
    }
}
