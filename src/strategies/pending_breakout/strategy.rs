use tracing::{debug, info};

use super::config::PendingBreakoutConfig;
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, OrderId, Timeframe};

/// One armed bracket: both stop orders and their prices
#[derive(Debug, Clone, Copy)]
struct Bracket {
    buy: OrderId,
    buy_price: f64,
    sell: OrderId,
    sell_price: f64,
    bars_left: usize,
}

pub struct PendingBreakoutStrategy {
    config: PendingBreakoutConfig,
    timeframe: Timeframe,
    bracket: Option<Bracket>,
}

impl PendingBreakoutStrategy {
    pub fn new(config: PendingBreakoutConfig, timeframe: Timeframe) -> Self {
        Self {
            config,
            timeframe,
            bracket: None,
        }
    }

    fn arm(&mut self, ctx: &mut dyn StrategyContext, candle: &Candle) {
        let offset = ctx.security().pips(self.config.offset_pips);
        let buy_price = candle.high + offset;
        let sell_price = candle.low - offset;

        let Some(buy) = ctx.buy_stop(self.config.volume, buy_price) else {
            return;
        };
        let Some(sell) = ctx.sell_stop(self.config.volume, sell_price) else {
            ctx.cancel_order(buy);
            return;
        };
        debug!(strategy = super::NAME, buy_price, sell_price, "Bracket armed");
        self.bracket = Some(Bracket {
            buy,
            buy_price,
            sell,
            sell_price,
            bars_left: self.config.expiry_bars,
        });
    }
}

impl Strategy for PendingBreakoutStrategy {
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

        if let Some(bracket) = self.bracket.as_mut() {
            bracket.bars_left = bracket.bars_left.saturating_sub(1);
            if bracket.bars_left > 0 {
                return;
            }
            let bracket = *bracket;
            self.bracket = None;
            ctx.cancel_order(bracket.buy);
            ctx.cancel_order(bracket.sell);
            debug!(strategy = super::NAME, "Bracket expired");
        }

        if ctx.position() == 0.0 {
            self.arm(ctx, candle);
        }
    }

    fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, fill: &Fill) {
        let Some(bracket) = self.bracket else {
            return;
        };
        let (other, stop) = if fill.order_id == bracket.buy {
            (bracket.sell, bracket.sell_price)
        } else if fill.order_id == bracket.sell {
            (bracket.buy, bracket.buy_price)
        } else {
            return;
        };
        self.bracket = None;
        ctx.cancel_order(other);
        ctx.set_stop_loss(stop);
        if self.config.take_profit_pips > 0.0 {
            let distance = ctx.security().pips(self.config.take_profit_pips);
            ctx.set_take_profit(fill.price + fill.side.sign() * distance);
        }
        info!(
            strategy = super::NAME,
            side = ?fill.side,
            price = fill.price,
            stop,
            "Breakout filled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{candle, Harness};
    use crate::{OrderKind, OrderStatus};
    use approx::assert_relative_eq;

    fn harness(expiry_bars: usize) -> Harness {
        let config = PendingBreakoutConfig {
            expiry_bars,
            take_profit_pips: 0.0,
            ..Default::default()
        };
        Harness::new(Box::new(PendingBreakoutStrategy::new(
            config,
            Timeframe::hours(1),
        )))
    }

    #[test]
    fn test_buy_stop_fill_cancels_sell_and_sets_stop() {
        let mut h = harness(3);
        h.feed(&candle(0, 1.1000, 1.1010, 1.0990, 1.1005));
        let stops: Vec<_> = h.broker.orders().iter().filter(|o| o.is_active()).collect();
        assert_eq!(stops.len(), 2);

        // Trades through the buy stop at 1.1015
        h.feed(&candle(1, 1.1005, 1.1030, 1.1000, 1.1025));
        assert!(h.broker.position() > 0.0);
        assert_relative_eq!(h.broker.position_price().unwrap(), 1.1015, epsilon = 1e-9);
        assert_relative_eq!(
            h.broker.protection().stop_loss().unwrap(),
            1.0985,
            epsilon = 1e-9
        );
        assert!(h.broker.orders().iter().all(|o| !o.is_active()));
        assert_eq!(
            h.broker
                .orders()
                .iter()
                .filter(|o| o.status == OrderStatus::Canceled)
                .count(),
            1
        );
    }

    #[test]
    fn test_outside_bar_fills_one_leg_only() {
        let mut h = harness(3);
        h.feed(&candle(0, 1.1000, 1.1010, 1.0990, 1.1000));

        // Spans both stops; the buy at 1.1015 is nearer the open
        h.feed(&candle(1, 1.1005, 1.1040, 1.0960, 1.1000));
        let stops = |status: OrderStatus| {
            h.broker
                .orders()
                .iter()
                .filter(|o| o.kind == OrderKind::Stop && o.status == status)
                .count()
        };
        assert_eq!(stops(OrderStatus::Filled), 1);
        assert_eq!(stops(OrderStatus::Canceled), 1);

        // The long is then stopped at the opposite bracket price
        let trades = h.broker.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].reason, "Stop Loss");
        assert_relative_eq!(trades[0].entry_price, 1.1015, epsilon = 1e-9);
        assert_relative_eq!(trades[0].exit_price, 1.0985, epsilon = 1e-9);
    }

    #[test]
    fn test_unfilled_bracket_expires_and_rearms() {
        let mut h = harness(2);
        h.feed(&candle(0, 1.1000, 1.1010, 1.0990, 1.1005));
        h.feed(&candle(1, 1.1005, 1.1008, 1.0995, 1.1000));
        assert_eq!(h.broker.orders().iter().filter(|o| o.is_active()).count(), 2);

        h.feed(&candle(2, 1.1000, 1.1006, 1.0996, 1.1002));
        let canceled = h
            .broker
            .orders()
            .iter()
            .filter(|o| o.status == OrderStatus::Canceled)
            .count();
        assert_eq!(canceled, 2);
        // New bracket around candle 2
        let active: Vec<_> = h.broker.orders().iter().filter(|o| o.is_active()).collect();
        assert_eq!(active.len(), 2);
        assert_relative_eq!(active[0].price.unwrap(), 1.1011, epsilon = 1e-9);
    }
}
