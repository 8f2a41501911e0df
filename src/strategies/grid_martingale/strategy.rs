use tracing::{debug, info};

use super::config::GridMartingaleConfig;
use crate::error::StrategyResult;
use crate::indicators::Ema;
use crate::strategies::{tradable_volume, Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, OrderId, Side, Timeframe};

#[derive(Debug, Clone)]
struct Slot {
    order: Option<OrderId>,
    volume: f64,
    entry: f64,
    trailing_stop: Option<f64>,
}

pub struct GridMartingaleStrategy {
    config: GridMartingaleConfig,
    timeframe: Timeframe,
    ema: Ema,
    direction: Option<Side>,
    slots: Vec<Slot>,
}

impl GridMartingaleStrategy {
    pub fn new(config: GridMartingaleConfig, timeframe: Timeframe) -> StrategyResult<Self> {
        Ok(Self {
            ema: Ema::new(config.ema_period)?,
            config,
            timeframe,
            direction: None,
            slots: Vec::with_capacity(super::MAX_SLOTS),
        })
    }

    fn open_slot(&mut self, ctx: &mut dyn StrategyContext, side: Side, price: f64) {
        let index = self.slots.len();
        let Some(volume) = tradable_volume(ctx, super::NAME, self.config.slot_volume(index)) else {
            return;
        };
        let order = match side {
            Side::Buy => ctx.buy_market(volume),
            Side::Sell => ctx.sell_market(volume),
        };
        if order.is_none() {
            return;
        }
        info!(strategy = super::NAME, slot = index, side = ?side, volume, price, "Slot opened");
        self.slots.push(Slot {
            order,
            volume,
            entry: price,
            trailing_stop: None,
        });
    }

    /// Close slots that reached their target or trailing stop
    fn manage_slots(&mut self, ctx: &mut dyn StrategyContext, side: Side, close: f64) {
        let pip = ctx.security().pip_size();
        let take_profit = self.config.take_profit_pips;
        let trailing = self.config.trailing_stop_pips;
        let sign = side.sign();

        let mut index = 0;
        while index < self.slots.len() {
            let slot = &mut self.slots[index];
            let profit_pips = sign * (close - slot.entry) / pip;
            let trail_hit = slot
                .trailing_stop
                .is_some_and(|stop| sign * (close - stop) <= 0.0);

            if profit_pips >= take_profit || trail_hit {
                let volume = slot.volume;
                let reason = if trail_hit { "trailing stop" } else { "take profit" };
                let closed = match side {
                    Side::Buy => ctx.sell_market(volume),
                    Side::Sell => ctx.buy_market(volume),
                };
                if closed.is_some() {
                    info!(strategy = super::NAME, slot = index, profit_pips, reason, "Slot closed");
                    self.slots.remove(index);
                    continue;
                }
            } else if trailing > 0.0 && profit_pips >= trailing {
                let candidate = close - sign * trailing * pip;
                let tighter = slot
                    .trailing_stop
                    .map_or(true, |stop| sign * (candidate - stop) > 0.0);
                if tighter {
                    debug!(strategy = super::NAME, slot = index, stop = candidate, "Trailing stop moved");
                    slot.trailing_stop = Some(candidate);
                }
            }
            index += 1;
        }
    }
}

impl Strategy for GridMartingaleStrategy {
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
        let Some(ema) = self.ema.next(candle.close) else {
            return;
        };
        let close = candle.close;

        let Some(side) = self.direction else {
            let side = if close > ema {
                Side::Buy
            } else if close < ema {
                Side::Sell
            } else {
                return;
            };
            self.open_slot(ctx, side, close);
            if !self.slots.is_empty() {
                self.direction = Some(side);
            }
            return;
        };

        self.manage_slots(ctx, side, close);
        if self.slots.is_empty() {
            info!(strategy = super::NAME, "Cycle complete");
            self.direction = None;
            return;
        }

        if self.slots.len() < self.config.max_slots {
            let step = ctx.security().pips(self.config.grid_step_pips);
            let last_entry = self.slots[self.slots.len() - 1].entry;
            if side.sign() * (last_entry - close) >= step {
                self.open_slot(ctx, side, close);
            }
        }
    }

    fn on_own_trade(&mut self, _ctx: &mut dyn StrategyContext, fill: &Fill) {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.order == Some(fill.order_id))
        {
            slot.entry = fill.price;
        }
    }
}
