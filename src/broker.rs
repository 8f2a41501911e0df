//! Simulated host for running strategies over historical data
//!
//! Net-position accounting with average price, immediate market fills,
//! resting stop orders matched against candles or quotes, and protective
//! levels. This is the minimum needed to exercise the strategies; it is not
//! an exchange simulator.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::BacktestConfig;
use crate::protection::{ProtectionHit, ProtectionSettings, ProtectionState};
use crate::security::Security;
use crate::strategies::StrategyContext;
use crate::{Candle, Fill, Order, OrderId, OrderKind, OrderStatus, Quote, Side, Trade};

const EPSILON: f64 = 1e-9;

/// Stop orders filled per candle or quote before matching gives up
const MAX_STOP_FILLS_PER_EVENT: usize = 16;

pub struct SimBroker {
    security: Security,
    commission: f64,
    slippage: f64,
    initial_capital: f64,
    time: DateTime<Utc>,
    last_price: Option<f64>,
    last_quote: Option<Quote>,
    position: f64,
    avg_price: f64,
    entry_time: DateTime<Utc>,
    realized_pnl: f64,
    total_commission: f64,
    protection: ProtectionState,
    orders: Vec<Order>,
    pending_fills: Vec<Fill>,
    failed_orders: Vec<Order>,
    trades: Vec<Trade>,
    stopped: Option<String>,
}

impl SimBroker {
    pub fn new(security: Security, config: &BacktestConfig) -> Self {
        Self {
            security,
            commission: config.commission,
            slippage: config.slippage,
            initial_capital: config.initial_capital,
            time: DateTime::<Utc>::MIN_UTC,
            last_price: None,
            last_quote: None,
            position: 0.0,
            avg_price: 0.0,
            entry_time: DateTime::<Utc>::MIN_UTC,
            realized_pnl: 0.0,
            total_commission: 0.0,
            protection: ProtectionState::default(),
            orders: Vec::new(),
            pending_fills: Vec::new(),
            failed_orders: Vec::new(),
            trades: Vec::new(),
            stopped: None,
        }
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = time;
    }

    /// Match resting orders and protective levels against a finished candle
    /// of the primary series, then mark the position at its close.
    ///
    /// Triggered stop orders fill one at a time, nearest to the open first.
    /// `on_fill` runs after each fill so the strategy can cancel the others.
    pub fn process_candle<F>(&mut self, candle: &Candle, on_fill: F)
    where
        F: FnMut(&mut SimBroker),
    {
        self.trigger_stop_orders(
            candle.open,
            |side, price| match side {
                Side::Buy if candle.high >= price => Some(candle.open.max(price)),
                Side::Sell if candle.low <= price => Some(candle.open.min(price)),
                _ => None,
            },
            on_fill,
        );

        if let Some(hit) = self.protection.check_candle(candle) {
            self.close_by_protection(hit);
        }

        self.last_price = Some(candle.close);
        if self.position != 0.0 {
            self.protection.update_trailing(candle.close);
        }
    }

    /// Match resting orders and protective levels against a quote
    pub fn process_quote<F>(&mut self, quote: &Quote, on_fill: F)
    where
        F: FnMut(&mut SimBroker),
    {
        self.last_quote = Some(*quote);

        self.trigger_stop_orders(
            quote.mid(),
            |side, price| match side {
                Side::Buy if quote.ask >= price => Some(quote.ask),
                Side::Sell if quote.bid <= price => Some(quote.bid),
                _ => None,
            },
            on_fill,
        );

        if let Some(hit) = self.protection.check_quote(quote) {
            self.close_by_protection(hit);
        }

        self.last_price = Some(quote.mid());
        if self.position > 0.0 {
            self.protection.update_trailing(quote.bid);
        } else if self.position < 0.0 {
            self.protection.update_trailing(quote.ask);
        }
    }

    /// Fills generated since the last call, in execution order
    pub fn drain_fills(&mut self) -> Vec<Fill> {
        std::mem::take(&mut self.pending_fills)
    }

    /// Orders rejected since the last call
    pub fn drain_failed_orders(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.failed_orders)
    }

    /// Close any open position at the last known price
    pub fn liquidate(&mut self, reason: &str) {
        self.cancel_active_orders();
        if self.position == 0.0 {
            return;
        }
        let Some(price) = self.last_price else {
            return;
        };
        let side = if self.position > 0.0 {
            Side::Sell
        } else {
            Side::Buy
        };
        let id = self.record_order(side, OrderKind::Market, self.position.abs(), None, reason);
        self.execute(id, price);
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stopped.as_deref()
    }

    pub fn protection(&self) -> &ProtectionState {
        &self.protection
    }

    pub fn equity(&self) -> f64 {
        let unrealized = match self.last_price {
            Some(price) if self.position != 0.0 => (price - self.avg_price) * self.position,
            _ => 0.0,
        };
        self.initial_capital + self.realized_pnl - self.total_commission + unrealized
    }

    fn trigger_stop_orders<T, F>(&mut self, reference: f64, trigger: T, mut on_fill: F)
    where
        T: Fn(Side, f64) -> Option<f64>,
        F: FnMut(&mut SimBroker),
    {
        for _ in 0..MAX_STOP_FILLS_PER_EVENT {
            let next = self
                .orders
                .iter()
                .filter(|o| o.is_active() && o.kind == OrderKind::Stop)
                .filter_map(|o| {
                    let stop = o.price?;
                    trigger(o.side, stop).map(|fill_price| (o.id, stop, fill_price))
                })
                .min_by(|a, b| {
                    (a.1 - reference)
                        .abs()
                        .total_cmp(&(b.1 - reference).abs())
                });

            let Some((id, _, fill_price)) = next else {
                return;
            };
            self.execute(id, fill_price);
            on_fill(&mut *self);
        }
        warn!(
            limit = MAX_STOP_FILLS_PER_EVENT,
            "Stop order fill limit reached, remaining triggers deferred"
        );
    }

    fn close_by_protection(&mut self, hit: ProtectionHit) {
        let side = if self.position > 0.0 {
            Side::Sell
        } else {
            Side::Buy
        };
        let volume = self.position.abs();
        if volume <= 0.0 {
            return;
        }
        info!(
            time = %self.time.format("%Y-%m-%d %H:%M"),
            price = hit.price(),
            "{} triggered",
            hit.reason()
        );
        let id = self.record_order(
            side,
            OrderKind::Protective,
            volume,
            Some(hit.price()),
            hit.reason(),
        );
        self.execute(id, hit.price());
    }

    fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        // Ids are assigned sequentially starting at 1
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.orders.get_mut(index)
    }

    fn record_order(
        &mut self,
        side: Side,
        kind: OrderKind,
        volume: f64,
        price: Option<f64>,
        comment: &str,
    ) -> OrderId {
        let id = OrderId(self.orders.len() as u64 + 1);
        self.orders.push(Order {
            id,
            symbol: self.security.symbol.clone(),
            side,
            kind,
            status: OrderStatus::Active,
            volume,
            price,
            fill_price: None,
            created_time: self.time,
            updated_time: self.time,
            comment: comment.to_string(),
        });
        id
    }

    fn reject(&mut self, id: OrderId, reason: &str) {
        let time = self.time;
        if let Some(order) = self.order_mut(id) {
            order.status = OrderStatus::Rejected;
            order.updated_time = time;
            order.comment = reason.to_string();
            let order = order.clone();
            warn!(order = %order.id, reason, "Order rejected");
            self.failed_orders.push(order);
        }
    }

    /// Validate the request and return the normalized volume
    fn accept_volume(&self, volume: f64) -> Option<f64> {
        if let Some(reason) = &self.stopped {
            debug!(reason = reason.as_str(), "Strategy stopped, order ignored");
            return None;
        }
        if volume <= 0.0 || !volume.is_finite() {
            warn!(volume, "Order volume must be positive, order skipped");
            return None;
        }
        let normalized = self.security.normalize_volume(volume);
        if normalized <= 0.0 {
            warn!(
                volume,
                min_volume = self.security.min_volume,
                "Order volume below instrument minimum, order skipped"
            );
            return None;
        }
        Some(normalized)
    }

    fn market_order(&mut self, side: Side, volume: f64) -> Option<OrderId> {
        let volume = self.accept_volume(volume)?;
        let id = self.record_order(side, OrderKind::Market, volume, None, "");

        let quote_price = self
            .last_quote
            .filter(|q| q.time == self.time)
            .map(|q| match side {
                Side::Buy => q.ask,
                Side::Sell => q.bid,
            });
        let price = quote_price.or_else(|| {
            self.last_price
                .map(|p| p * (1.0 + side.sign() * self.slippage))
        });

        match price {
            Some(price) => self.execute(id, price),
            None => self.reject(id, "No market price available"),
        }
        Some(id)
    }

    fn stop_order(&mut self, side: Side, volume: f64, price: f64) -> Option<OrderId> {
        if price <= 0.0 || !price.is_finite() {
            warn!(price, "Stop price must be positive, order skipped");
            return None;
        }
        let volume = self.accept_volume(volume)?;
        let price = self.security.round_price(price);
        let id = self.record_order(side, OrderKind::Stop, volume, Some(price), "");
        debug!(order = %id, side = ?side, price, volume, "Stop order registered");
        Some(id)
    }

    /// Fill an order completely at `price` and update the position
    fn execute(&mut self, id: OrderId, price: f64) {
        let time = self.time;
        let Some(order) = self.order_mut(id) else {
            return;
        };
        order.status = OrderStatus::Filled;
        order.fill_price = Some(price);
        order.updated_time = time;
        let side = order.side;
        let volume = order.volume;
        let reason = if order.comment.is_empty() {
            "Signal".to_string()
        } else {
            order.comment.clone()
        };

        self.apply_fill(side, volume, price, &reason);
        self.pending_fills.push(Fill {
            order_id: id,
            side,
            price,
            volume,
            time,
        });

        info!(
            time = %time.format("%Y-%m-%d %H:%M"),
            symbol = %self.security.symbol,
            "{:?} EXECUTED: Price={:.5}, Volume={:.2}, Position={:.2}",
            side,
            price,
            volume,
            self.position
        );
    }

    fn apply_fill(&mut self, side: Side, volume: f64, price: f64, reason: &str) {
        self.total_commission += price * volume * self.commission;
        let signed = side.sign() * volume;

        if self.position == 0.0 || self.position.signum() == signed.signum() {
            let was_flat = self.position == 0.0;
            let total = self.position.abs() + volume;
            self.avg_price = (self.position.abs() * self.avg_price + volume * price) / total;
            self.position += signed;
            if was_flat {
                self.entry_time = self.time;
                self.protection
                    .on_position_opened(side, self.avg_price, &self.security);
            }
            return;
        }

        // Reducing, closing or flipping
        let closing = volume.min(self.position.abs());
        let pos_side = if self.position > 0.0 {
            Side::Buy
        } else {
            Side::Sell
        };
        let pnl = (price - self.avg_price) * closing * pos_side.sign();
        let commission = (self.avg_price + price) * closing * self.commission;
        self.realized_pnl += pnl;
        self.trades.push(Trade {
            symbol: self.security.symbol.clone(),
            side: pos_side,
            entry_price: self.avg_price,
            exit_price: price,
            quantity: closing,
            entry_time: self.entry_time,
            exit_time: self.time,
            pnl,
            commission,
            net_pnl: pnl - commission,
            reason: reason.to_string(),
        });

        self.position += signed;
        let remaining = volume - closing;
        if self.position.abs() < EPSILON {
            self.position = 0.0;
            self.avg_price = 0.0;
            self.protection.clear();
        } else if remaining > EPSILON {
            self.avg_price = price;
            self.entry_time = self.time;
            self.protection.on_position_opened(side, price, &self.security);
        }
    }
}

impl StrategyContext for SimBroker {
    fn security(&self) -> &Security {
        &self.security
    }

    fn current_time(&self) -> DateTime<Utc> {
        self.time
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn position_price(&self) -> Option<f64> {
        (self.position != 0.0).then_some(self.avg_price)
    }

    fn portfolio_value(&self) -> f64 {
        self.equity()
    }

    fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    fn last_quote(&self) -> Option<Quote> {
        self.last_quote
    }

    fn buy_market(&mut self, volume: f64) -> Option<OrderId> {
        self.market_order(Side::Buy, volume)
    }

    fn sell_market(&mut self, volume: f64) -> Option<OrderId> {
        self.market_order(Side::Sell, volume)
    }

    fn buy_stop(&mut self, volume: f64, price: f64) -> Option<OrderId> {
        self.stop_order(Side::Buy, volume, price)
    }

    fn sell_stop(&mut self, volume: f64, price: f64) -> Option<OrderId> {
        self.stop_order(Side::Sell, volume, price)
    }

    fn cancel_order(&mut self, id: OrderId) -> bool {
        let time = self.time;
        match self.order_mut(id) {
            Some(order) if order.is_active() => {
                order.status = OrderStatus::Canceled;
                order.updated_time = time;
                debug!(order = %id, "Order canceled");
                true
            }
            _ => false,
        }
    }

    fn cancel_active_orders(&mut self) {
        let active: Vec<OrderId> = self
            .orders
            .iter()
            .filter(|o| o.is_active())
            .map(|o| o.id)
            .collect();
        for id in active {
            self.cancel_order(id);
        }
    }

    fn is_order_active(&self, id: OrderId) -> bool {
        usize::try_from(id.0)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.orders.get(i))
            .is_some_and(|o| o.is_active())
    }

    fn set_stop_loss(&mut self, price: f64) {
        if !self.protection.set_stop_loss(price) {
            debug!(price, "No open position, stop loss ignored");
        }
    }

    fn set_take_profit(&mut self, price: f64) {
        if !self.protection.set_take_profit(price) {
            debug!(price, "No open position, take profit ignored");
        }
    }

    fn clear_protection(&mut self) {
        self.protection.reset_levels();
    }

    fn start_protection(&mut self, settings: ProtectionSettings) {
        info!(?settings, "Protection started");
        self.protection.install(settings);
    }

    fn stop(&mut self, reason: &str) {
        if self.stopped.is_some() {
            return;
        }
        warn!(reason, "Strategy stopped");
        self.cancel_active_orders();
        self.stopped = Some(reason.to_string());
    }

    fn is_stopped(&self) -> bool {
        self.stopped.is_some()
    }
}
