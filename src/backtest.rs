//! Backtesting engine
//!
//! Replays candle series and level-1 quotes through a [`SimBroker`] in
//! completion-time order and computes performance metrics.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::broker::SimBroker;
use crate::data;
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Config, Order, PerformanceMetrics, Quote, Timeframe, Trade};

/// Rounds of fill dispatch per event before the rest is dropped
const MAX_DISPATCH_DEPTH: usize = 8;

/// Candle series keyed by timeframe plus optional level-1 quotes
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub candles: BTreeMap<Timeframe, Vec<Candle>>,
    pub quotes: Vec<Quote>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candles(mut self, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.candles.insert(timeframe, candles);
        self
    }

    pub fn with_quotes(mut self, quotes: Vec<Quote>) -> Self {
        self.quotes = quotes;
        self
    }

    /// Load everything the subscriptions ask for from `config.backtest.data_dir`.
    /// Without a quote file, quotes are synthesized from the primary candles.
    pub fn load(
        config: &Config,
        subscriptions: &[Subscription],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let data_dir = Path::new(&config.backtest.data_dir);
        let symbol = &config.security.symbol;
        let timeframes: Vec<Timeframe> = subscriptions
            .iter()
            .filter_map(|s| match s {
                Subscription::Candles(tf) => Some(*tf),
                Subscription::Level1 => None,
            })
            .collect();
        let primary = *timeframes
            .first()
            .context("Strategy does not subscribe to any candle series")?;

        let mut candles = data::load_timeframes(data_dir, symbol, &timeframes)?;
        for series in candles.values_mut() {
            *series = data::filter_candles_by_date(std::mem::take(series), start, end);
        }

        let mut quotes = Vec::new();
        if subscriptions.contains(&Subscription::Level1) {
            let path = data::quote_path(data_dir, symbol);
            quotes = if path.exists() {
                let loaded = data::load_quotes(&path)?;
                info!("Loaded {} quotes for {}", loaded.len(), symbol);
                data::filter_quotes_by_date(loaded, start, end)
            } else {
                info!(
                    spread_pips = config.backtest.synthetic_spread_pips,
                    "No quote file, synthesizing quotes from {} candles", primary
                );
                data::synthesize_quotes(
                    candles.get(&primary).map(Vec::as_slice).unwrap_or_default(),
                    primary,
                    &config.security,
                    config.backtest.synthetic_spread_pips,
                )
            };
        }

        Ok(Self { candles, quotes })
    }
}

enum Event<'a> {
    Quote(&'a Quote),
    Candle(Timeframe, &'a Candle),
}

/// Backtest engine
pub struct Backtester {
    config: Config,
    strategy: Box<dyn Strategy>,
}

impl Backtester {
    pub fn new(config: Config, strategy: Box<dyn Strategy>) -> Self {
        Backtester { config, strategy }
    }

    /// Run the strategy over `data`
    pub fn run(&mut self, data: &MarketData) -> BacktestResult {
        let subscriptions = self.strategy.subscriptions();
        let Some(primary) = subscriptions.iter().find_map(|s| match s {
            Subscription::Candles(tf) => Some(*tf),
            Subscription::Level1 => None,
        }) else {
            error!(strategy = self.strategy.name(), "Strategy has no candle subscription");
            return BacktestResult::default();
        };
        if data.candles.get(&primary).map_or(true, Vec::is_empty) {
            error!("No {} candles available for backtesting", primary);
            return BacktestResult::default();
        }

        let events = merge_events(data, &subscriptions);
        let mut broker = SimBroker::new(self.config.security.clone(), &self.config.backtest);
        let mut equity_curve = Vec::new();

        info!(
            strategy = self.strategy.name(),
            symbol = %self.config.security.symbol,
            events = events.len(),
            "Backtest started"
        );
        self.strategy.on_start(&mut broker);
        dispatch(self.strategy.as_mut(), &mut broker);

        for (time, event) in &events {
            if broker.is_stopped() {
                break;
            }
            broker.set_time(*time);
            match event {
                Event::Quote(quote) => {
                    broker.process_quote(quote, |b| dispatch(self.strategy.as_mut(), b));
                    dispatch(self.strategy.as_mut(), &mut broker);
                    self.strategy.on_level1(&mut broker, quote);
                }
                Event::Candle(timeframe, candle) => {
                    if *timeframe == primary {
                        broker.process_candle(candle, |b| dispatch(self.strategy.as_mut(), b));
                        dispatch(self.strategy.as_mut(), &mut broker);
                    }
                    self.strategy.on_candle(&mut broker, *timeframe, candle);
                }
            }
            dispatch(self.strategy.as_mut(), &mut broker);

            if matches!(event, Event::Candle(tf, _) if *tf == primary) {
                equity_curve.push((*time, broker.equity()));
            }
        }

        if let Some(reason) = broker.stop_reason() {
            info!(reason, "Strategy stopped before the end of data");
        }
        self.strategy.on_stop(&mut broker);
        broker.liquidate("End of backtest");
        let dropped = broker.drain_fills().len();
        if dropped > 0 {
            debug!(fills = dropped, "Final liquidation fills not dispatched");
        }
        if let Some(&(time, _)) = equity_curve.last() {
            equity_curve.push((time, broker.equity()));
        }

        let trades = broker.trades().to_vec();
        let metrics = calculate_metrics(
            &trades,
            &equity_curve,
            self.config.backtest.initial_capital,
            primary,
            broker.total_commission(),
        );

        BacktestResult {
            trades,
            equity_curve,
            metrics,
            orders: broker.orders().to_vec(),
            stop_reason: broker.stop_reason().map(str::to_string),
        }
    }
}

/// Deliver fills and rejections caused by the last callback
pub(crate) fn dispatch(strategy: &mut dyn Strategy, broker: &mut SimBroker) {
    for _ in 0..MAX_DISPATCH_DEPTH {
        let failed = broker.drain_failed_orders();
        let fills = broker.drain_fills();
        if failed.is_empty() && fills.is_empty() {
            return;
        }
        for order in &failed {
            strategy.on_order_failed(order);
        }
        for fill in &fills {
            strategy.on_own_trade(broker, fill);
        }
    }
    let failed = broker.drain_failed_orders().len();
    let fills = broker.drain_fills().len();
    if fills > 0 || failed > 0 {
        warn!(fills, failed, "Fill dispatch depth exceeded, events dropped");
    }
}

/// Subscribed events ordered by completion time: quotes first, then candles
/// from the finest timeframe to the coarsest
fn merge_events<'a>(
    data: &'a MarketData,
    subscriptions: &[Subscription],
) -> Vec<(DateTime<Utc>, Event<'a>)> {
    let mut keyed: Vec<(DateTime<Utc>, i64, Event<'a>)> = Vec::new();

    if subscriptions.contains(&Subscription::Level1) {
        keyed.extend(data.quotes.iter().map(|q| (q.time, 0, Event::Quote(q))));
    }
    for (timeframe, candles) in &data.candles {
        if !subscriptions.contains(&Subscription::Candles(*timeframe)) {
            continue;
        }
        keyed.extend(candles.iter().map(|c| {
            (
                c.close_time(*timeframe),
                timeframe.seconds(),
                Event::Candle(*timeframe, c),
            )
        }));
    }

    keyed.sort_by_key(|(time, rank, _)| (*time, *rank));
    keyed.into_iter().map(|(time, _, event)| (time, event)).collect()
}

pub fn calculate_metrics(
    trades: &[Trade],
    equity_curve: &[(DateTime<Utc>, f64)],
    initial_capital: f64,
    timeframe: Timeframe,
    total_commission: f64,
) -> PerformanceMetrics {
    let Some(&(_, final_capital)) = equity_curve.last() else {
        return PerformanceMetrics::default();
    };
    if trades.is_empty() {
        return PerformanceMetrics {
            total_commission,
            ..PerformanceMetrics::default()
        };
    }

    let total_return = ((final_capital - initial_capital) / initial_capital) * 100.0;

    let winning_trades: Vec<&Trade> = trades.iter().filter(|t| t.net_pnl > 0.0).collect();
    let losing_trades: Vec<&Trade> = trades.iter().filter(|t| t.net_pnl <= 0.0).collect();

    let win_rate = (winning_trades.len() as f64 / trades.len() as f64) * 100.0;

    let gross_profits: f64 = winning_trades.iter().map(|t| t.net_pnl).sum();
    let gross_losses: f64 = losing_trades.iter().map(|t| t.net_pnl.abs()).sum();

    let profit_factor = if gross_losses > 0.0 {
        gross_profits / gross_losses
    } else if gross_profits > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let avg_win = if !winning_trades.is_empty() {
        gross_profits / winning_trades.len() as f64
    } else {
        0.0
    };

    let avg_loss = if !losing_trades.is_empty() {
        gross_losses / losing_trades.len() as f64
    } else {
        0.0
    };

    let largest_win = winning_trades.iter().map(|t| t.net_pnl).fold(0.0, f64::max);
    let largest_loss = losing_trades.iter().map(|t| t.net_pnl).fold(0.0, f64::min);

    let mut peak = initial_capital;
    let mut max_dd = 0.0;
    for (_, equity) in equity_curve {
        if *equity > peak {
            peak = *equity;
        }
        let dd = (peak - equity) / peak;
        if dd > max_dd {
            max_dd = dd;
        }
    }

    // Per-bar returns annualised by the bar count of the primary timeframe
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter(|w| w[0].1 != 0.0)
        .map(|w| (w[1].1 - w[0].1) / w[0].1)
        .collect();

    let sharpe_ratio = if returns.len() > 1 {
        let mean_return = returns.iter().mean();
        let std_dev = returns.iter().std_dev();
        if std_dev > 0.0 && std_dev.is_finite() {
            mean_return / std_dev * timeframe.bars_per_year().sqrt()
        } else {
            0.0
        }
    } else {
        0.0
    };

    let calmar_ratio = if max_dd > 0.0 {
        (total_return / 100.0) / max_dd
    } else {
        0.0
    };

    PerformanceMetrics {
        total_return,
        sharpe_ratio,
        calmar_ratio,
        max_drawdown: max_dd * 100.0,
        win_rate,
        profit_factor,
        total_trades: trades.len(),
        winning_trades: winning_trades.len(),
        losing_trades: losing_trades.len(),
        avg_win,
        avg_loss,
        largest_win,
        largest_loss,
        total_commission,
    }
}

#[derive(Debug, Default)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
    pub metrics: PerformanceMetrics,
    pub orders: Vec<Order>,
    /// Set when the strategy stopped itself before the data ran out
    pub stop_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fill, Side, Symbol};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Mutex};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn series(timeframe: Timeframe, closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new_unchecked(
                    t0() + timeframe.duration() * i as i32,
                    c,
                    c + 0.0005,
                    c - 0.0005,
                    c,
                    1.0,
                )
            })
            .collect()
    }

    /// Records event order; buys on the first primary candle, stops after `stop_after`
    struct Recorder {
        subscriptions: Vec<Subscription>,
        log: Arc<Mutex<Vec<String>>>,
        primary_seen: usize,
        stop_after: Option<usize>,
    }

    impl Strategy for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn subscriptions(&self) -> Vec<Subscription> {
            self.subscriptions.clone()
        }

        fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, _candle: &Candle) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}@{}", timeframe, ctx.current_time().format("%H:%M")));
            if timeframe != Timeframe::hours(1) {
                return;
            }
            self.primary_seen += 1;
            if self.primary_seen == 1 {
                ctx.buy_market(1.0);
            }
            if Some(self.primary_seen) == self.stop_after {
                ctx.stop("done");
            }
        }

        fn on_level1(&mut self, ctx: &mut dyn StrategyContext, _quote: &Quote) {
            self.log
                .lock()
                .unwrap()
                .push(format!("quote@{}", ctx.current_time().format("%H:%M")));
        }

        fn on_own_trade(&mut self, _ctx: &mut dyn StrategyContext, fill: &Fill) {
            self.log.lock().unwrap().push(format!("fill {:?}", fill.side));
        }
    }

    fn recorder(subscriptions: Vec<Subscription>, stop_after: Option<usize>) -> (Recorder, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Recorder {
                subscriptions,
                log: Arc::clone(&log),
                primary_seen: 0,
                stop_after,
            },
            log,
        )
    }

    /// Answers every fill with an opposite market order
    struct PingPong;

    impl Strategy for PingPong {
        fn name(&self) -> &'static str {
            "ping_pong"
        }

        fn subscriptions(&self) -> Vec<Subscription> {
            vec![Subscription::Candles(Timeframe::hours(1))]
        }

        fn on_candle(&mut self, _ctx: &mut dyn StrategyContext, _timeframe: Timeframe, _candle: &Candle) {}

        fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, fill: &Fill) {
            match fill.side {
                Side::Buy => ctx.sell_market(1.0),
                Side::Sell => ctx.buy_market(1.0),
            };
        }
    }

    #[test]
    fn test_dispatch_depth_bounds_fill_chains() {
        let config = Config::default();
        let mut broker = SimBroker::new(config.security.clone(), &config.backtest);
        broker.set_time(t0() + Duration::hours(1));
        broker.process_candle(&series(Timeframe::hours(1), &[1.10])[0], |_| {});
        broker.buy_market(1.0);

        let mut strategy = PingPong;
        dispatch(&mut strategy, &mut broker);
        assert!(broker.drain_fills().is_empty());
        assert!(broker.drain_failed_orders().is_empty());
        assert_eq!(broker.orders().len(), MAX_DISPATCH_DEPTH + 1);
    }

    #[test]
    fn test_events_merged_by_completion_time() {
        let h1 = Timeframe::hours(1);
        let h2 = Timeframe::hours(2);
        let (strategy, log) = recorder(
            vec![
                Subscription::Candles(h1),
                Subscription::Candles(h2),
                Subscription::Level1,
            ],
            None,
        );
        let data = MarketData::new()
            .with_candles(h1, series(h1, &[1.10, 1.11]))
            .with_candles(h2, series(h2, &[1.10]))
            .with_quotes(vec![Quote {
                time: t0() + Duration::hours(2),
                bid: 1.1099,
                ask: 1.1101,
            }]);

        let mut bt = Backtester::new(Config::default(), Box::new(strategy));
        bt.run(&data);

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec!["1h@01:00", "fill Buy", "quote@02:00", "1h@02:00", "2h@02:00"]
        );
    }

    #[test]
    fn test_open_position_closed_at_end() {
        let h1 = Timeframe::hours(1);
        let (strategy, _) = recorder(vec![Subscription::Candles(h1)], None);
        let data = MarketData::new().with_candles(h1, series(h1, &[1.1000, 1.1010, 1.1020]));

        let mut bt = Backtester::new(Config::default(), Box::new(strategy));
        let result = bt.run(&data);

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].reason, "End of backtest");
        assert_eq!(result.trades[0].side, Side::Buy);
        assert_relative_eq!(result.trades[0].pnl, 0.002, epsilon = 1e-9);
        assert_eq!(result.equity_curve.len(), 4);
        assert!(result.metrics.total_return > 0.0);
        assert_eq!(result.metrics.winning_trades, 1);
    }

    #[test]
    fn test_stop_ends_run_early() {
        let h1 = Timeframe::hours(1);
        let (strategy, log) = recorder(vec![Subscription::Candles(h1)], Some(2));
        let data = MarketData::new().with_candles(h1, series(h1, &[1.10, 1.11, 1.12, 1.13]));

        let mut bt = Backtester::new(Config::default(), Box::new(strategy));
        let result = bt.run(&data);

        assert_eq!(result.stop_reason.as_deref(), Some("done"));
        assert_eq!(log.lock().unwrap().iter().filter(|e| e.starts_with("1h")).count(), 2);
        assert_eq!(result.trades.len(), 1);
    }

    #[test]
    fn test_missing_primary_series_gives_empty_result() {
        let (strategy, _) = recorder(vec![Subscription::Candles(Timeframe::hours(1))], None);
        let data = MarketData::new().with_candles(Timeframe::hours(4), series(Timeframe::hours(4), &[1.0]));
        let result = Backtester::new(Config::default(), Box::new(strategy)).run(&data);
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
    }

    #[test]
    fn test_metrics_win_loss_statistics() {
        let trade = |net_pnl: f64| Trade {
            symbol: Symbol::new("EURUSD"),
            side: Side::Buy,
            entry_price: 1.0,
            exit_price: 1.0,
            quantity: 1.0,
            entry_time: t0(),
            exit_time: t0(),
            pnl: net_pnl,
            commission: 0.0,
            net_pnl,
            reason: "Signal".to_string(),
        };
        let trades = vec![trade(200.0), trade(-100.0), trade(100.0)];
        let equity = vec![
            (t0(), 10_000.0),
            (t0() + Duration::hours(1), 10_200.0),
            (t0() + Duration::hours(2), 10_100.0),
            (t0() + Duration::hours(3), 10_200.0),
        ];
        let m = calculate_metrics(&trades, &equity, 10_000.0, Timeframe::hours(1), 1.5);

        assert_relative_eq!(m.total_return, 2.0, epsilon = 1e-9);
        assert_relative_eq!(m.win_rate, 200.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.profit_factor, 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.avg_win, 150.0, epsilon = 1e-9);
        assert_relative_eq!(m.largest_loss, -100.0, epsilon = 1e-9);
        assert_relative_eq!(m.max_drawdown, 100.0 / 10_200.0 * 100.0, epsilon = 1e-9);
        assert_eq!(m.total_commission, 1.5);
        assert!(m.sharpe_ratio > 0.0);
    }

    #[test]
    fn test_load_synthesizes_quotes_without_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("EURUSD_1h.csv"),
            "datetime,open,high,low,close,volume\n\
             2024-01-01 00:00:00,1.1,1.1010,1.0990,1.1005,1\n\
             2024-01-01 01:00:00,1.1005,1.1020,1.1000,1.1015,1\n",
        )
        .unwrap();
        let mut config = Config::default();
        config.backtest.data_dir = dir.path().display().to_string();

        let data = MarketData::load(
            &config,
            &[Subscription::Candles(Timeframe::hours(1)), Subscription::Level1],
            None,
            None,
        )
        .unwrap();
        assert_eq!(data.candles[&Timeframe::hours(1)].len(), 2);
        assert_eq!(data.quotes.len(), 2);
        assert_eq!(data.quotes[0].time, t0() + Duration::hours(1));
    }
}
