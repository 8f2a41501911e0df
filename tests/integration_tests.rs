//! Integration tests for the EA strategy catalog
//!
//! Every registered strategy is run end to end through the backtester on
//! synthetic data; the remaining tests cover the public building blocks.

use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use std::io::Write;

use ea_strategies::backtest::{Backtester, MarketData};
use ea_strategies::indicators::{Ema, Rsi, Sma, Stochastic};
use ea_strategies::optimizer::Optimizer;
use ea_strategies::strategies::{available_strategies, create_strategy, strategy_info};
use ea_strategies::{data, Candle, Config, Security, Side, Subscription, Timeframe};

// =============================================================================
// Test Utilities
// =============================================================================

/// Oscillating EURUSD-like hourly series with a slow drift
fn generate_wave_candles(count: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut prev = 1.1000;
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = 1.1000 + 0.0060 * (x / 12.0).sin() + 0.0020 * (x / 3.7).cos() + x * 0.00001;
            let open = prev;
            prev = close;
            Candle::new_unchecked(
                start + Duration::hours(i as i64),
                open,
                open.max(close) + 0.0004,
                open.min(close) - 0.0004,
                close,
                100.0 + (i % 7) as f64,
            )
        })
        .collect()
}

/// Aggregate hourly candles into `factor`-hour candles
fn aggregate(candles: &[Candle], factor: usize) -> Vec<Candle> {
    candles
        .chunks(factor)
        .filter(|chunk| chunk.len() == factor)
        .map(|chunk| {
            Candle::new_unchecked(
                chunk[0].datetime,
                chunk[0].open,
                chunk.iter().map(|c| c.high).fold(f64::MIN, f64::max),
                chunk.iter().map(|c| c.low).fold(f64::MAX, f64::min),
                chunk[chunk.len() - 1].close,
                chunk.iter().map(|c| c.volume).sum(),
            )
        })
        .collect()
}

fn default_config(name: &str) -> Config {
    let info = strategy_info(name).unwrap();
    let mut config = Config {
        strategy_name: name.to_string(),
        ..Config::default()
    };
    for (key, value) in (info.defaults)() {
        config.set_param(&key, value);
    }
    config.set_param("timeframe", json!("1h"));
    if name == "order_execution" {
        config.set_param("snapshot_path", json!(""));
    }
    config
}

fn market_data_for(subscriptions: &[Subscription], hourly: &[Candle]) -> MarketData {
    let mut data = MarketData::new();
    for sub in subscriptions {
        if let Subscription::Candles(tf) = sub {
            let factor = (tf.seconds() / 3600).max(1) as usize;
            data = data.with_candles(*tf, aggregate(hourly, factor));
        }
    }
    if subscriptions.contains(&Subscription::Level1) {
        let quotes = data::synthesize_quotes(hourly, Timeframe::hours(1), &Security::default(), 1.0);
        data = data.with_quotes(quotes);
    }
    data
}

// =============================================================================
// Strategy catalog
// =============================================================================

#[test]
fn test_every_strategy_runs_end_to_end() {
    let hourly = generate_wave_candles(800);

    for name in available_strategies() {
        let config = default_config(name);
        let strategy = create_strategy(&config).unwrap();
        let data = market_data_for(&strategy.subscriptions(), &hourly);

        let mut backtester = Backtester::new(config.clone(), strategy);
        let result = backtester.run(&data);

        assert!(!result.equity_curve.is_empty(), "{}: empty equity curve", name);
        assert!(result.metrics.max_drawdown >= 0.0, "{}", name);

        // Every closed trade is accounted for in the final equity
        let pnl: f64 = result.trades.iter().map(|t| t.pnl).sum();
        let final_equity = result.equity_curve.last().unwrap().1;
        assert_relative_eq!(
            final_equity,
            config.backtest.initial_capital + pnl - result.metrics.total_commission,
            epsilon = 1e-6
        );
        assert_eq!(result.metrics.total_trades, result.trades.len(), "{}", name);
    }
}

#[test]
fn test_trend_strategies_trade_on_waves() {
    let hourly = generate_wave_candles(800);
    for name in ["pema_cross", "xhull_trend", "stochastic_level", "heikin_ashi_smoothed"] {
        let config = default_config(name);
        let strategy = create_strategy(&config).unwrap();
        let data = market_data_for(&strategy.subscriptions(), &hourly);
        let result = Backtester::new(config, strategy).run(&data);
        assert!(!result.orders.is_empty(), "{} placed no orders", name);
    }
}

#[test]
fn test_williams_donchian_with_trend_timeframe() {
    let hourly = generate_wave_candles(800);
    let mut config = default_config("williams_donchian");
    config.set_param("trend_timeframe", json!("4h"));

    let strategy = create_strategy(&config).unwrap();
    let subscriptions = strategy.subscriptions();
    assert!(subscriptions.contains(&Subscription::Candles(Timeframe::hours(4))));

    let data = market_data_for(&subscriptions, &hourly);
    let result = Backtester::new(config, strategy).run(&data);
    assert_eq!(result.equity_curve.len(), 801);
}

#[test]
fn test_commission_reduces_equity() {
    let hourly = generate_wave_candles(500);
    let mut config = default_config("ma_rsi");
    let strategy = create_strategy(&config).unwrap();
    let data = market_data_for(&strategy.subscriptions(), &hourly);
    let free = Backtester::new(config.clone(), strategy).run(&data);

    config.backtest.commission = 0.0005;
    let strategy = create_strategy(&config).unwrap();
    let charged = Backtester::new(config, strategy).run(&data);

    if !free.trades.is_empty() {
        assert!(charged.metrics.total_commission > 0.0);
        assert!(charged.equity_curve.last().unwrap().1 < free.equity_curve.last().unwrap().1);
    }
}

#[test]
fn test_order_execution_replays_file() {
    let dir = tempfile::tempdir().unwrap();
    let instructions = dir.path().join("instructions.csv");
    let snapshot = dir.path().join("out").join("snapshot.csv");
    let mut file = std::fs::File::create(&instructions).unwrap();
    writeln!(file, "symbol,timestamp,amount,stop,take,id").unwrap();
    writeln!(file, "EURUSD,2024-01-01 05:00:00,1.0,,,open").unwrap();
    writeln!(file, "EURUSD,2024-01-01 10:00:00,0,,,close").unwrap();
    writeln!(file, "EURUSD,2024-01-01 12:00:00,-0.5,1.2000,,short").unwrap();
    drop(file);

    let mut config = default_config("order_execution");
    config.set_param("instructions_path", json!(instructions.display().to_string()));
    config.set_param("snapshot_path", json!(snapshot.display().to_string()));

    let hourly = generate_wave_candles(24);
    let strategy = create_strategy(&config).unwrap();
    let data = market_data_for(&strategy.subscriptions(), &hourly);
    let result = Backtester::new(config, strategy).run(&data);

    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].side, Side::Buy);
    assert_eq!(result.trades[1].side, Side::Sell);
    assert_eq!(result.trades[1].reason, "End of backtest");

    let rows = std::fs::read_to_string(&snapshot).unwrap();
    assert_eq!(rows.lines().count(), 25);
}

// =============================================================================
// Configuration and data
// =============================================================================

#[test]
fn test_config_file_round_trip_into_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "strategy_name": "macd_sample",
            "strategy": { "timeframe": "4h", "take_profit_pips": 30 },
            "security": { "symbol": "GBPUSD" },
            "backtest": { "data_dir": "data", "initial_capital": 5000 }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.timeframe().unwrap(), Timeframe::hours(4));
    assert_eq!(config.security.symbol.as_str(), "GBPUSD");
    let strategy = create_strategy(&config).unwrap();
    assert_eq!(strategy.name(), "macd_sample");
    assert_eq!(strategy.subscriptions()[0], Subscription::Candles(Timeframe::hours(4)));
}

#[test]
fn test_invalid_parameters_rejected() {
    let mut config = default_config("ma_rsi");
    config.set_param("fast_period", json!(0));
    assert!(create_strategy(&config).is_err());

    let mut config = default_config("ma_rsi");
    config.strategy_name = "does_not_exist".to_string();
    assert!(create_strategy(&config).is_err());
}

#[test]
fn test_backtest_from_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("EURUSD_1h.csv")).unwrap();
    writeln!(file, "datetime,open,high,low,close,volume").unwrap();
    for c in generate_wave_candles(300) {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            c.datetime.format("%Y-%m-%d %H:%M:%S"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        )
        .unwrap();
    }
    drop(file);

    let mut config = default_config("spread_scalper");
    config.backtest.data_dir = dir.path().display().to_string();
    let strategy = create_strategy(&config).unwrap();
    let start = data::parse_date("2024-01-03").unwrap();
    let data = MarketData::load(&config, &strategy.subscriptions(), Some(start), None).unwrap();

    let candles = &data.candles[&Timeframe::hours(1)];
    assert_eq!(candles.len(), 300 - 48);
    assert_eq!(data.quotes.len(), candles.len());

    let result = Backtester::new(config, strategy).run(&data);
    assert_eq!(result.equity_curve.len(), candles.len() + 1);
}

#[test]
fn test_optimizer_runs_grid() {
    let hourly = generate_wave_candles(400);
    let mut config = default_config("ma_rsi");
    config.grid = Some(
        [
            ("fast_period".to_string(), vec![json!(5), json!(10)]),
            ("slow_period".to_string(), vec![json!(20), json!(30)]),
        ]
        .into_iter()
        .collect(),
    );
    let optimizer = Optimizer::new(config.clone());
    let configs = optimizer.generate_configs().unwrap();
    assert_eq!(configs.len(), 4);

    let strategy = create_strategy(&config).unwrap();
    let data = market_data_for(&strategy.subscriptions(), &hourly);
    let keys = vec!["fast_period".to_string(), "slow_period".to_string()];
    let mut results = optimizer.optimize_sequential(&data, &configs, &keys);
    assert_eq!(results.len(), 4);

    Optimizer::sort_results(&mut results, "return");
    assert!(results[0].total_return >= results[3].total_return);
    assert!(results.iter().all(|r| r.params.len() == 2));
}

// =============================================================================
// Indicators
// =============================================================================

#[test]
fn test_sma_and_ema_warmup() {
    let mut sma = Sma::new(3).unwrap();
    let out: Vec<_> = [10.0, 11.0, 12.0, 13.0].iter().map(|&v| sma.next(v)).collect();
    assert_eq!(out[1], None);
    assert_relative_eq!(out[2].unwrap(), 11.0);
    assert_relative_eq!(out[3].unwrap(), 12.0);

    let mut ema = Ema::new(3).unwrap();
    let mut last = None;
    for v in [10.0, 11.0, 12.0, 13.0, 14.0, 15.0] {
        last = ema.next(v);
    }
    let v = last.unwrap();
    assert!(v > 12.0 && v < 15.0);
}

#[test]
fn test_rsi_direction() {
    let mut up = Rsi::new(14).unwrap();
    let mut down = Rsi::new(14).unwrap();
    let mut last = (None, None);
    for i in 0..30 {
        last = (up.next(100.0 + i as f64), down.next(100.0 - i as f64));
    }
    assert!(last.0.unwrap() > 50.0);
    assert!(last.1.unwrap() < 50.0);
}

#[test]
fn test_stochastic_bounds() {
    let mut stoch = Stochastic::new(5, 3, 3).unwrap();
    for c in generate_wave_candles(60) {
        if let Some(v) = stoch.next(&c) {
            assert!((0.0..=100.0).contains(&v.k));
            assert!((0.0..=100.0).contains(&v.d));
        }
    }
}
