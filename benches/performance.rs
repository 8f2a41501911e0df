//! Performance benchmarks for ea-strategies
//!
//! Run with: `cargo bench`
//! View results: `open target/criterion/report/index.html`

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use ea_strategies::backtest::{Backtester, MarketData};
use ea_strategies::indicators::{Atr, Bollinger, Ema, Rsi, Stochastic};
use ea_strategies::strategies::create_strategy;
use ea_strategies::{Candle, Config, Timeframe};

fn candles(count: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut prev = 1.1;
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = 1.1 + 0.005 * (x / 10.0).sin() + 0.002 * (x / 3.0).cos();
            let open = prev;
            prev = close;
            Candle::new_unchecked(
                start + Duration::hours(i as i64),
                open,
                open.max(close) + 0.0003,
                open.min(close) - 0.0003,
                close,
                100.0,
            )
        })
        .collect()
}

fn benchmark_indicators(c: &mut Criterion) {
    let data = candles(10_000);

    c.bench_function("ema_rsi_10k", |b| {
        b.iter(|| {
            let mut ema = Ema::new(20).unwrap();
            let mut rsi = Rsi::new(14).unwrap();
            for candle in &data {
                black_box(ema.next(candle.close));
                black_box(rsi.next(candle.close));
            }
        })
    });

    c.bench_function("atr_bollinger_stochastic_10k", |b| {
        b.iter(|| {
            let mut atr = Atr::new(14).unwrap();
            let mut bb = Bollinger::new(20, 2.0).unwrap();
            let mut stoch = Stochastic::new(5, 3, 3).unwrap();
            for candle in &data {
                black_box(atr.next(candle));
                black_box(bb.next(candle.close));
                black_box(stoch.next(candle));
            }
        })
    });
}

fn benchmark_backtest(c: &mut Criterion) {
    let market = MarketData::new().with_candles(Timeframe::hours(1), candles(5_000));
    let mut config = Config {
        strategy_name: "macd_sample".to_string(),
        ..Config::default()
    };
    config.set_param("timeframe", json!("1h"));

    c.bench_function("backtest_macd_sample_5k", |b| {
        b.iter(|| {
            let strategy = create_strategy(&config).unwrap();
            let mut backtester = Backtester::new(config.clone(), strategy);
            black_box(backtester.run(&market))
        })
    });
}

criterion_group!(benches, benchmark_indicators, benchmark_backtest);
criterion_main!(benches);
