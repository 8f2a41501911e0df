//! Backtest command implementation

use anyhow::{Context, Result};
use ea_strategies::backtest::{Backtester, MarketData};
use ea_strategies::strategies::create_strategy;
use ea_strategies::{data, Config};
use tracing::{debug, info};

pub fn run(
    config_path: String,
    strategy_override: Option<String>,
    capital_override: Option<f64>,
    start_override: Option<String>,
    end_override: Option<String>,
    trades_path: Option<String>,
) -> Result<()> {
    info!("Starting backtest");

    let mut config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    if let Some(strategy) = strategy_override {
        info!("Overriding strategy to: {}", strategy);
        config.strategy_name = strategy;
    }

    if let Some(capital) = capital_override {
        info!("Overriding initial capital to: {:.2}", capital);
        config.backtest.initial_capital = capital;
    }

    let start = start_override.as_deref().map(data::parse_date).transpose()?;
    let end = end_override.as_deref().map(data::parse_date).transpose()?;

    info!("Creating strategy: {}", config.strategy_name);
    let strategy = create_strategy(&config)
        .with_context(|| format!("Failed to create strategy {}", config.strategy_name))?;
    let subscriptions = strategy.subscriptions();
    debug!(?subscriptions, "Strategy subscriptions");

    info!("Loading data from: {}", config.backtest.data_dir);
    let market_data = MarketData::load(&config, &subscriptions, start, end)?;

    let mut backtester = Backtester::new(config.clone(), strategy);

    info!("Running backtest...");
    let result = backtester.run(&market_data);

    println!("\n{}", "=".repeat(60));
    println!(
        "BACKTEST RESULTS: {} on {}",
        config.strategy_name, config.security.symbol
    );
    println!("{}", "=".repeat(60));
    println!("Initial Capital:    {:.2}", config.backtest.initial_capital);
    println!("Total Return:       {:.2}%", result.metrics.total_return);
    println!("Sharpe Ratio:       {:.2}", result.metrics.sharpe_ratio);
    println!("Calmar Ratio:       {:.2}", result.metrics.calmar_ratio);
    println!("Max Drawdown:       {:.2}%", result.metrics.max_drawdown);
    println!("Win Rate:           {:.2}%", result.metrics.win_rate);
    println!("Profit Factor:      {:.2}", result.metrics.profit_factor);
    println!("Total Trades:       {}", result.metrics.total_trades);
    println!("Winning Trades:     {}", result.metrics.winning_trades);
    println!("Losing Trades:      {}", result.metrics.losing_trades);
    println!("Average Win:        {:.5}", result.metrics.avg_win);
    println!("Average Loss:       {:.5}", result.metrics.avg_loss);
    println!("Largest Win:        {:.5}", result.metrics.largest_win);
    println!("Largest Loss:       {:.5}", result.metrics.largest_loss);
    println!("Commission:         {:.5}", result.metrics.total_commission);
    println!("Orders:             {}", result.orders.len());
    if let Some(reason) = &result.stop_reason {
        println!("Stopped:            {}", reason);
    }
    println!("{}", "=".repeat(60));

    if let Some(path) = trades_path {
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path))?;
        for trade in &result.trades {
            writer.serialize(trade)?;
        }
        writer.flush()?;
        info!("Wrote {} trades to {}", result.trades.len(), path);
    }

    info!("Backtest completed successfully");

    Ok(())
}
