//! Optimize command implementation with progress tracking

use anyhow::{Context, Result};
use ea_strategies::backtest::MarketData;
use ea_strategies::optimizer::{apply_overrides, format_params, OptimizationResult, Optimizer};
use ea_strategies::strategies::create_strategy;
use ea_strategies::{data, Config, Subscription};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

#[allow(clippy::too_many_arguments)]
pub fn run(
    config_path: String,
    strategy_override: Option<String>,
    sort_by: String,
    top: usize,
    overrides: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    sequential: bool,
) -> Result<()> {
    info!("Starting optimization");

    let mut config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    if let Some(strategy) = strategy_override {
        info!("Overriding strategy to: {}", strategy);
        config.strategy_name = strategy;
        config.grid = None;
    }

    for rejected in apply_overrides(&mut config, &overrides) {
        warn!("Ignoring malformed override: {}", rejected);
    }

    let start = start.as_deref().map(data::parse_date).transpose()?;
    let end = end.as_deref().map(data::parse_date).transpose()?;

    let optimizer = Optimizer::new(config.clone());
    let keys: Vec<String> = optimizer.param_grid()?.into_keys().collect();
    let configs = optimizer.generate_configs()?;
    info!("Strategy: {}", config.strategy_name);
    info!("Parameter combinations: {}", configs.len());

    // Combinations may subscribe to different series (e.g. a grid over
    // timeframes), so data is loaded once per distinct subscription set
    let mut groups: Vec<(Vec<Subscription>, Vec<Config>)> = Vec::new();
    let mut skipped = 0usize;
    for cfg in configs {
        let subscriptions = match create_strategy(&cfg) {
            Ok(strategy) => strategy.subscriptions(),
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        match groups.iter_mut().find(|(subs, _)| *subs == subscriptions) {
            Some((_, group)) => group.push(cfg),
            None => groups.push((subscriptions, vec![cfg])),
        }
    }
    if skipped > 0 {
        info!("Skipped {} invalid parameter combinations", skipped);
    }

    let total_runs: usize = groups.iter().map(|(_, g)| g.len()).sum();
    if total_runs == 0 {
        info!("No valid runs found. Check the parameter grid.");
        println!("No valid parameter combinations to test.");
        return Ok(());
    }

    println!("\n{}", "=".repeat(70));
    println!("OPTIMIZATION SUMMARY");
    println!("{}", "=".repeat(70));
    println!("  Strategy:      {}", config.strategy_name);
    println!("  Symbol:        {}", config.security.symbol);
    println!("  Parameters:    {}", keys.join(", "));
    println!("  Total tests:   {}", total_runs);
    println!("  Mode:          {}", if sequential { "sequential" } else { "parallel" });
    println!("{}\n", "=".repeat(70));

    let pb = ProgressBar::new(total_runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec:.2}] {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█░ "),
    );

    let mut all_results: Vec<OptimizationResult> = Vec::new();
    for (subscriptions, group) in &groups {
        let market_data = MarketData::load(&config, subscriptions, start, end)?;
        let results = if sequential {
            let results = optimizer.optimize_sequential(&market_data, group, &keys);
            pb.inc(group.len() as u64);
            results
        } else {
            optimizer.optimize(&market_data, group, &keys, &pb)
        };
        all_results.extend(results);
        let valid = all_results.iter().filter(|r| r.total_trades > 0).count();
        pb.set_message(format!("{} with trades", valid));
    }
    pb.finish();
    println!();

    if all_results.is_empty() {
        info!("No valid results found.");
        return Ok(());
    }

    Optimizer::sort_results(&mut all_results, &sort_by);
    info!("Total results: {}, sorted by: {}", all_results.len(), sort_by);

    let display_count = top.min(all_results.len());
    println!("\n{}", "=".repeat(110));
    println!("TOP {} OPTIMIZATION RESULTS (sorted by {})", display_count, sort_by);
    println!("{}", "=".repeat(110));
    println!(
        "{:<4} {:>7} {:>9} {:>8} {:>8} {:>7} {:>6} | Parameters",
        "Rank", "Sharpe", "Return%", "MaxDD%", "WinR%", "PF", "Trades"
    );
    println!("{}", "-".repeat(110));

    for (i, result) in all_results.iter().take(top).enumerate() {
        println!(
            "{:<4} {:>7.2} {:>9.2} {:>8.2} {:>8.2} {:>7.2} {:>6} | {}",
            i + 1,
            result.sharpe_ratio,
            result.total_return,
            result.max_drawdown,
            result.win_rate,
            result.profit_factor,
            result.total_trades,
            format_params(&result.params)
        );
    }
    println!("{}", "=".repeat(110));

    info!("Optimization completed successfully");

    Ok(())
}
