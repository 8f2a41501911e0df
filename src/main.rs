//! EA strategies - main entry point
//!
//! This binary provides three subcommands:
//! - backtest: Run a strategy over historical data
//! - optimize: Grid-search strategy parameters
//! - list: Show the registered strategies and their parameters

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ea-strategies")]
#[command(about = "Expert Advisor strategies with backtesting and optimization", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run strategy backtest
    Backtest {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/ma_rsi_eurusd_1h.json")]
        config: String,

        /// Strategy name (overrides config file)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Initial capital
        #[arg(long)]
        capital: Option<f64>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Write the closed trades to this CSV file
        #[arg(long)]
        trades: Option<String>,
    },

    /// Optimize strategy parameters
    Optimize {
        /// Path to base configuration file
        #[arg(short, long, default_value = "configs/ma_rsi_eurusd_1h.json")]
        config: String,

        /// Strategy name (overrides config file)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Sort results by metric (sharpe, calmar, return, win_rate, profit_factor)
        #[arg(long, default_value = "sharpe")]
        sort_by: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Grid override, repeatable. E.g. -O fast_period=5,8,13
        #[arg(short = 'O', long = "override")]
        overrides: Vec<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Run sequentially instead of parallel
        #[arg(long)]
        sequential: bool,
    },

    /// List available strategies
    List {
        /// Show the parameters of one strategy
        #[arg(short, long)]
        strategy: Option<String>,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Keep the console clean for the progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            config,
            strategy,
            capital,
            start,
            end,
            trades,
        } => {
            setup_logging(cli.verbose, "backtest", false)?;
            commands::backtest::run(config, strategy, capital, start, end, trades)
        }

        Commands::Optimize {
            config,
            strategy,
            sort_by,
            top,
            overrides,
            start,
            end,
            sequential,
        } => {
            setup_logging(cli.verbose, "optimize", true)?;
            commands::optimize::run(
                config, strategy, sort_by, top, overrides, start, end, sequential,
            )
        }

        Commands::List { strategy } => commands::list::run(strategy),
    }
}
