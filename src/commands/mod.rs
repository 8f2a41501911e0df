pub mod backtest;
pub mod list;
pub mod optimize;
