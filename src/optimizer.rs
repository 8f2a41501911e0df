//! Parameter optimization
//!
//! Grid search over strategy parameters. The grid comes from the `grid`
//! section of the config (or `-O name=v1,v2` overrides) and falls back to the
//! optimization ranges each strategy publishes with its [`ParamSpec`]s.
//! Combinations run in parallel with rayon.
//!
//! [`ParamSpec`]: crate::params::ParamSpec

use anyhow::{bail, Result};
use indicatif::ProgressBar;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::backtest::{Backtester, MarketData};
use crate::strategies::{create_strategy, strategy_info};
use crate::Config;

/// Upper bound on the number of combinations a single run may test
pub const MAX_COMBINATIONS: usize = 100_000;

/// Optimization result for a single parameter combination
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub params: HashMap<String, f64>,
    pub sharpe_ratio: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
}

/// Parameter values to test, keyed by parameter name (sorted for
/// deterministic ordering)
pub type ParamGrid = BTreeMap<String, Vec<serde_json::Value>>;

pub struct Optimizer {
    base_config: Config,
}

impl Optimizer {
    pub fn new(base_config: Config) -> Self {
        Optimizer { base_config }
    }

    /// Grid from the config, or from the strategy's optimization ranges
    pub fn param_grid(&self) -> Result<ParamGrid> {
        if let Some(grid) = self.base_config.grid.as_ref().filter(|g| !g.is_empty()) {
            return Ok(grid
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect());
        }

        let info = strategy_info(&self.base_config.strategy_name)?;
        Ok((info.params)()
            .into_iter()
            .filter_map(|spec| {
                let range = spec.optimize?;
                let values = range.values().into_iter().map(|v| spec.to_json(v)).collect();
                Some((spec.name.to_string(), values))
            })
            .collect())
    }

    /// Every combination of the grid applied to the base config
    pub fn generate_configs(&self) -> Result<Vec<Config>> {
        let grid = self.param_grid()?;
        if grid.is_empty() {
            return Ok(vec![self.base_config.clone()]);
        }

        let total: usize = grid.values().map(Vec::len).product();
        if total > MAX_COMBINATIONS {
            bail!(
                "{} parameter combinations exceed the limit of {}; narrow the grid with -O name=v1,v2",
                total,
                MAX_COMBINATIONS
            );
        }

        let configs = grid
            .values()
            .map(|values| values.iter())
            .multi_cartesian_product()
            .map(|combo| {
                let mut config = self.base_config.clone();
                for (key, value) in grid.keys().zip(combo) {
                    config.set_param(key, value.clone());
                }
                config
            })
            .collect();
        Ok(configs)
    }

    /// Run every config in parallel against shared data
    pub fn optimize(
        &self,
        data: &MarketData,
        configs: &[Config],
        keys: &[String],
        progress_bar: &ProgressBar,
    ) -> Vec<OptimizationResult> {
        info!("Testing {} parameter combinations", configs.len());

        configs
            .par_iter()
            .filter_map(|config| {
                let result = evaluate(config, data, keys);
                progress_bar.inc(1);
                result
            })
            .collect()
    }

    /// Run optimization sequentially (for debugging)
    pub fn optimize_sequential(
        &self,
        data: &MarketData,
        configs: &[Config],
        keys: &[String],
    ) -> Vec<OptimizationResult> {
        info!(
            "Testing {} parameter combinations sequentially",
            configs.len()
        );

        configs
            .iter()
            .filter_map(|config| evaluate(config, data, keys))
            .collect()
    }

    /// Sort optimization results by specified metric, best first
    pub fn sort_results(results: &mut [OptimizationResult], sort_by: &str) {
        results.sort_by(|a, b| {
            let (va, vb) = match sort_by {
                "calmar" => (a.calmar_ratio, b.calmar_ratio),
                "return" => (a.total_return, b.total_return),
                "win_rate" => (a.win_rate, b.win_rate),
                "profit_factor" => (a.profit_factor, b.profit_factor),
                _ => (a.sharpe_ratio, b.sharpe_ratio),
            };
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Backtest one config; combinations the strategy rejects are skipped
fn evaluate(config: &Config, data: &MarketData, keys: &[String]) -> Option<OptimizationResult> {
    let strategy = match create_strategy(config) {
        Ok(strategy) => strategy,
        Err(e) => {
            debug!(params = %format_params(&extract_params(config, keys)), error = %e, "Combination skipped");
            return None;
        }
    };
    let mut backtester = Backtester::new(config.clone(), strategy);
    let result = backtester.run(data);

    Some(OptimizationResult {
        params: extract_params(config, keys),
        sharpe_ratio: result.metrics.sharpe_ratio,
        total_return: result.metrics.total_return,
        max_drawdown: result.metrics.max_drawdown,
        win_rate: result.metrics.win_rate,
        total_trades: result.metrics.total_trades,
        calmar_ratio: result.metrics.calmar_ratio,
        profit_factor: result.metrics.profit_factor,
    })
}

/// Parse CLI override into grid format
/// Format: "param=val1,val2,val3"
pub fn parse_grid_override(s: &str) -> Option<(String, Vec<serde_json::Value>)> {
    let (key, raw) = s.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let values: Vec<serde_json::Value> = raw
        .split(',')
        .filter_map(|v| {
            let v = v.trim();
            if let Ok(n) = v.parse::<i64>() {
                Some(serde_json::json!(n))
            } else if let Ok(n) = v.parse::<f64>() {
                Some(serde_json::json!(n))
            } else if v == "true" || v == "false" {
                Some(serde_json::json!(v == "true"))
            } else if !v.is_empty() {
                Some(serde_json::json!(v))
            } else {
                None
            }
        })
        .collect();

    (!values.is_empty()).then(|| (key.to_string(), values))
}

/// Apply CLI overrides to the config grid; returns the overrides that did not parse
pub fn apply_overrides(config: &mut Config, overrides: &[String]) -> Vec<String> {
    let mut rejected = Vec::new();
    for raw in overrides {
        match parse_grid_override(raw) {
            Some((key, values)) => {
                config
                    .grid
                    .get_or_insert_with(HashMap::new)
                    .insert(key, values);
            }
            None => rejected.push(raw.clone()),
        }
    }
    rejected
}

/// Numeric values of the given strategy params, for reporting
pub fn extract_params(config: &Config, keys: &[String]) -> HashMap<String, f64> {
    let mut params = HashMap::new();
    let Some(obj) = config.strategy.as_object() else {
        return params;
    };
    for key in keys {
        let value = match obj.get(key) {
            Some(serde_json::Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            Some(v) => v.as_f64(),
            None => None,
        };
        if let Some(n) = value {
            params.insert(key.clone(), n);
        }
    }
    params
}

/// Format params for display
pub fn format_params(params: &HashMap<String, f64>) -> String {
    params
        .iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(k, v)| {
            if v.fract() == 0.0 && v.abs() < 1e6 {
                format!("{}={}", k, *v as i64)
            } else {
                format!("{}={:.4}", k, v)
            }
        })
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(sharpe: f64, ret: f64) -> OptimizationResult {
        OptimizationResult {
            params: HashMap::new(),
            sharpe_ratio: sharpe,
            total_return: ret,
            max_drawdown: 0.0,
            win_rate: 0.0,
            total_trades: 0,
            calmar_ratio: 0.0,
            profit_factor: 0.0,
        }
    }

    #[test]
    fn test_parse_grid_override() {
        let (key, values) = parse_grid_override("fast_period=5, 8,13").unwrap();
        assert_eq!(key, "fast_period");
        assert_eq!(values, vec![json!(5), json!(8), json!(13)]);

        let (_, values) = parse_grid_override("trailing_stop=true,false").unwrap();
        assert_eq!(values, vec![json!(true), json!(false)]);

        assert!(parse_grid_override("no_equals").is_none());
        assert!(parse_grid_override("x=").is_none());
    }

    #[test]
    fn test_config_grid_cartesian_product() {
        let mut config = Config::default();
        let rejected = apply_overrides(
            &mut config,
            &["fast_period=5,8".to_string(), "slow_period=20,30,40".to_string(), "bad".to_string()],
        );
        assert_eq!(rejected, vec!["bad".to_string()]);

        let configs = Optimizer::new(config).generate_configs().unwrap();
        assert_eq!(configs.len(), 6);
        assert_eq!(configs[0].strategy["fast_period"], json!(5));
        assert_eq!(configs[0].strategy["slow_period"], json!(20));
        assert_eq!(configs[5].strategy["fast_period"], json!(8));
        assert_eq!(configs[5].strategy["slow_period"], json!(40));
        // Base params survive
        assert_eq!(configs[3].strategy["timeframe"], json!("1h"));
    }

    #[test]
    fn test_grid_falls_back_to_param_ranges() {
        let config = Config {
            strategy_name: "ma_rsi".to_string(),
            ..Config::default()
        };
        let grid = Optimizer::new(config).param_grid().unwrap();
        assert!(!grid.is_empty());
        assert!(grid.values().all(|values| !values.is_empty()));
    }

    #[test]
    fn test_sort_results() {
        let mut results = vec![result(0.5, 10.0), result(1.5, 2.0), result(1.0, 30.0)];
        Optimizer::sort_results(&mut results, "sharpe");
        assert_eq!(results[0].sharpe_ratio, 1.5);

        Optimizer::sort_results(&mut results, "return");
        assert_eq!(results[0].total_return, 30.0);
    }

    #[test]
    fn test_extract_and_format_params() {
        let mut config = Config::default();
        config.set_param("period", json!(14));
        config.set_param("level", json!(0.25));
        config.set_param("enabled", json!(true));
        let keys = vec!["period".to_string(), "level".to_string(), "enabled".to_string()];
        let params = extract_params(&config, &keys);
        assert_eq!(format_params(&params), "enabled=1, level=0.2500, period=14");
    }
}
