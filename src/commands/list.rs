//! List command: registered strategies and their parameters

use anyhow::Result;
use ea_strategies::params::ParamSpec;
use ea_strategies::strategies::{available_strategies, strategy_info};

pub fn run(strategy: Option<String>) -> Result<()> {
    let Some(name) = strategy else {
        println!("\n{:<24} Description", "Strategy");
        println!("{}", "-".repeat(80));
        for name in available_strategies() {
            let info = strategy_info(name)?;
            println!("{:<24} {}", info.name, info.description);
        }
        println!();
        return Ok(());
    };

    let info = strategy_info(&name)?;
    let defaults = (info.defaults)();

    println!("\n{}: {}", info.name, info.description);
    println!("{}", "-".repeat(100));
    println!(
        "{:<22} {:<6} {:<14} {:<22} Description",
        "Parameter", "Kind", "Default", "Optimize"
    );
    println!("{}", "-".repeat(100));
    for spec in (info.params)() {
        let default = defaults
            .get(spec.name)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<22} {:<6} {:<14} {:<22} {}",
            spec.name,
            format!("{:?}", spec.kind),
            default,
            optimize_range(&spec),
            spec.description
        );
    }
    println!();

    Ok(())
}

fn optimize_range(spec: &ParamSpec) -> String {
    match spec.optimize {
        Some(range) => format!("{}..={} step {}", range.from, range.to, range.step),
        None => "-".to_string(),
    }
}
