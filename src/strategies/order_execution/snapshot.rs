//! Account snapshot CSV written after every candle

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::strategies::StrategyContext;

#[derive(Debug, Clone, Serialize)]
pub struct AccountSnapshot {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub position: f64,
    pub position_price: Option<f64>,
    pub realized_pnl: f64,
    pub portfolio_value: f64,
}

impl AccountSnapshot {
    pub fn capture(ctx: &dyn StrategyContext) -> Self {
        Self {
            time: ctx.current_time(),
            symbol: ctx.security().symbol.to_string(),
            position: ctx.position(),
            position_price: ctx.position_price(),
            realized_pnl: ctx.realized_pnl(),
            portfolio_value: ctx.portfolio_value(),
        }
    }
}

pub struct SnapshotWriter {
    writer: csv::Writer<File>,
}

impl SnapshotWriter {
    /// Create (or truncate) the snapshot file
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }

    pub fn write(&mut self, snapshot: &AccountSnapshot) -> anyhow::Result<()> {
        self.writer.serialize(snapshot)?;
        self.writer.flush()?;
        Ok(())
    }
}
