use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use super::config::OrderExecutionConfig;
use super::instructions::{load_instructions, Instruction};
use super::snapshot::{AccountSnapshot, SnapshotWriter};
use crate::strategies::{Strategy, StrategyContext, Subscription};
use crate::{Candle, Fill, OrderId, Timeframe};

pub struct OrderExecutionStrategy {
    config: OrderExecutionConfig,
    timeframe: Timeframe,
    instructions: Vec<Instruction>,
    executed: HashSet<String>,
    /// Stop/take of executed instructions, applied once their order fills
    pending_levels: HashMap<OrderId, (Option<f64>, Option<f64>)>,
    snapshots: Option<SnapshotWriter>,
}

impl OrderExecutionStrategy {
    pub fn new(config: OrderExecutionConfig, timeframe: Timeframe) -> Self {
        Self {
            config,
            timeframe,
            instructions: Vec::new(),
            executed: HashSet::new(),
            pending_levels: HashMap::new(),
            snapshots: None,
        }
    }

    fn execute(&mut self, ctx: &mut dyn StrategyContext, instruction: &Instruction) {
        info!(
            strategy = super::NAME,
            id = %instruction.id,
            amount = instruction.amount,
            "Executing instruction"
        );
        let order = if instruction.amount > 0.0 {
            ctx.buy_market(instruction.amount)
        } else if instruction.amount < 0.0 {
            ctx.sell_market(-instruction.amount)
        } else {
            ctx.close_position()
        };

        if instruction.amount == 0.0 {
            return;
        }
        if let Some(id) = order {
            if instruction.stop.is_some() || instruction.take.is_some() {
                self.pending_levels
                    .insert(id, (instruction.stop, instruction.take));
            }
        }
    }

    fn write_snapshot(&mut self, ctx: &dyn StrategyContext) {
        let Some(writer) = self.snapshots.as_mut() else {
            return;
        };
        if let Err(e) = writer.write(&AccountSnapshot::capture(ctx)) {
            warn!(strategy = super::NAME, error = %e, "Snapshot write failed, snapshots disabled");
            self.snapshots = None;
        }
    }
}

impl Strategy for OrderExecutionStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::Candles(self.timeframe)]
    }

    fn on_start(&mut self, ctx: &mut dyn StrategyContext) {
        let path = Path::new(&self.config.instructions_path);
        if !path.exists() {
            warn!(
                strategy = super::NAME,
                path = %path.display(),
                "Instruction file not found, no orders will be placed"
            );
        } else {
            match load_instructions(path) {
                Ok(all) => {
                    let symbol = ctx.security().symbol.as_str().to_string();
                    let (mine, other): (Vec<_>, Vec<_>) = all
                        .into_iter()
                        .partition(|i| i.symbol.eq_ignore_ascii_case(&symbol));
                    if !other.is_empty() {
                        debug!(count = other.len(), "Instructions for other symbols ignored");
                    }
                    info!(strategy = super::NAME, count = mine.len(), "Instructions loaded");
                    self.instructions = mine;
                }
                Err(e) => warn!(strategy = super::NAME, error = %e, "Failed to read instructions"),
            }
        }

        if !self.config.snapshot_path.is_empty() {
            match SnapshotWriter::create(Path::new(&self.config.snapshot_path)) {
                Ok(writer) => self.snapshots = Some(writer),
                Err(e) => warn!(strategy = super::NAME, error = %e, "Cannot create snapshot file"),
            }
        }
    }

    fn on_candle(&mut self, ctx: &mut dyn StrategyContext, timeframe: Timeframe, _candle: &Candle) {
        if timeframe != self.timeframe {
            return;
        }
        let now = ctx.current_time();
        let due: Vec<Instruction> = self
            .instructions
            .iter()
            .filter(|i| i.time <= now && !self.executed.contains(&i.id))
            .cloned()
            .collect();

        for instruction in &due {
            // Ids repeated in the file run only once
            if self.executed.insert(instruction.id.clone()) {
                self.execute(ctx, instruction);
            }
        }

        self.write_snapshot(ctx);
    }

    fn on_own_trade(&mut self, ctx: &mut dyn StrategyContext, fill: &Fill) {
        debug!(strategy = super::NAME, order = %fill.order_id, price = fill.price, "Instruction filled");
        let Some((stop, take)) = self.pending_levels.remove(&fill.order_id) else {
            return;
        };
        if ctx.position() == 0.0 {
            return;
        }
        if let Some(stop) = stop {
            ctx.set_stop_loss(stop);
        }
        if let Some(take) = take {
            ctx.set_take_profit(take);
        }
    }
}
