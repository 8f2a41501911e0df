use serde::{Deserialize, Serialize};

use crate::error::{StrategyError, StrategyResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExecutionConfig {
    /// Instruction CSV (default: "instructions.csv")
    #[serde(default = "default_instructions_path")]
    pub instructions_path: String,

    /// Account snapshot CSV, empty to disable (default: "account_snapshot.csv")
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

fn default_instructions_path() -> String {
    "instructions.csv".to_string()
}
fn default_snapshot_path() -> String {
    "account_snapshot.csv".to_string()
}

impl Default for OrderExecutionConfig {
    fn default() -> Self {
        Self {
            instructions_path: default_instructions_path(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl OrderExecutionConfig {
    pub fn validate(&self) -> StrategyResult<()> {
        if self.instructions_path.trim().is_empty() {
            return Err(StrategyError::invalid(
                "instructions_path",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
