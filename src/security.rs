//! Instrument metadata: price step, pip size and volume normalisation
//!
//! Distances in the strategy configs are expressed in pips the way MetaTrader
//! inputs are. For 3- and 5-digit quotes one pip is ten price steps, otherwise
//! it is a single step.

use serde::{Deserialize, Serialize};

use crate::Symbol;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub symbol: Symbol,
    /// Minimal price increment
    #[serde(default = "default_price_step")]
    pub price_step: f64,
    /// Number of decimals in quoted prices
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    #[serde(default = "default_volume_step")]
    pub volume_step: f64,
    #[serde(default = "default_min_volume")]
    pub min_volume: f64,
    #[serde(default)]
    pub max_volume: Option<f64>,
}

fn default_price_step() -> f64 {
    0.00001
}
fn default_decimals() -> u32 {
    5
}
fn default_volume_step() -> f64 {
    0.01
}
fn default_min_volume() -> f64 {
    0.01
}

impl Default for Security {
    fn default() -> Self {
        Self {
            symbol: Symbol::new("EURUSD"),
            price_step: default_price_step(),
            decimals: default_decimals(),
            volume_step: default_volume_step(),
            min_volume: default_min_volume(),
            max_volume: None,
        }
    }
}

impl Security {
    pub fn new(symbol: impl Into<String>, price_step: f64, decimals: u32) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            price_step,
            decimals,
            ..Default::default()
        }
    }

    /// Size of one pip in price units
    pub fn pip_size(&self) -> f64 {
        let step = if self.price_step > 0.0 {
            self.price_step
        } else {
            10f64.powi(-(self.decimals as i32))
        };
        if self.decimals == 3 || self.decimals == 5 {
            step * 10.0
        } else {
            step
        }
    }

    /// Convert a pip distance into a price distance
    pub fn pips(&self, pips: f64) -> f64 {
        pips * self.pip_size()
    }

    /// Round a price to the instrument's price step
    pub fn round_price(&self, price: f64) -> f64 {
        if self.price_step <= 0.0 {
            return price;
        }
        (price / self.price_step).round() * self.price_step
    }

    /// Floor a volume to the volume step and clamp it to the allowed range.
    /// Returns 0.0 when the result is below the minimum volume.
    pub fn normalize_volume(&self, volume: f64) -> f64 {
        if volume <= 0.0 || !volume.is_finite() {
            return 0.0;
        }
        let mut v = volume;
        if self.volume_step > 0.0 {
            // Small epsilon so 0.3 / 0.1 does not floor to 2
            v = ((v / self.volume_step) + 1e-9).floor() * self.volume_step;
        }
        if let Some(max) = self.max_volume {
            v = v.min(max);
        }
        if v + 1e-12 < self.min_volume {
            0.0
        } else {
            v
        }
    }
}
