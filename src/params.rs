//! Strategy parameter metadata
//!
//! Every strategy publishes a list of [`ParamSpec`]s describing its tunable
//! inputs: display name, description, value kind and an optional
//! optimization range. Defaults are not duplicated here, they come from the
//! serialized default config of the strategy.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Inclusive optimization range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizeRange {
    pub from: f64,
    pub to: f64,
    pub step: f64,
}

impl OptimizeRange {
    /// Expand the range into the list of values it covers
    pub fn values(&self) -> Vec<f64> {
        if self.step <= 0.0 || self.to < self.from {
            return vec![self.from];
        }
        let count = ((self.to - self.from) / self.step + 1e-9).floor() as usize + 1;
        (0..count).map(|i| self.from + i as f64 * self.step).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub optimize: Option<OptimizeRange>,
}

impl ParamSpec {
    fn new(
        name: &'static str,
        display_name: &'static str,
        description: &'static str,
        kind: ParamKind,
    ) -> Self {
        Self {
            name,
            display_name,
            description,
            kind,
            optimize: None,
        }
    }

    pub fn int(name: &'static str, display_name: &'static str, description: &'static str) -> Self {
        Self::new(name, display_name, description, ParamKind::Int)
    }

    pub fn float(
        name: &'static str,
        display_name: &'static str,
        description: &'static str,
    ) -> Self {
        Self::new(name, display_name, description, ParamKind::Float)
    }

    pub fn flag(name: &'static str, display_name: &'static str, description: &'static str) -> Self {
        Self::new(name, display_name, description, ParamKind::Bool)
    }

    pub fn text(name: &'static str, display_name: &'static str, description: &'static str) -> Self {
        Self::new(name, display_name, description, ParamKind::Text)
    }

    /// Mark the parameter as optimizable over `from..=to` by `step`
    pub fn optimize(mut self, from: f64, to: f64, step: f64) -> Self {
        self.optimize = Some(OptimizeRange { from, to, step });
        self
    }

    /// Convert a numeric grid value into JSON of the right kind
    pub fn to_json(&self, value: f64) -> serde_json::Value {
        match self.kind {
            ParamKind::Int => serde_json::json!(value.round() as i64),
            ParamKind::Bool => serde_json::json!(value > 0.5),
            ParamKind::Float | ParamKind::Text => serde_json::json!(value),
        }
    }
}

/// Read the default value of each parameter from a serialized default config
pub fn defaults_of<T: Serialize + Default>() -> HashMap<String, serde_json::Value> {
    match serde_json::to_value(T::default()) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}
