//! Feature coercion from raw form input.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

/// Numeric feature values in schema order.
///
/// Built from untyped form input: every schema field is coerced to `f64`,
/// with missing or unparsable entries falling back to `0.0`. Keys outside the
/// schema are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn from_raw(schema: &[String], raw: &HashMap<String, String>) -> Self {
        let values = schema
            .iter()
            .map(|name| {
                raw.get(name)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .unwrap_or(0.0)
            })
            .collect();

        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The coerced inputs as a JSON object keyed by feature name, for the
    /// stored prediction record.
    pub fn snapshot(&self, schema: &[String]) -> Value {
        let entries: Map<String, Value> = schema
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), json!(value)))
            .collect();

        Value::Object(entries)
    }
}
