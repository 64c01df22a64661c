//! Domain records as seen by the search core
//!
//! Domain entities come in a dozen shapes owned by other subsystems. The
//! core only ever reads a handful of named fields, so records are carried
//! as JSON objects and fields are looked up by name. Lookup ignores ASCII
//! case and underscores: `CreatedAt`, `createdAt` and `created_at` all
//! resolve to the same field.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A domain entity, copied by value at index or hydration time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainRecord(Map<String, Value>);

impl DomainRecord {
    /// Empty record
    pub fn new() -> Self {
        DomainRecord(Map::new())
    }

    /// Wrap a JSON value; only objects are records.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(DomainRecord(map)),
            other => Err(Error::Serialization(format!(
                "domain record must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builder: set a field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Look up a field by name (case and underscore insensitive)
    pub fn field(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.0.get(name) {
            return Some(v);
        }
        let wanted = fold_name(name);
        self.0
            .iter()
            .find(|(k, _)| fold_name(k) == wanted)
            .map(|(_, v)| v)
    }

    /// Field rendered as text; strings verbatim, numbers and booleans
    /// formatted, everything else `None`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).and_then(scalar_to_string)
    }

    /// Underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for DomainRecord {
    fn from(map: Map<String, Value>) -> Self {
        DomainRecord(map)
    }
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
