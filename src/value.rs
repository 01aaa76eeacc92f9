//! Value types for configuration objects.
//!
//! This module provides the `Value` enum that every schema operates on, and
//! the `Table` alias for object-shaped values. Tables keep insertion order:
//! key order is part of a normalized result (see `sortBy`).

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An object-shaped value: string keys in insertion order.
pub type Table = IndexMap<String, Value>;

/// Raw value representation for configuration data.
///
/// Configuration objects are parsed (or built by hand) into this enum before
/// a schema normalizes them. Absent keys are simply missing from their
/// `Table`; `Null` is an explicit value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object of key-value pairs
    Table(Table),
}

impl Value {
    /// Create an empty table value.
    pub fn table() -> Self {
        Value::Table(Table::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is object-shaped.
    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to get this value as a table.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Consume this value, returning the table if it is one.
    pub fn into_table(self) -> Option<Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Get a value by dot-notation path (e.g., "database.host").
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        self.get_path_parts(&parts)
    }

    fn get_path_parts(&self, parts: &[&str]) -> Option<&Value> {
        if parts.is_empty() {
            return Some(self);
        }

        match self {
            Value::Table(table) => table
                .get(parts[0])
                .and_then(|v| v.get_path_parts(&parts[1..])),
            _ => None,
        }
    }

    /// Set a value by dot-notation path, creating intermediate tables.
    ///
    /// Any non-table value found along the path is replaced by a table.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) {
        let parts: Vec<&str> = path.split('.').collect();
        self.set_path_parts(&parts, value.into());
    }

    fn set_path_parts(&mut self, parts: &[&str], value: Value) {
        if parts.is_empty() {
            *self = value;
            return;
        }
        if !self.is_table() {
            *self = Value::table();
        }
        if let Value::Table(table) = self {
            table
                .entry(parts[0].to_string())
                .or_insert(Value::Null)
                .set_path_parts(&parts[1..], value);
        }
    }

    /// Get a human-readable type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Table(_) => "object",
        }
    }

    /// Whether `omitEmpty` treats this value as empty.
    ///
    /// Null, empty strings and empty arrays are empty. A table is empty when
    /// every one of its entries is. Numbers and booleans never are.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(arr) => arr.is_empty(),
            Value::Table(table) => table.values().all(Value::is_empty_value),
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) => false,
        }
    }

    /// Total ordering used by the default array sort.
    ///
    /// Strings compare lexicographically and numbers numerically. Values of
    /// different kinds order by kind, then by their rendered form.
    pub fn lexical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (a, b) if a.is_number() && b.is_number() => {
                let (x, y) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => a
                .kind_rank()
                .cmp(&b.kind_rank())
                .then_with(|| a.to_string().cmp(&b.to_string())),
        }
    }

    fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Table(_) => 5,
        }
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Table(table) => serde_json::Value::Object(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                // Try integer first, fall back to float
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Table(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Build a `Table` from `key => value` pairs.
///
/// ```ignore
/// let config = table! { "name" => "demo", "keywords" => vec!["a", "b"] };
/// ```
#[macro_export]
macro_rules! table {
    () => { $crate::value::Table::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut table = $crate::value::Table::new();
        $( table.insert(::std::string::String::from($key), $crate::value::Value::from($value)); )+
        table
    }};
}
