//! Parse raw configuration text into a `Value`.
//!
//! JSON is always available. TOML and YAML are behind the `toml` (default) and
//! `yaml` features. Parse failures become `SchemaError::Parse` with the line
//! and column when the parser reports one. Every format keeps the key order
//! of the source text.

use crate::error::SchemaError;
use crate::value::Value;

/// Parse JSON text. Object key order is preserved.
pub fn from_json_str(content: &str) -> Result<Value, SchemaError> {
    let json: serde_json::Value = serde_json::from_str(content).map_err(|e| SchemaError::Parse {
        format: "json",
        message: e.to_string(),
        line: Some(e.line() as u32),
        column: Some(e.column() as u32),
    })?;
    Ok(Value::from(json))
}

/// Parse TOML text.
#[cfg(feature = "toml")]
pub fn from_toml_str(content: &str) -> Result<Value, SchemaError> {
    let table: toml::Table = toml::from_str(content).map_err(|e: toml::de::Error| {
        let (line, column) = e
            .span()
            .map(|s| {
                let (line, column) = position_of(content, s.start);
                (Some(line), Some(column))
            })
            .unwrap_or((None, None));
        SchemaError::Parse {
            format: "toml",
            message: e.message().to_string(),
            line,
            column,
        }
    })?;
    Ok(toml_to_value(toml::Value::Table(table)))
}

#[cfg(feature = "toml")]
fn toml_to_value(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        // Datetimes have no counterpart; keep their TOML rendering
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_value(v)))
                .collect(),
        ),
    }
}

/// 1-based line and column of a byte offset.
#[cfg(feature = "toml")]
fn position_of(content: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
    (line as u32, (offset - line_start + 1) as u32)
}

/// Parse YAML text.
#[cfg(feature = "yaml")]
pub fn from_yaml_str(content: &str) -> Result<Value, SchemaError> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e: serde_yaml::Error| {
            let (line, column) = e.location().map_or((None, None), |loc| {
                (Some(loc.line() as u32), Some(loc.column() as u32))
            });
            SchemaError::Parse {
                format: "yaml",
                message: e.to_string(),
                line,
                column,
            }
        })?;
    Ok(yaml_to_value(&document))
}

#[cfg(feature = "yaml")]
fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(arr) => Value::Array(arr.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => Value::Table(
            map.iter()
                .filter_map(|(k, v)| {
                    let key = match k {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key, yaml_to_value(v)))
                })
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}
