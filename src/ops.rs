//! Object and array helpers used by the normalize pipeline.
//!
//! All functions here are pure: they take ownership of a table and return the
//! transformed table. Nothing in this module knows about fields or schemas.

use std::cmp::Ordering;

use crate::value::{Table, Value};

/// Deep merge `overlay` over `base`.
///
/// Scalars and arrays in `overlay` replace those in `base`; tables present on
/// both sides merge recursively. Keys keep `base` order, new keys append.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, value) in overlay {
        match value {
            Value::Table(right) => match base.get_mut(&key) {
                Some(Value::Table(left)) => {
                    let current = std::mem::take(left);
                    *left = deep_merge(current, right);
                }
                _ => {
                    base.insert(key, Value::Table(right));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
    base
}

/// Fill `table` from `base` without overriding anything already present.
///
/// The inverse direction of `deep_merge`: keys keep `table` order and keys
/// only present in `base` are appended.
pub fn merge_under(mut table: Table, base: &Table) -> Table {
    for (key, fallback) in base {
        match table.get_mut(key) {
            None => {
                table.insert(key.clone(), fallback.clone());
            }
            Some(Value::Table(existing)) => {
                if let Value::Table(fallback) = fallback {
                    let current = std::mem::take(existing);
                    *existing = merge_under(current, fallback);
                }
            }
            Some(_) => {}
        }
    }
    table
}

/// Keep only the listed keys, in table order.
pub fn pick<S: AsRef<str>>(table: Table, keys: &[S]) -> Table {
    table
        .into_iter()
        .filter(|(k, _)| keys.iter().any(|p| p.as_ref() == k))
        .collect()
}

/// Drop the listed keys.
pub fn omit<S: AsRef<str>>(table: Table, keys: &[S]) -> Table {
    table
        .into_iter()
        .filter(|(k, _)| !keys.iter().any(|o| o.as_ref() == k))
        .collect()
}

/// Recursively remove empty values.
///
/// Null, empty strings and empty arrays are dropped; nested tables are cleaned
/// first and dropped if nothing is left. Numbers and booleans always stay.
pub fn omit_empty(table: Table) -> Table {
    table
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Table(inner) => Value::Table(omit_empty(inner)),
                other => other,
            };
            match &value {
                Value::Table(inner) if inner.is_empty() => None,
                v if v.is_empty_value() => None,
                _ => Some((key, value)),
            }
        })
        .collect()
}

/// Stable-sort every array in `table`, descending into nested tables.
pub fn sort_arrays<F>(table: Table, compare: &F) -> Table
where
    F: Fn(&Value, &Value) -> Ordering + ?Sized,
{
    table
        .into_iter()
        .map(|(key, value)| (key, sort_value(value, compare)))
        .collect()
}

fn sort_value<F>(value: Value, compare: &F) -> Value
where
    F: Fn(&Value, &Value) -> Ordering + ?Sized,
{
    match value {
        Value::Array(mut items) => {
            items.sort_by(|a, b| compare(a, b));
            Value::Array(items)
        }
        Value::Table(inner) => Value::Table(sort_arrays(inner, compare)),
        other => other,
    }
}

/// Reorder keys: listed keys first in the given order, then every other key
/// in its original relative order. Listed keys that are absent are ignored.
pub fn sort_object<S: AsRef<str>>(mut table: Table, keys: &[S]) -> Table {
    let mut sorted = Table::with_capacity(table.len());
    for key in keys {
        if let Some((k, v)) = table.shift_remove_entry(key.as_ref()) {
            sorted.insert(k, v);
        }
    }
    sorted.extend(table);
    sorted
}

/// Append `items` to `base`, skipping anything already present.
pub fn union<T, I>(mut base: Vec<T>, items: I) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    for item in items {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}

/// Indefinite article(s) for type names: `["array", "string"]` becomes
/// `"an array or a string"`.
pub fn article<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| {
            let word = word.as_ref();
            let prefix = match word.chars().next() {
                Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
                _ => "a",
            };
            format!("{} {}", prefix, word)
        })
        .collect::<Vec<_>>()
        .join(" or ")
}
