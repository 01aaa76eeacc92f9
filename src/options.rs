//! Schema options.
//!
//! The same `Options` type is used at construction time and per call; per-call
//! options are merged over the constructor options with `Options::merged_over`.
//! Options load from JSON or TOML with camelCase keys:
//!
//! ```toml
//! knownOnly = true
//! omit = ["scripts"]
//! sortBy = ["name", "version"]
//! sortArrays = true
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ops::union;
use crate::value::Value;

type CompareFn = dyn Fn(&Value, &Value) -> Ordering + Send + Sync;

/// A shareable array comparator.
#[derive(Clone)]
pub struct Comparator(Arc<CompareFn>);

impl Comparator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// How arrays are sorted in post-processing.
#[derive(Debug, Clone)]
pub enum ArraySort {
    Off,
    /// `Value::lexical_cmp`
    Lexicographic,
    By(Comparator),
}

/// Options recognized by `Schema` construction and `Schema::normalize`.
///
/// Every field is optional; unset fields fall back to the constructor options
/// and then to the documented default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Report missing required fields (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Fill in field defaults (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<bool>,
    /// Flag input keys that have no registered field (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_only: Option<bool>,
    /// Fail on the first diagnostic instead of accumulating (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    /// Restrict processing and the result to these keys
    #[serde(alias = "only", skip_serializing_if = "Option::is_none")]
    pub pick: Option<Vec<String>>,
    /// Keys to drop from the result; a single string is accepted
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub omit: Vec<String>,
    /// Result key order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<Vec<String>>,
    /// Sort every array in the result (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_arrays: Option<bool>,
    #[serde(skip)]
    pub comparator: Option<Comparator>,
    /// Drop empty values from the result (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omit_empty: Option<bool>,
    /// Only process keys present on the input (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_only: Option<bool>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict options: every diagnostic becomes a `SchemaError::Strict`.
    pub fn strict() -> Self {
        Self::default().with_strict(true)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_defaults(mut self, defaults: bool) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_known_only(mut self, known_only: bool) -> Self {
        self.known_only = Some(known_only);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Restrict the result to `keys` (the `only` option).
    pub fn with_pick<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pick = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Add `keys` to the omit list.
    pub fn with_omit<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit = union(self.omit, keys.into_iter().map(Into::into));
        self
    }

    pub fn with_sort_by<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sort_arrays(mut self, sort: bool) -> Self {
        self.sort_arrays = Some(sort);
        self
    }

    /// Sort arrays with a custom comparator. Implies `sortArrays`.
    pub fn with_comparator<F>(mut self, compare: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        self.sort_arrays = Some(true);
        self.comparator = Some(Comparator::new(compare));
        self
    }

    pub fn with_omit_empty(mut self, omit_empty: bool) -> Self {
        self.omit_empty = Some(omit_empty);
        self
    }

    pub fn with_existing_only(mut self, existing_only: bool) -> Self {
        self.existing_only = Some(existing_only);
        self
    }

    /// Merge these options over `base`: every option set here wins, unset
    /// options come from `base`, and omit lists are unioned.
    pub fn merged_over(&self, base: &Options) -> Options {
        Options {
            required: self.required.or(base.required),
            defaults: self.defaults.or(base.defaults),
            known_only: self.known_only.or(base.known_only),
            strict: self.strict.or(base.strict),
            pick: self.pick.clone().or_else(|| base.pick.clone()),
            omit: union(base.omit.clone(), self.omit.iter().cloned()),
            sort_by: self.sort_by.clone().or_else(|| base.sort_by.clone()),
            sort_arrays: self.sort_arrays.or(base.sort_arrays),
            comparator: self.comparator.clone().or_else(|| base.comparator.clone()),
            omit_empty: self.omit_empty.or(base.omit_empty),
            existing_only: self.existing_only.or(base.existing_only),
        }
    }

    pub fn checks_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    pub fn fills_defaults(&self) -> bool {
        self.defaults.unwrap_or(true)
    }

    pub fn is_known_only(&self) -> bool {
        self.known_only.unwrap_or(false)
    }

    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    pub fn is_omit_empty(&self) -> bool {
        self.omit_empty.unwrap_or(false)
    }

    pub fn is_existing_only(&self) -> bool {
        self.existing_only.unwrap_or(false)
    }

    /// True if `key` survives the `pick` restriction.
    pub fn picks(&self, key: &str) -> bool {
        self.pick
            .as_ref()
            .map_or(true, |keys| keys.iter().any(|k| k == key))
    }

    /// The array sort this normalize call performs.
    pub fn array_sort(&self) -> ArraySort {
        match (self.sort_arrays, &self.comparator) {
            (Some(true), Some(cmp)) => ArraySort::By(cmp.clone()),
            (Some(true), None) => ArraySort::Lexicographic,
            _ => ArraySort::Off,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.checks_required());
        assert!(options.fills_defaults());
        assert!(!options.is_known_only());
        assert!(!options.is_strict());
        assert!(options.picks("anything"));
        assert!(matches!(options.array_sort(), ArraySort::Off));
    }

    #[test]
    fn test_merged_over_prefers_explicit() {
        let base = Options::new()
            .with_strict(true)
            .with_omit(["a"])
            .with_sort_by(["x"]);
        let call = Options::new().with_strict(false).with_omit(["b", "a"]);

        let merged = call.merged_over(&base);
        assert!(!merged.is_strict());
        assert_eq!(merged.omit, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(merged.sort_by, Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_comparator_implies_sort() {
        let options = Options::new().with_comparator(|a: &Value, b: &Value| b.lexical_cmp(a));
        match options.array_sort() {
            ArraySort::By(cmp) => {
                assert_eq!(cmp.compare(&Value::from("a"), &Value::from("b")), Ordering::Greater)
            }
            other => panic!("unexpected sort: {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_camel_case_json() {
        let json = r#"{"knownOnly": true, "only": ["a", "c"], "omit": "keywords", "sortArrays": true}"#;
        let options: Options = serde_json::from_str(json).unwrap();

        assert!(options.is_known_only());
        assert_eq!(options.pick, Some(vec!["a".to_string(), "c".to_string()]));
        assert_eq!(options.omit, vec!["keywords".to_string()]);
        assert!(matches!(options.array_sort(), ArraySort::Lexicographic));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_deserialize_toml() {
        let options: Options = toml::from_str(
            r#"
            strict = true
            omitEmpty = true
            omit = ["scripts", "files"]
            sortBy = ["name", "version"]
            "#,
        )
        .unwrap();

        assert!(options.is_strict());
        assert!(options.is_omit_empty());
        assert_eq!(options.omit.len(), 2);
        assert_eq!(options.sort_by.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_serialize_skips_unset() {
        let json = serde_json::to_string(&Options::new().with_known_only(true)).unwrap();
        assert_eq!(json, r#"{"knownOnly":true}"#);
    }
}
