//! Error and diagnostic types.
//!
//! Two layers live here. `SchemaError` is fatal: a malformed declaration, a
//! non-object input, or a strict-mode escalation. `Diagnostic` records are the
//! recoverable problems a normalize pass accumulates; they integrate with
//! stillwater's `Validation` type and `Semigroup` trait for accumulation.

use std::collections::BTreeMap;
use std::fmt;

use stillwater::{NonEmptyVec, Semigroup, Validation};

use crate::ops::article;
use crate::types::TypeSet;
use crate::value::Value;

/// Fatal errors: these abort the call that raised them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    /// A field declared a type name that does not exist
    #[error("field '{field}': unknown type '{name}'")]
    UnknownType { field: String, name: String },

    /// An input that must be object-shaped was not
    #[error("expected {what} to be an object")]
    NotAnObject { what: String, actual: &'static str },

    /// A diagnostic raised while `strict` is set
    #[error("{0}")]
    Strict(Diagnostic),

    /// Raw config text could not be parsed
    #[error("{format} parse error: {message}")]
    Parse {
        format: &'static str,
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },
}

impl SchemaError {
    pub(crate) fn not_an_object(what: &str, value: &Value) -> Self {
        SchemaError::NotAnObject {
            what: what.to_string(),
            actual: value.type_name(),
        }
    }

    /// The diagnostic behind a strict-mode failure, if this is one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            SchemaError::Strict(d) => Some(d),
            _ => None,
        }
    }
}

/// What went wrong with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// A required field is absent from the result
    Missing,
    /// A value's type is not in the field's accepted set
    InvalidType,
    /// A custom validator rejected the value
    InvalidValue,
    /// An input key has no field while `knownOnly` is set
    UnknownField,
    /// A deprecated key was used
    Deprecated,
}

impl DiagnosticKind {
    /// Which diagnostics list a record of this kind lands in.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::Missing | DiagnosticKind::InvalidType | DiagnosticKind::InvalidValue => {
                Severity::Error
            }
            DiagnosticKind::UnknownField | DiagnosticKind::Deprecated => Severity::Warning,
        }
    }

    /// Stable camelCase label, matching the option and message vocabulary.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Missing => "missing",
            DiagnosticKind::InvalidType => "invalidType",
            DiagnosticKind::InvalidValue => "invalidValue",
            DiagnosticKind::UnknownField => "invalidField",
            DiagnosticKind::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One recoverable problem found during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The key the problem relates to
    pub key: String,
    /// Human-readable message
    pub message: String,
    /// Extra detail, e.g. the reason a validator gave
    pub detail: Option<String>,
    /// The offending value, if there was one
    pub value: Option<Value>,
}

impl Diagnostic {
    /// A required field is absent.
    pub fn missing(key: &str) -> Self {
        Self {
            kind: DiagnosticKind::Missing,
            key: key.to_string(),
            message: format!("Required field \"{}\" is missing", key),
            detail: None,
            value: None,
        }
    }

    /// A value has the wrong type.
    pub fn invalid_type(key: &str, expected: &TypeSet, actual: &Value) -> Self {
        let names = expected.names();
        let actual_tag = crate::types::classify(actual);
        Self {
            kind: DiagnosticKind::InvalidType,
            key: key.to_string(),
            message: format!(
                "expected \"{}\" to be {} but got \"{}\"",
                key,
                article(&names),
                actual_tag
            ),
            detail: Some(format!("expected {}, got {}", expected, actual_tag)),
            value: Some(actual.clone()),
        }
    }

    /// A validator rejected a value.
    pub fn invalid_value(key: &str, actual: &Value, reason: Option<String>) -> Self {
        Self {
            kind: DiagnosticKind::InvalidValue,
            key: key.to_string(),
            message: format!("invalid value defined on property \"{}\": {}", key, actual),
            detail: reason,
            value: Some(actual.clone()),
        }
    }

    /// An input key has no registered field.
    pub fn unknown_field(key: &str) -> Self {
        Self {
            kind: DiagnosticKind::UnknownField,
            key: key.to_string(),
            message: format!(
                "invalid property: \"{}\". Since `options.knownOnly` is true, only properties with fields defined on the schema may be used.",
                key
            ),
            detail: None,
            value: None,
        }
    }

    /// A deprecated key was present on the input.
    pub fn deprecated(key: &str, replacement: &str) -> Self {
        Self {
            kind: DiagnosticKind::Deprecated,
            key: key.to_string(),
            message: format!(
                "property \"{}\" is deprecated, use \"{}\" instead",
                key, replacement
            ),
            detail: None,
            value: None,
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Get a suggestion for fixing this problem, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self.kind {
            DiagnosticKind::Missing => Some(format!("Add '{}' to your configuration", self.key)),
            DiagnosticKind::UnknownField => Some(format!(
                "Remove '{}' or register a field for it",
                self.key
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// The warnings and errors accumulated by one pass.
///
/// Nested passes produce their own `Diagnostics`, which the parent folds in
/// with `combine`; order is preserved and nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    /// Keys reported as missing, in report order
    pub missing: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic in the list its severity selects.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind == DiagnosticKind::Missing {
            self.missing.push(diagnostic.key.clone());
        }
        match diagnostic.severity() {
            Severity::Warning => self.warnings.push(diagnostic),
            Severity::Error => self.errors.push(diagnostic),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }

    /// All records, warnings first.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.warnings.iter().chain(self.errors.iter())
    }

    /// Records of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(move |d| d.kind == kind)
    }

    /// Records about one key.
    pub fn for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.iter().filter(move |d| d.key == key)
    }

    /// Convert the error list into a stillwater validation.
    ///
    /// Warnings never fail a validation.
    pub fn into_validation(self) -> SchemaValidation<()> {
        match Violations::from_vec(self.errors) {
            Some(errors) => Validation::Failure(errors),
            None => Validation::Success(()),
        }
    }

    /// Emit one tracing event per record.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(key = %warning.key, kind = %warning.kind, message = %warning.message, "schema warning");
        }
        for error in &self.errors {
            tracing::error!(key = %error.key, kind = %error.kind, message = %error.message, "schema error");
        }
    }
}

impl Semigroup for Diagnostics {
    fn combine(mut self, other: Self) -> Self {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
        self.missing.extend(other.missing);
        self
    }
}

/// A non-empty collection of error diagnostics.
///
/// Uses `NonEmptyVec` from stillwater to guarantee at least one entry.
#[derive(Debug, Clone)]
pub struct Violations(pub NonEmptyVec<Diagnostic>);

impl Violations {
    /// Create from a single diagnostic.
    pub fn single(diagnostic: Diagnostic) -> Self {
        Self(NonEmptyVec::singleton(diagnostic))
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(diagnostics: Vec<Diagnostic>) -> Option<Self> {
        NonEmptyVec::from_vec(diagnostics).map(Self)
    }

    /// Get the first entry (always exists).
    pub fn first(&self) -> &Diagnostic {
        self.0.head()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, kept for API consistency.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl Semigroup for Violations {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<Diagnostic> for Violations {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::single(diagnostic)
    }
}

impl IntoIterator for Violations {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schema errors ({}):", self.len())?;
        for diagnostic in self.iter() {
            writeln!(f, "  {}", diagnostic)?;
        }
        Ok(())
    }
}

/// The standard validation result type.
pub type SchemaValidation<T> = Validation<T, Violations>;

/// Group diagnostics by kind for organized reporting.
pub fn group_by_kind<'a>(
    diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
) -> BTreeMap<DiagnosticKind, Vec<&'a Diagnostic>> {
    let mut groups: BTreeMap<DiagnosticKind, Vec<&Diagnostic>> = BTreeMap::new();

    for diagnostic in diagnostics {
        groups.entry(diagnostic.kind).or_default().push(diagnostic);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTag;

    #[test]
    fn test_missing_message() {
        let d = Diagnostic::missing("name");
        assert_eq!(d.message, "Required field \"name\" is missing");
        assert_eq!(d.severity(), Severity::Error);
    }

    #[test]
    fn test_invalid_type_message() {
        let expected = TypeSet::from_tags([TypeTag::String, TypeTag::Array]);
        let d = Diagnostic::invalid_type("keywords", &expected, &Value::Integer(3));
        assert_eq!(
            d.message,
            "expected \"keywords\" to be an array or a string but got \"number\""
        );
    }

    #[test]
    fn test_invalid_value_message() {
        let d = Diagnostic::invalid_value("main", &Value::from("index.js"), None);
        assert_eq!(
            d.message,
            "invalid value defined on property \"main\": \"index.js\""
        );
    }

    #[test]
    fn test_deprecated_is_warning() {
        let d = Diagnostic::deprecated("licenses", "license");
        assert_eq!(d.severity(), Severity::Warning);
        assert_eq!(
            d.message,
            "property \"licenses\" is deprecated, use \"license\" instead"
        );
    }

    #[test]
    fn test_push_routes_by_severity() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::missing("a"));
        diags.push(Diagnostic::unknown_field("b"));

        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.warnings.len(), 1);
        assert_eq!(diags.missing, vec!["a".to_string()]);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_combine_preserves_order() {
        let mut a = Diagnostics::new();
        a.push(Diagnostic::missing("a"));
        let mut b = Diagnostics::new();
        b.push(Diagnostic::missing("b"));
        b.push(Diagnostic::missing("a"));

        let combined = a.combine(b);
        let keys: Vec<&str> = combined.errors.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
        assert_eq!(combined.missing, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_into_validation() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::unknown_field("x"));
        assert!(diags.clone().into_validation().is_success());

        diags.push(Diagnostic::missing("y"));
        match diags.into_validation() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.first().key, "y");
            }
            Validation::Success(_) => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_violations_combine() {
        let a = Violations::single(Diagnostic::missing("a"));
        let b = Violations::single(Diagnostic::missing("b"));
        assert_eq!(a.combine(b).len(), 2);
    }

    #[test]
    fn test_group_by_kind() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::missing("a"));
        diags.push(Diagnostic::missing("b"));
        diags.push(Diagnostic::unknown_field("c"));

        let grouped = group_by_kind(diags.iter());
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.get(&DiagnosticKind::Missing).map(|v| v.len()), Some(2));
        assert_eq!(grouped.get(&DiagnosticKind::UnknownField).map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_not_an_object_message() {
        let err = SchemaError::not_an_object("config", &Value::from("foo"));
        assert_eq!(err.to_string(), "expected config to be an object");
    }
}
