//! Field declarations.
//!
//! A `FieldSpec` is what callers write; `Schema::field` resolves it into a
//! `Field` once, at registration. All the calling conventions end up in the
//! same place:
//!
//! ```ignore
//! schema
//!     .field("name", "string")?                           // type only
//!     .field("keywords", FieldSpec::new("array").default(vec!["x"]))?
//!     .field("server", server_schema)?                    // nested schema
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::{FieldContext, ValidateContext};
use crate::error::SchemaError;
use crate::schema::Schema;
use crate::types::{TypeSet, TypeTag};
use crate::value::Value;

/// Custom validator.
pub type ValidateFn = Arc<dyn Fn(&Value, &ValidateContext<'_>) -> Verdict + Send + Sync>;

/// Custom transform. Receives the candidate value (absent as `None`) and
/// returns the new one. `None` falls back to the field's default, and removes
/// the key only when there is none.
pub type FormatFn = Arc<dyn Fn(Option<Value>, &mut FieldContext<'_>) -> Option<Value> + Send + Sync>;

/// Outcome of a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    /// Invalid, with a reason attached to the diagnostic
    InvalidBecause(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// The reason given for an invalid verdict.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::InvalidBecause(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

impl<E: fmt::Display> From<Result<(), E>> for Verdict {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Verdict::Valid,
            Err(e) => Verdict::InvalidBecause(e.to_string()),
        }
    }
}

/// Declared types before resolution.
#[derive(Debug, Clone, Default)]
pub enum TypeSpec {
    /// No types given: any value is accepted
    #[default]
    Unspecified,
    /// Type names, parsed at registration
    Names(Vec<String>),
    Tags(TypeSet),
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Names(vec![name.to_string()])
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::Names(vec![name])
    }
}

impl From<&[&str]> for TypeSpec {
    fn from(names: &[&str]) -> Self {
        TypeSpec::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TypeSpec {
    fn from(names: [&str; N]) -> Self {
        TypeSpec::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<&str>> for TypeSpec {
    fn from(names: Vec<&str>) -> Self {
        TypeSpec::Names(names.into_iter().map(String::from).collect())
    }
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        TypeSpec::Tags(TypeSet::from(tag))
    }
}

impl From<Vec<TypeTag>> for TypeSpec {
    fn from(tags: Vec<TypeTag>) -> Self {
        TypeSpec::Tags(TypeSet::from(tags))
    }
}

impl From<TypeSet> for TypeSpec {
    fn from(set: TypeSet) -> Self {
        TypeSpec::Tags(set)
    }
}

/// A field declaration, as passed to `Schema::field`.
#[derive(Clone, Default)]
pub struct FieldSpec {
    types: TypeSpec,
    default: Option<Value>,
    required: Option<bool>,
    optional: Option<bool>,
    nullable: Option<bool>,
    validate: Option<ValidateFn>,
    format: Option<FormatFn>,
    child: Option<Arc<Schema>>,
    extend: bool,
    deprecated: Option<String>,
}

impl FieldSpec {
    pub fn new(types: impl Into<TypeSpec>) -> Self {
        Self {
            types: types.into(),
            ..Default::default()
        }
    }

    /// A field that accepts any value.
    pub fn any() -> Self {
        Self::new(TypeSpec::Unspecified)
    }

    /// Value used when the input has none.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Attach a validator. Anything convertible to a `Verdict` may be
    /// returned: `bool`, `Result<(), E: Display>`, or a `Verdict`.
    pub fn validate<F, V>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &ValidateContext<'_>) -> V + Send + Sync + 'static,
        V: Into<Verdict>,
    {
        self.validate = Some(Arc::new(move |value: &Value, ctx: &ValidateContext<'_>| {
            f(value, ctx).into()
        }));
        self
    }

    /// Attach a transform.
    pub fn format<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Value>, &mut FieldContext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(f));
        self
    }

    /// Produce this field's value with a nested schema.
    pub fn schema(mut self, child: impl Into<Arc<Schema>>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// Merge over an existing field of the same name instead of replacing it.
    pub fn extend(mut self) -> Self {
        self.extend = true;
        self
    }

    /// Mark the key deprecated in favor of `replacement`.
    pub fn deprecated(mut self, replacement: impl Into<String>) -> Self {
        self.deprecated = Some(replacement.into());
        self
    }

    pub(crate) fn wants_extend(&self) -> bool {
        self.extend
    }

    /// Resolve into a `Field` named `name`.
    pub(crate) fn resolve(self, name: &str) -> Result<Field, SchemaError> {
        let (types, explicit_types, optional_marker) = match self.types {
            TypeSpec::Unspecified => (TypeSet::any(), false, false),
            TypeSpec::Tags(set) => (set, true, false),
            TypeSpec::Names(names) => {
                let parsed = TypeSet::parse(names.as_slice()).map_err(|e| SchemaError::UnknownType {
                    field: name.to_string(),
                    name: e.0,
                })?;
                (parsed.types, true, parsed.optional_marker)
            }
        };

        let (types, explicit_types, kind) = match self.child {
            Some(child) if !explicit_types => {
                (TypeSet::from(TypeTag::Object), true, FieldKind::Nested(child))
            }
            Some(child) => (types, explicit_types, FieldKind::Nested(child)),
            None => (types, explicit_types, FieldKind::Scalar),
        };

        let optional = match (self.optional, optional_marker) {
            (Some(optional), _) => Some(optional),
            (None, true) => Some(true),
            (None, false) => None,
        };

        Ok(Field {
            name: name.to_string(),
            types,
            explicit_types,
            default: self.default,
            required: self.required,
            optional,
            nullable: self.nullable,
            validate: self.validate,
            format: self.format,
            kind,
            deprecated: self.deprecated,
        })
    }
}

impl From<&str> for FieldSpec {
    fn from(types: &str) -> Self {
        FieldSpec::new(types)
    }
}

impl From<String> for FieldSpec {
    fn from(types: String) -> Self {
        FieldSpec::new(types)
    }
}

impl From<&[&str]> for FieldSpec {
    fn from(types: &[&str]) -> Self {
        FieldSpec::new(types)
    }
}

impl<const N: usize> From<[&str; N]> for FieldSpec {
    fn from(types: [&str; N]) -> Self {
        FieldSpec::new(types)
    }
}

impl From<TypeTag> for FieldSpec {
    fn from(tag: TypeTag) -> Self {
        FieldSpec::new(tag)
    }
}

impl From<Vec<TypeTag>> for FieldSpec {
    fn from(tags: Vec<TypeTag>) -> Self {
        FieldSpec::new(tags)
    }
}

impl From<Schema> for FieldSpec {
    fn from(child: Schema) -> Self {
        FieldSpec::any().schema(child)
    }
}

impl From<Arc<Schema>> for FieldSpec {
    fn from(child: Arc<Schema>) -> Self {
        FieldSpec::any().schema(child)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("types", &self.types)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("nullable", &self.nullable)
            .field("validate", &self.validate.is_some())
            .field("format", &self.format.is_some())
            .field("nested", &self.child.is_some())
            .field("extend", &self.extend)
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

/// Whether a field's value comes from a nested schema.
#[derive(Clone)]
pub enum FieldKind {
    Scalar,
    Nested(Arc<Schema>),
}

/// A registered field.
#[derive(Clone)]
pub struct Field {
    name: String,
    types: TypeSet,
    explicit_types: bool,
    default: Option<Value>,
    required: Option<bool>,
    optional: Option<bool>,
    nullable: Option<bool>,
    validate: Option<ValidateFn>,
    format: Option<FormatFn>,
    kind: FieldKind,
    deprecated: Option<String>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.kind, FieldKind::Nested(_))
    }

    /// The nested schema, if this field has one.
    pub fn child(&self) -> Option<&Schema> {
        match &self.kind {
            FieldKind::Nested(child) => Some(child.as_ref()),
            FieldKind::Scalar => None,
        }
    }

    pub fn has_format(&self) -> bool {
        self.format.is_some()
    }

    pub fn has_validator(&self) -> bool {
        self.validate.is_some()
    }

    /// Replacement key, for deprecated fields.
    pub fn deprecated(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// An explicit `required` wins; otherwise the negation of an explicit
    /// `optional`; otherwise false.
    pub fn required(&self) -> bool {
        match (self.required, self.optional) {
            (Some(required), _) => required,
            (None, Some(optional)) => !optional,
            (None, None) => false,
        }
    }

    /// An explicit `optional` wins; otherwise the negation of an explicit
    /// `required`; otherwise true.
    pub fn optional(&self) -> bool {
        match (self.optional, self.required) {
            (Some(optional), _) => optional,
            (None, Some(required)) => !required,
            (None, None) => true,
        }
    }

    /// An explicit `nullable` wins; otherwise `!required()`.
    pub fn nullable(&self) -> bool {
        self.nullable.unwrap_or_else(|| !self.required())
    }

    /// True if `value` has an accepted type. `null` is accepted on nullable
    /// fields.
    pub fn is_valid_type(&self, value: &Value) -> bool {
        self.types.matches(value) || (value.is_null() && self.nullable())
    }

    /// Type check, then the custom validator.
    pub fn validate(&self, value: &Value, ctx: &ValidateContext<'_>) -> Verdict {
        if !self.is_valid_type(value) {
            return Verdict::Invalid;
        }
        match &self.validate {
            Some(validate) => validate(value, ctx),
            None => Verdict::Valid,
        }
    }

    /// Produce the field's value: nested schema, then transform, then default.
    ///
    /// Validation is a separate step.
    pub fn format(
        &self,
        value: Option<Value>,
        ctx: &mut FieldContext<'_>,
    ) -> Result<Option<Value>, SchemaError> {
        let mut value = value;

        if let FieldKind::Nested(child) = &self.kind {
            let input = value.take().unwrap_or_default();
            let table = ctx.nested(child, &input)?;
            value = Some(Value::Table(table));
        }

        if let Some(format) = &self.format {
            value = format(value, ctx);
            ctx.take_latched()?;
        }

        if value.is_none() && ctx.defaults_enabled() {
            value = self.default.clone();
        }
        Ok(value)
    }

    /// A named property, as a value.
    pub fn property(&self, prop: &str) -> Option<Value> {
        match prop {
            "name" => Some(Value::from(self.name.as_str())),
            "types" => Some(Value::from(self.types.names())),
            "default" => self.default.clone(),
            "required" => Some(Value::Bool(self.required())),
            "optional" => Some(Value::Bool(self.optional())),
            "nullable" => Some(Value::Bool(self.nullable())),
            "deprecated" => self.deprecated.as_deref().map(Value::from),
            _ => None,
        }
    }

    /// Merge this field over `base`: explicit settings here win, everything
    /// left unset is inherited.
    pub fn merge_over(self, base: &Field) -> Field {
        let (types, explicit_types) = if self.explicit_types {
            (self.types, true)
        } else {
            (base.types.clone(), base.explicit_types)
        };
        let kind = match self.kind {
            FieldKind::Scalar => base.kind.clone(),
            nested => nested,
        };

        Field {
            name: self.name,
            types,
            explicit_types,
            default: self.default.or_else(|| base.default.clone()),
            required: self.required.or(base.required),
            optional: self.optional.or(base.optional),
            nullable: self.nullable.or(base.nullable),
            validate: self.validate.or_else(|| base.validate.clone()),
            format: self.format.or_else(|| base.format.clone()),
            kind,
            deprecated: self.deprecated.or_else(|| base.deprecated.clone()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Field [{}]>", self.types.names().join("|"))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("types", &self.types)
            .field("default", &self.default)
            .field("required", &self.required())
            .field("optional", &self.optional())
            .field("nullable", &self.nullable())
            .field("validate", &self.validate.is_some())
            .field("format", &self.format.is_some())
            .field("nested", &self.is_nested())
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(spec: impl Into<FieldSpec>) -> Field {
        let spec: FieldSpec = spec.into();
        spec.resolve("test").unwrap()
    }

    #[test]
    fn test_type_forms_resolve_the_same() {
        let a = field("string|array");
        let b = field(["array", "string"]);
        let c = field(vec![TypeTag::String, TypeTag::Array]);
        assert_eq!(a.types(), b.types());
        assert_eq!(b.types(), c.types());
        assert_eq!(a.to_string(), "<Field [array|string]>");
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = FieldSpec::new("function").resolve("callback").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { ref field, ref name }
            if field == "callback" && name == "function"));
    }

    #[test]
    fn test_flag_defaults() {
        let f = field("string");
        assert!(!f.required());
        assert!(f.optional());
        assert!(f.nullable());
    }

    #[test]
    fn test_required_derives_optional_and_nullable() {
        let f = field(FieldSpec::new("string").required(true));
        assert!(f.required());
        assert!(!f.optional());
        assert!(!f.nullable());

        let f = field(FieldSpec::new("string").required(false));
        assert!(!f.required());
        assert!(f.optional());
        assert!(f.nullable());
    }

    #[test]
    fn test_optional_derives_required() {
        let f = field(FieldSpec::new("string").optional(false));
        assert!(f.required());
        assert!(!f.optional());

        let f = field(FieldSpec::new("string").optional(true));
        assert!(!f.required());
    }

    #[test]
    fn test_nullable_does_not_affect_required() {
        let f = field(FieldSpec::new("string").nullable(true));
        assert!(!f.required());
        assert!(f.nullable());

        let f = field(FieldSpec::new("string").nullable(false));
        assert!(!f.required());
        assert!(!f.nullable());
    }

    #[test]
    fn test_required_and_nullable_are_independent() {
        let f = field(FieldSpec::new("string").required(true).nullable(true));
        assert!(f.required());
        assert!(f.nullable());
        assert!(f.is_valid_type(&Value::Null));
    }

    #[test]
    fn test_explicit_flags_win_even_when_inconsistent() {
        let f = field(FieldSpec::new("string").required(true).optional(true));
        assert!(f.required());
        assert!(f.optional());
    }

    #[test]
    fn test_optional_marker() {
        let f = field("string?");
        assert!(f.optional());
        assert!(!f.required());

        let f = field(FieldSpec::new("string?").optional(false));
        assert!(f.required());
    }

    #[test]
    fn test_is_valid_type() {
        let f = field("array");
        assert!(f.is_valid_type(&Value::from(vec!["bar"])));
        assert!(!f.is_valid_type(&Value::from("bar")));
        assert!(f.is_valid_type(&Value::Null));

        let strict = field(FieldSpec::new("array").nullable(false));
        assert!(!strict.is_valid_type(&Value::Null));
    }

    #[test]
    fn test_any_accepts_everything() {
        let f = field(FieldSpec::any());
        assert!(f.is_valid_type(&Value::Integer(1)));
        assert!(f.is_valid_type(&Value::table()));
        assert_eq!(f.to_string(), "<Field []>");
    }

    #[test]
    fn test_nested_field_types_default_to_object() {
        let f = field(Schema::new());
        assert!(f.is_nested());
        assert!(f.child().is_some());
        assert_eq!(f.types(), &TypeSet::from(TypeTag::Object));
    }

    #[test]
    fn test_verdict_conversions() {
        assert_eq!(Verdict::from(true), Verdict::Valid);
        assert_eq!(Verdict::from(false), Verdict::Invalid);
        let r: Result<(), String> = Err("too short".to_string());
        let v = Verdict::from(r);
        assert!(!v.is_valid());
        assert_eq!(v.reason(), Some("too short"));
    }

    #[test]
    fn test_property_lookup() {
        let f = field(FieldSpec::new("string").default("MIT").deprecated("license"));
        assert_eq!(f.property("types"), Some(Value::from(vec!["string"])));
        assert_eq!(f.property("default"), Some(Value::from("MIT")));
        assert_eq!(f.property("required"), Some(Value::Bool(false)));
        assert_eq!(f.property("deprecated"), Some(Value::from("license")));
        assert_eq!(f.property("name"), Some(Value::from("test")));
        assert_eq!(f.property("nope"), None);
    }

    #[test]
    fn test_merge_over_inherits_unset() {
        let base = FieldSpec::new("string")
            .default("MIT")
            .required(true)
            .validate(|v, _| v.as_str().is_some_and(|s| !s.is_empty()))
            .resolve("license")
            .unwrap();
        let update = FieldSpec::any().nullable(true).resolve("license").unwrap();

        let merged = update.merge_over(&base);
        assert_eq!(merged.types(), &TypeSet::from(TypeTag::String));
        assert_eq!(merged.default_value(), Some(&Value::from("MIT")));
        assert!(merged.required());
        assert!(merged.nullable());
        assert!(merged.has_validator());
    }

    #[test]
    fn test_merge_over_explicit_wins() {
        let base = FieldSpec::new("string").default("MIT").resolve("license").unwrap();
        let update = FieldSpec::new("array").default(vec!["MIT"]).resolve("license").unwrap();

        let merged = update.merge_over(&base);
        assert_eq!(merged.types(), &TypeSet::from(TypeTag::Array));
        assert_eq!(merged.default_value(), Some(&Value::from(vec!["MIT"])));
    }
}
