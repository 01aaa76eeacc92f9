//! Runtime type tags for configuration values.
//!
//! Every value classifies into exactly one `TypeTag`; a field declares the
//! set of tags it accepts. Matching is exact membership: `number` covers
//! integers and floats because both classify as `Number`, not because of any
//! subtyping rule.

use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// Canonical kind of a configuration value.
///
/// Declaration order is alphabetical so that sorted tag sets read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    /// Accepts anything
    Any,
    Array,
    Boolean,
    Null,
    Number,
    Object,
    String,
    /// An absent slot (a key missing from its table)
    Undefined,
}

impl TypeTag {
    /// Lowercase name of the tag, as used in type specs and messages.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Any => "any",
            TypeTag::Array => "array",
            TypeTag::Boolean => "boolean",
            TypeTag::Null => "null",
            TypeTag::Number => "number",
            TypeTag::Object => "object",
            TypeTag::String => "string",
            TypeTag::Undefined => "undefined",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type name that does not correspond to any `TypeTag`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type name '{0}'")]
pub struct UnknownTypeName(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "*" => Ok(TypeTag::Any),
            "array" | "list" => Ok(TypeTag::Array),
            "boolean" | "bool" => Ok(TypeTag::Boolean),
            "null" => Ok(TypeTag::Null),
            "number" | "integer" | "float" => Ok(TypeTag::Number),
            "object" | "table" | "map" => Ok(TypeTag::Object),
            "string" => Ok(TypeTag::String),
            "undefined" => Ok(TypeTag::Undefined),
            _ => Err(UnknownTypeName(s.trim().to_string())),
        }
    }
}

/// Classify a value into its canonical tag.
pub fn classify(value: &Value) -> TypeTag {
    match value {
        Value::Null => TypeTag::Null,
        Value::Bool(_) => TypeTag::Boolean,
        Value::Integer(_) | Value::Float(_) => TypeTag::Number,
        Value::String(_) => TypeTag::String,
        Value::Array(_) => TypeTag::Array,
        Value::Table(_) => TypeTag::Object,
    }
}

/// Classify a slot that may be absent.
pub fn classify_slot(value: Option<&Value>) -> TypeTag {
    value.map_or(TypeTag::Undefined, classify)
}

/// True if `accepted` admits any type or contains the value's tag.
pub fn matches(value: &Value, accepted: &TypeSet) -> bool {
    accepted.accepts_any() || accepted.contains(classify(value))
}

/// A deduplicated, sorted set of accepted tags.
///
/// The empty set means "any".
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct TypeSet {
    tags: Vec<TypeTag>,
}

/// Result of parsing a textual type spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTypes {
    pub types: TypeSet,
    /// A trailing `?` on any name marks the field optional.
    pub optional_marker: bool,
}

impl TypeSet {
    /// The set that accepts every value.
    pub fn any() -> Self {
        Self::default()
    }

    /// Build a set from tags, sorting and removing duplicates.
    pub fn from_tags(tags: impl IntoIterator<Item = TypeTag>) -> Self {
        let mut tags: Vec<TypeTag> = tags.into_iter().collect();
        tags.sort();
        tags.dedup();
        Self { tags }
    }

    /// Parse type names. Each name may itself be a `|`-delimited list.
    ///
    /// `["string", "array"]`, `["string|array"]` and `["array|string"]` all
    /// produce the same set.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<ParsedTypes, UnknownTypeName> {
        let mut tags = Vec::new();
        let mut optional_marker = false;

        for name in names {
            for piece in name.as_ref().split('|') {
                let piece = piece.trim();
                if piece.is_empty() {
                    continue;
                }
                let piece = match piece.strip_suffix('?') {
                    Some(stripped) => {
                        optional_marker = true;
                        stripped
                    }
                    None => piece,
                };
                tags.push(piece.parse::<TypeTag>()?);
            }
        }

        Ok(ParsedTypes {
            types: Self::from_tags(tags),
            optional_marker,
        })
    }

    /// The sorted tags in this set.
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Names of the tags, in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.tags.iter().map(TypeTag::name).collect()
    }

    /// True for the empty set or any set containing `Any`.
    pub fn accepts_any(&self) -> bool {
        self.tags.is_empty() || self.tags.contains(&TypeTag::Any)
    }

    /// Exact membership test.
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.tags.contains(&tag)
    }

    /// True if no tags were declared.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Check a value against this set.
    pub fn matches(&self, value: &Value) -> bool {
        matches(value, self)
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            return f.write_str("any");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl From<TypeTag> for TypeSet {
    fn from(tag: TypeTag) -> Self {
        Self::from_tags([tag])
    }
}

impl From<Vec<TypeTag>> for TypeSet {
    fn from(tags: Vec<TypeTag>) -> Self {
        Self::from_tags(tags)
    }
}
