// Allow large error types - diagnostics carry the offending value
#![allow(clippy::result_large_err)]

//! map-schema: declarative schemas for key/value configuration objects.
//!
//! A `Schema` is an ordered registry of named fields. Each field declares the
//! types it accepts, whether it is required, a default, a validator, a
//! transform, or a child schema for nested objects. `Schema::normalize`
//! runs a config object through the schema and returns the cleaned,
//! defaulted object together with every problem it found.
//!
//! # Core Concepts
//!
//! - **Error Accumulation**: every missing key, bad type and bad value is
//!   reported, not just the first one
//! - **Strict Mode**: escalate the first diagnostic into a hard error
//! - **Nested Schemas**: a field can own a child schema whose diagnostics
//!   fold into the parent's
//! - **Non-mutating Calls**: a schema can be shared across threads; all
//!   per-call state lives in the call
//!
//! # Quick Start
//!
//! ```ignore
//! use map_schema::prelude::*;
//!
//! let schema = Schema::new()
//!     .field("name", FieldSpec::new("string").required(true))?
//!     .field("version", FieldSpec::new("string").default("0.1.0"))?
//!     .field(
//!         "keywords",
//!         FieldSpec::new("array|string").format(|value, _ctx| match value {
//!             Some(Value::String(s)) => Some(Value::from(vec![s])),
//!             other => other,
//!         }),
//!     )?;
//!
//! let config = map_schema::input::from_json_str(r#"{"name": "demo", "keywords": "cli"}"#)?;
//! let normalized = schema.normalize(&config, None)?;
//!
//! normalized.diagnostics.pretty_print(&PrettyPrintOptions::default());
//! let pkg = normalized.into_validation().unwrap_or_exit();
//! ```
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`schema`]: `Schema` and the normalize pipeline
//! - [`field`]: `FieldSpec`, `Field` and `Verdict`
//! - [`context`]: what transforms and validators can see
//! - [`options`]: `Options` for constructors and single calls
//! - [`error`]: `SchemaError`, `Diagnostic`, `Diagnostics`, `Violations`
//! - [`types`]: type tags and type sets
//! - [`value`]: `Value` and `Table`
//! - [`ops`]: object helpers the pipeline is built from
//! - [`input`]: parsing JSON, TOML and YAML text
//! - [`pretty`]: console reporting
//!
//! # Stillwater Integration
//!
//! | Type | Usage |
//! |------|-------|
//! | `Validation<T, E>` | `Normalized::into_validation`, `Diagnostics::into_validation` |
//! | `NonEmptyVec<T>` | Guaranteed non-empty error lists (`Violations`) |
//! | `Semigroup` | Merging nested diagnostics into the parent |
//!
//! These are re-exported from the prelude for convenience.

pub mod context;
pub mod error;
pub mod field;
pub mod input;
pub mod ops;
pub mod options;
pub mod prelude;
pub mod pretty;
pub mod schema;
pub mod types;
pub mod value;

// Re-exports for convenience
pub use context::{FieldContext, ValidateContext};
pub use error::{
    group_by_kind, Diagnostic, DiagnosticKind, Diagnostics, SchemaError, SchemaValidation,
    Severity, Violations,
};
pub use field::{Field, FieldKind, FieldSpec, TypeSpec, Verdict};
pub use options::{ArraySort, Comparator, Options};
pub use pretty::{ColorOption, PrettyPrintOptions, ValidationExt};
pub use schema::{Normalized, Schema};
pub use types::{TypeSet, TypeTag};
pub use value::{Table, Value};

// Re-export stillwater types that are commonly used
pub use stillwater::{NonEmptyVec, Semigroup, Validation};
