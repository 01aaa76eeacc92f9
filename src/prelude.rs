//! Convenient re-exports for common map-schema usage.
//!
//! # Quick Start
//!
//! ```ignore
//! use map_schema::prelude::*;
//!
//! let schema = Schema::new()
//!     .field("host", FieldSpec::new("string").required(true))?
//!     .field("port", FieldSpec::new("number").default(8080))?;
//!
//! let normalized = schema.normalize(&Value::from(table! { "host" => "localhost" }), None)?;
//! assert_eq!(normalized.value.get("port"), Some(&Value::Integer(8080)));
//! ```
//!
//! # Import Patterns
//!
//! ## Selective Imports
//!
//! Import only what you need:
//!
//! ```ignore
//! use map_schema::{Schema, FieldSpec};
//! use map_schema::error::Diagnostics;
//! ```

// ============================================================================
// Stillwater re-exports (core functional programming types)
// ============================================================================

/// Result type with error accumulation. `Normalized::into_validation()`
/// produces one.
pub use stillwater::Validation;

/// Trait for combining values. `Diagnostics` and `Violations` implement it;
/// nested schema diagnostics are merged with `Semigroup::combine`.
pub use stillwater::Semigroup;

/// Guaranteed non-empty collection. Underlying type for `Violations`.
pub use stillwater::NonEmptyVec;

// ============================================================================
// Error types
// ============================================================================

/// Fatal errors: bad registration, non-object input, strict mode, parsing.
pub use crate::error::SchemaError;

/// One problem found on one key.
pub use crate::error::Diagnostic;

/// What went wrong on a key.
pub use crate::error::DiagnosticKind;

/// Warning or error.
pub use crate::error::Severity;

/// Warnings and errors accumulated by a call.
pub use crate::error::Diagnostics;

/// Non-empty collection of error diagnostics. Implements `Semigroup`.
pub use crate::error::Violations;

/// Type alias: `Validation<T, Violations>`.
pub use crate::error::SchemaValidation;

/// Group diagnostics by kind for organized reporting.
pub use crate::error::group_by_kind;

// ============================================================================
// Schema and fields
// ============================================================================

/// Ordered field registry with the normalize pipeline.
pub use crate::schema::Schema;

/// Result of `Schema::normalize`.
pub use crate::schema::Normalized;

/// Registration-time description of a field.
pub use crate::field::FieldSpec;

/// A registered field.
pub use crate::field::Field;

/// Scalar or nested.
pub use crate::field::FieldKind;

/// Outcome of a field validator.
pub use crate::field::Verdict;

/// What a format transform can see and do.
pub use crate::context::FieldContext;

/// What a validator can see.
pub use crate::context::ValidateContext;

// ============================================================================
// Options
// ============================================================================

/// Processing options for a schema or a single call.
pub use crate::options::Options;

/// How arrays are sorted in the result.
pub use crate::options::ArraySort;

/// Custom ordering for `sortArrays`.
pub use crate::options::Comparator;

// ============================================================================
// Value types
// ============================================================================

/// Untyped configuration value.
pub use crate::value::Value;

/// Ordered string-keyed map of values.
pub use crate::value::Table;

/// Build a `Table` literal.
pub use crate::table;

/// Type tags a field can accept.
pub use crate::types::TypeTag;

/// A set of accepted type tags.
pub use crate::types::TypeSet;

// ============================================================================
// Pretty printing
// ============================================================================

/// Options for pretty printing diagnostics.
pub use crate::pretty::PrettyPrintOptions;

/// Color output option.
pub use crate::pretty::ColorOption;

/// Trait extension for easy error handling with pretty printing.
///
/// Provides `unwrap_or_exit()` for CLI applications.
pub use crate::pretty::ValidationExt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_validation_types_available() {
        let _: SchemaValidation<()> = Validation::Success(());
        let _: SchemaValidation<()> =
            Validation::Failure(Violations::single(Diagnostic::missing("host")));
    }

    #[test]
    fn test_prelude_semigroup_combine() {
        let e1 = Violations::single(Diagnostic::missing("host"));
        let e2 = Violations::single(Diagnostic::missing("port"));
        let combined = e1.combine(e2);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn test_prelude_validation_all_vec_accumulates_errors() {
        let v1: SchemaValidation<i32> =
            Validation::Failure(Violations::single(Diagnostic::missing("host")));
        let v2: SchemaValidation<i32> =
            Validation::Failure(Violations::single(Diagnostic::missing("port")));

        let result = Validation::all_vec(vec![v1, v2]);
        assert!(result.is_failure());

        if let Validation::Failure(errors) = result {
            assert_eq!(errors.len(), 2);
        }
    }

    #[test]
    fn test_prelude_nonemptyvec_available() {
        let nev = NonEmptyVec::singleton(42);
        assert_eq!(*nev.head(), 42);
    }

    #[test]
    fn test_prelude_table_macro_and_schema() {
        let schema = Schema::new()
            .field("port", FieldSpec::new("number").default(8080))
            .unwrap();
        let config = Value::from(table! { "host" => "localhost" });
        let normalized = schema.normalize(&config, None).unwrap();
        assert_eq!(normalized.value.get("port"), Some(&Value::Integer(8080)));
        assert_eq!(normalized.value.get("host"), Some(&Value::from("localhost")));
    }
}
