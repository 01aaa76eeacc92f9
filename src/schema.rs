//! The schema: an ordered field registry and the normalize pipeline.
//!
//! # Example
//!
//! ```ignore
//! use map_schema::prelude::*;
//!
//! let schema = Schema::new()
//!     .field("name", FieldSpec::new("string").required(true))?
//!     .field("keywords", FieldSpec::new("array").default(Vec::<String>::new()))?;
//!
//! let normalized = schema.normalize(&config, None)?;
//! for error in &normalized.diagnostics.errors {
//!     eprintln!("{}", error.message);
//! }
//! ```
//!
//! A call never mutates the schema: all per-call state lives in a pass that
//! is created by `normalize` and handed to callbacks through `FieldContext`.
//! One schema can serve concurrent calls from several threads.

use indexmap::IndexMap;
use stillwater::Validation;
use tracing::{debug, trace};

use crate::context::{FieldContext, Pass, ValidateContext};
use crate::error::{Diagnostic, Diagnostics, SchemaError, SchemaValidation, Violations};
use crate::field::{Field, FieldSpec, Verdict};
use crate::ops;
use crate::options::{ArraySort, Options};
use crate::types::classify;
use crate::value::{Table, Value};

/// Result of a normalize call.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The cleaned, defaulted object
    pub value: Table,
    pub diagnostics: Diagnostics,
}

impl Normalized {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The result as a stillwater validation: a failure if any error was
    /// recorded. Warnings are dropped.
    pub fn into_validation(self) -> SchemaValidation<Table> {
        match Violations::from_vec(self.diagnostics.errors) {
            Some(errors) => Validation::Failure(errors),
            None => Validation::Success(self.value),
        }
    }
}

/// An ordered registry of fields plus processing options.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, Field>,
    options: Options,
    omit: Vec<String>,
    values: Table,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Baseline values merged under every result.
    pub fn with_values(mut self, values: Table) -> Self {
        self.values = values;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn values(&self) -> &Table {
        &self.values
    }

    /// Set a baseline value by dot path.
    pub fn set_value(&mut self, path: &str, value: impl Into<Value>) -> &mut Self {
        let mut root = Value::Table(std::mem::take(&mut self.values));
        root.set_path(path, value);
        self.values = root.into_table().unwrap_or_default();
        self
    }

    /// Get a baseline value by dot path.
    pub fn value(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.values.get(head)?;
        match rest {
            Some(rest) => value.get_path(rest),
            None => Some(value),
        }
    }

    /// Register a field, replacing any field of the same name unless the spec
    /// asks to extend it.
    pub fn field(mut self, name: &str, spec: impl Into<FieldSpec>) -> Result<Self, SchemaError> {
        self.add_field(name, spec)?;
        Ok(self)
    }

    /// In-place form of `field`.
    pub fn add_field(&mut self, name: &str, spec: impl Into<FieldSpec>) -> Result<&mut Self, SchemaError> {
        let spec: FieldSpec = spec.into();
        let extend = spec.wants_extend();
        let mut field = spec.resolve(name)?;

        if extend {
            if let Some(base) = self.fields.get(name) {
                field = field.merge_over(base);
            }
        }
        trace!(field = name, types = %field.types(), "registered field");
        self.fields.insert(name.to_string(), field);
        Ok(self)
    }

    /// Register every `(name, spec)` pair.
    pub fn fields<I, K, S>(mut self, fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, S)>,
        K: AsRef<str>,
        S: Into<FieldSpec>,
    {
        for (name, spec) in fields {
            self.add_field(name.as_ref(), spec)?;
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// A named property of a field (`types`, `default`, `required`, ...).
    pub fn get_property(&self, name: &str, prop: &str) -> Option<Value> {
        self.fields.get(name)?.property(prop)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Registered field names, in registration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Unregistered names are optional.
    pub fn is_optional(&self, name: &str) -> bool {
        self.fields.get(name).map_or(true, Field::optional)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(Field::required)
    }

    /// Unregistered names are nullable.
    pub fn is_nullable(&self, name: &str) -> bool {
        self.fields.get(name).map_or(true, Field::nullable)
    }

    /// True if `value` has a type the named field accepts. Unregistered names
    /// accept anything.
    pub fn is_valid_type(&self, name: &str, value: &Value) -> bool {
        self.fields.get(name).map_or(true, |f| f.is_valid_type(value))
    }

    /// Omit `key` from every result of this schema.
    pub fn omit(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !self.omit.contains(&key) {
            self.omit.push(key);
        }
        self
    }

    /// Omit several keys from every result of this schema.
    pub fn omit_all<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.omit(key);
        }
        self
    }

    /// Keys omitted through `omit` and the constructor options.
    pub fn omitted(&self) -> Vec<&str> {
        ops::union(
            self.omit.iter().map(String::as_str).collect(),
            self.options.omit.iter().map(String::as_str),
        )
    }

    /// Drop this schema's omitted keys from `table`.
    pub fn omit_from(&self, table: Table) -> Table {
        ops::omit(table, &self.omitted())
    }

    /// Names of required fields absent from `table`.
    pub fn missing(&self, table: &Table) -> Vec<String> {
        self.fields
            .values()
            .filter(|f| f.required() && !table.contains_key(f.name()))
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Fill in defaults for absent fields, and nothing else.
    pub fn set_defaults(&self, mut table: Table) -> Table {
        if !self.options.fills_defaults() {
            return table;
        }
        for field in self.fields.values() {
            if table.contains_key(field.name()) {
                continue;
            }
            if let Some(default) = field.default_value() {
                table.insert(field.name().to_string(), default.clone());
            }
        }
        table
    }

    /// Sort every array in `table`, unless `sortArrays` is explicitly off.
    pub fn sort_arrays(&self, table: Table) -> Table {
        if self.options.sort_arrays == Some(false) {
            return table;
        }
        match &self.options.comparator {
            Some(cmp) => ops::sort_arrays(table, &|a: &Value, b: &Value| cmp.compare(a, b)),
            None => ops::sort_arrays(table, &Value::lexical_cmp),
        }
    }

    /// Reorder keys: `keys` first, everything else after in original order.
    pub fn sort_object<S: AsRef<str>>(&self, table: Table, keys: &[S]) -> Table {
        ops::sort_object(table, keys)
    }

    /// Build a schema from a sample object: one field per key, typed after the
    /// value and defaulting to it.
    pub fn infer(sample: &Value) -> Result<Schema, SchemaError> {
        let table = sample
            .as_table()
            .ok_or_else(|| SchemaError::not_an_object("config", sample))?;

        let mut schema = Schema::new();
        for (key, value) in table {
            schema.add_field(key, FieldSpec::new(classify(value)).default(value.clone()))?;
        }
        Ok(schema)
    }

    /// Run the full pipeline over `config`.
    ///
    /// `options` are merged over the constructor options for this call only.
    /// Fails if `config` is not an object, or on the first diagnostic in
    /// strict mode; otherwise every problem is reported in the returned
    /// diagnostics alongside a best-effort result.
    pub fn normalize(&self, config: &Value, options: Option<&Options>) -> Result<Normalized, SchemaError> {
        let input = config
            .as_table()
            .ok_or_else(|| SchemaError::not_an_object("config", config))?;
        let options = match options {
            Some(call) => call.merged_over(&self.options),
            None => self.options.clone(),
        };
        debug!(
            fields = self.fields.len(),
            keys = input.len(),
            strict = options.is_strict(),
            "normalizing config"
        );

        let mut pass = Pass::new(options);
        self.check_keys(input, &mut pass)?;

        let selected = self.selected_keys(input, &pass.options);
        for key in selected.iter().cloned() {
            if pass.updated.contains(&key) {
                trace!(key = %key, "already updated, skipping");
                continue;
            }
            match self.fields.get(&key) {
                Some(field) => self.process_field(field, input, &mut pass)?,
                None if pass.options.is_known_only() => {}
                None => {
                    if let Some(value) = input.get(&key) {
                        pass.result.insert(key, value.clone());
                    }
                }
            }
        }

        if pass.options.checks_required() {
            for field in self.fields.values() {
                if field.required()
                    && pass.options.picks(field.name())
                    && !pass.result.contains_key(field.name())
                {
                    pass.record(Diagnostic::missing(field.name()))?;
                }
            }
        }

        let visited = ops::union(selected, input.keys().cloned());
        let value = self.post_process(input, &visited, &mut pass);
        debug!(
            keys = value.len(),
            warnings = pass.diagnostics.warnings.len(),
            errors = pass.diagnostics.errors.len(),
            "normalized config"
        );

        Ok(Normalized {
            value,
            diagnostics: pass.diagnostics,
        })
    }

    /// Run only the validation phase: unknown and deprecated keys, type
    /// checks, validators and required fields. No transforms run and no
    /// result is built.
    pub fn validate(&self, config: &Value) -> Result<Diagnostics, SchemaError> {
        let input = config
            .as_table()
            .ok_or_else(|| SchemaError::not_an_object("config", config))?;
        let mut pass = Pass::new(self.options.clone());
        self.check_keys(input, &mut pass)?;

        for field in self.fields.values() {
            if let Some(value) = input.get(field.name()) {
                self.check_value(field, field.name(), value, input, &mut pass)?;
            }
        }

        if pass.options.checks_required() {
            for name in self.missing(input) {
                pass.record(Diagnostic::missing(&name))?;
            }
        }
        Ok(pass.diagnostics)
    }

    /// Unknown keys under `knownOnly`, and deprecated keys.
    fn check_keys(&self, input: &Table, pass: &mut Pass) -> Result<(), SchemaError> {
        for key in input.keys() {
            match self.fields.get(key) {
                None if pass.options.is_known_only() => {
                    pass.record(Diagnostic::unknown_field(key))?;
                }
                Some(field) => {
                    if let Some(replacement) = field.deprecated() {
                        pass.record(Diagnostic::deprecated(key, replacement))?;
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Processing order: registered fields in registration order, then input
    /// keys without a field. Under `existingOnly`, input keys in input order.
    /// Restricted by `pick` either way.
    fn selected_keys(&self, input: &Table, options: &Options) -> Vec<String> {
        let mut keys: Vec<String> = if options.is_existing_only() {
            input.keys().cloned().collect()
        } else {
            ops::union(self.fields.keys().cloned().collect(), input.keys().cloned())
        };
        keys.retain(|k| options.picks(k));
        keys
    }

    fn process_field(&self, field: &Field, input: &Table, pass: &mut Pass) -> Result<(), SchemaError> {
        let key = field.name();
        let candidate = input
            .get(key)
            .cloned()
            .or_else(|| {
                if pass.options.fills_defaults() {
                    field.default_value().cloned()
                } else {
                    None
                }
            })
            .or_else(|| self.values.get(key).cloned());

        let formatted = {
            let mut ctx = FieldContext::new(key, input, self, pass);
            field.format(candidate, &mut ctx)?
        };

        let Some(value) = formatted else {
            trace!(key, "no value");
            return Ok(());
        };

        self.check_value(field, key, &value, input, pass)?;

        if pass.is_omitted(key) {
            trace!(key, "omitted");
            return Ok(());
        }
        pass.result.insert(key.to_string(), value);
        Ok(())
    }

    fn check_value(
        &self,
        field: &Field,
        key: &str,
        value: &Value,
        input: &Table,
        pass: &mut Pass,
    ) -> Result<(), SchemaError> {
        if !field.is_valid_type(value) {
            return pass.record(Diagnostic::invalid_type(key, field.types(), value));
        }
        if field.has_validator() {
            let ctx = ValidateContext::new(key, input, self);
            match field.validate(value, &ctx) {
                Verdict::Valid => {}
                Verdict::Invalid => pass.record(Diagnostic::invalid_value(key, value, None))?,
                Verdict::InvalidBecause(reason) => {
                    pass.record(Diagnostic::invalid_value(key, value, Some(reason)))?
                }
            }
        }
        Ok(())
    }

    /// `visited` holds every key this pass processed or dropped; baseline
    /// values never bring those back.
    fn post_process(&self, input: &Table, visited: &[String], pass: &mut Pass) -> Table {
        let options = &pass.options;
        let mut table = std::mem::take(&mut pass.result);

        // Result order follows the input, then keys the schema introduced
        let input_keys: Vec<&str> = input.keys().map(String::as_str).collect();
        table = ops::sort_object(table, &input_keys);

        if !self.values.is_empty() {
            let baseline: Table = self
                .values
                .iter()
                .filter(|(key, _)| table.contains_key(*key) || !visited.contains(*key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            table = ops::merge_under(table, &baseline);
        }

        let omitted = ops::union(
            ops::union(self.omit.clone(), options.omit.iter().cloned()),
            pass.omitted.iter().cloned(),
        );
        if !omitted.is_empty() {
            table = ops::omit(table, &omitted);
        }
        if let Some(keys) = &options.pick {
            table = ops::pick(table, keys);
        }
        if options.is_omit_empty() {
            table = ops::omit_empty(table);
        }
        match options.array_sort() {
            ArraySort::Off => {}
            ArraySort::Lexicographic => table = ops::sort_arrays(table, &Value::lexical_cmp),
            ArraySort::By(cmp) => {
                table = ops::sort_arrays(table, &|a: &Value, b: &Value| cmp.compare(a, b))
            }
        }
        if let Some(keys) = &options.sort_by {
            table = ops::sort_object(table, keys);
        }
        table
    }
}
