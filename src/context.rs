//! Per-call state and the contexts handed to field callbacks.
//!
//! A normalize call owns one `Pass`. Transforms see it through a
//! `FieldContext`, which is the only way a callback can affect the call:
//! omitting keys, updating other fields, or running a nested schema. The
//! `Schema` itself is never mutated by a call.

use tracing::trace;

use crate::error::{Diagnostic, Diagnostics, SchemaError};
use crate::options::Options;
use crate::schema::Schema;
use crate::value::{Table, Value};

/// Mutable state for one normalize call.
#[derive(Debug)]
pub(crate) struct Pass {
    pub options: Options,
    pub result: Table,
    pub diagnostics: Diagnostics,
    /// Keys omitted by transforms during this call
    pub omitted: Vec<String>,
    /// Keys written through `FieldContext::update`
    pub updated: Vec<String>,
    /// A fatal error raised inside a callback, surfaced once it returns
    pub latched: Option<SchemaError>,
}

impl Pass {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            result: Table::new(),
            diagnostics: Diagnostics::new(),
            omitted: Vec::new(),
            updated: Vec::new(),
            latched: None,
        }
    }

    /// Record a diagnostic, or fail with it under strict mode.
    pub fn record(&mut self, diagnostic: Diagnostic) -> Result<(), SchemaError> {
        if self.options.is_strict() {
            return Err(SchemaError::Strict(diagnostic));
        }
        trace!(key = %diagnostic.key, kind = %diagnostic.kind, "recorded diagnostic");
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    /// Fold a nested call's diagnostics into this pass.
    ///
    /// Under strict mode the first merged record aborts the call.
    pub fn absorb(&mut self, nested: Diagnostics) -> Result<(), SchemaError> {
        if self.options.is_strict() {
            if let Some(first) = nested.iter().next() {
                return Err(SchemaError::Strict(first.clone()));
            }
        }
        let current = std::mem::take(&mut self.diagnostics);
        self.diagnostics = stillwater::Semigroup::combine(current, nested);
        Ok(())
    }

    pub fn latch(&mut self, error: SchemaError) {
        if self.latched.is_none() {
            self.latched = Some(error);
        }
    }

    pub fn take_latched(&mut self) -> Result<(), SchemaError> {
        match self.latched.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn is_omitted(&self, key: &str) -> bool {
        self.omitted.iter().any(|k| k == key)
    }
}

/// What a format transform can see and do.
pub struct FieldContext<'a> {
    key: &'a str,
    config: &'a Table,
    schema: &'a Schema,
    pass: &'a mut Pass,
}

impl<'a> FieldContext<'a> {
    pub(crate) fn new(key: &'a str, config: &'a Table, schema: &'a Schema, pass: &'a mut Pass) -> Self {
        Self {
            key,
            config,
            schema,
            pass,
        }
    }

    /// The key being processed.
    pub fn key(&self) -> &str {
        self.key
    }

    /// The raw input object.
    pub fn config(&self) -> &Table {
        self.config
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// The result built so far in this call.
    pub fn result(&self) -> &Table {
        &self.pass.result
    }

    /// The effective options of this call.
    pub fn options(&self) -> &Options {
        &self.pass.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.pass.diagnostics
    }

    /// Drop `key` from the result of this call.
    ///
    /// Unlike `Schema::omit`, this does not outlive the call.
    pub fn omit(&mut self, key: impl Into<String>) {
        let key = key.into();
        trace!(key = %key, "omitted by transform");
        if !self.pass.is_omitted(&key) {
            self.pass.omitted.push(key);
        }
    }

    /// Run another field's transform on `value` and write the outcome into the
    /// result. A key updated this way is not processed again in this call.
    ///
    /// Keys without a registered field take `value` as is.
    pub fn update(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let schema = self.schema;
        let outcome = match schema.get(key) {
            Some(field) => {
                let mut ctx = FieldContext::new(key, self.config, schema, self.pass);
                field.format(Some(value), &mut ctx)
            }
            None => Ok(Some(value)),
        };

        match outcome {
            Ok(Some(value)) => {
                self.pass.result.insert(key.to_string(), value);
            }
            Ok(None) => {
                self.pass.result.shift_remove(key);
            }
            Err(error) => self.pass.latch(error),
        }
        trace!(key = %key, "updated by transform");
        if !self.pass.updated.iter().any(|k| k == key) {
            self.pass.updated.push(key.to_string());
        }
    }

    /// Normalize `value` with a nested schema, folding its diagnostics into
    /// this call. Non-object values are treated as an empty object.
    ///
    /// Returns `None` if the nested call failed; the failure then aborts the
    /// enclosing call once the transform returns.
    pub fn normalize_nested(&mut self, schema: &Schema, value: &Value) -> Option<Table> {
        match self.nested(schema, value) {
            Ok(table) => Some(table),
            Err(error) => {
                self.pass.latch(error);
                None
            }
        }
    }

    pub(crate) fn nested(&mut self, schema: &Schema, value: &Value) -> Result<Table, SchemaError> {
        let empty = Value::table();
        let input = if value.is_table() { value } else { &empty };
        let normalized = schema.normalize(input, None)?;
        self.pass.absorb(normalized.diagnostics)?;
        Ok(normalized.value)
    }

    pub(crate) fn defaults_enabled(&self) -> bool {
        self.pass.options.fills_defaults()
    }

    pub(crate) fn take_latched(&mut self) -> Result<(), SchemaError> {
        self.pass.take_latched()
    }
}

/// What a validator can see.
#[derive(Clone, Copy)]
pub struct ValidateContext<'a> {
    key: &'a str,
    config: &'a Table,
    schema: &'a Schema,
}

impl<'a> ValidateContext<'a> {
    pub(crate) fn new(key: &'a str, config: &'a Table, schema: &'a Schema) -> Self {
        Self {
            key,
            config,
            schema,
        }
    }

    pub fn key(&self) -> &str {
        self.key
    }

    pub fn config(&self) -> &Table {
        self.config
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }
}
