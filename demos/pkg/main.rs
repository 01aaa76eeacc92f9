//! Package manifest normalization.
//!
//! Normalizes a `package.json`-style manifest: fills defaults, flattens the
//! repository object to its URL, checks that `main` exists on disk, and runs
//! the `verb` section through its own schema.
//!
//! Run with:
//!   cargo run --example pkg

use std::path::Path;
use std::sync::Arc;

use map_schema::input;
use map_schema::prelude::*;

const MANIFEST: &str = r#"{
  "name": "map-schema-demo",
  "description": "Normalize all the things",
  "repository": { "type": "git", "url": "https://github.com/iepathos/map-schema.git" },
  "main": "index.js",
  "keywords": ["schema", "config"],
  "licenses": [{ "type": "MIT" }],
  "verb": { "toc": true }
}"#;

/// Schema for the `verb` section.
fn verb_schema() -> Result<Schema, SchemaError> {
    Schema::new().field(
        "toc",
        FieldSpec::new("boolean|object").format(|value, _ctx| match value {
            Some(Value::Bool(render)) => Some(Value::from(table! { "render" => render })),
            other => other,
        }),
    )
}

fn package_schema() -> Result<Schema, SchemaError> {
    let verb = Arc::new(verb_schema()?);

    Schema::new()
        .field("name", FieldSpec::new("string").required(true))?
        .field("description", "string")?
        .field(
            "repository",
            FieldSpec::new("object|string").format(|value, _ctx| match value {
                Some(Value::Table(repo)) => repo.get("url").cloned(),
                other => other,
            }),
        )?
        .field(
            "main",
            FieldSpec::new("string").validate(|value, _ctx| {
                match value.as_str() {
                    Some(path) if Path::new(path).exists() => Ok(()),
                    Some(path) => Err(format!("file '{}' does not exist", path)),
                    None => Ok(()),
                }
            }),
        )?
        .field("version", FieldSpec::new("string").default("0.1.0"))?
        .field("license", FieldSpec::new("string").default("MIT"))?
        .field(
            "licenses",
            FieldSpec::new("array|object")
                .deprecated("license")
                .format(|value, ctx| {
                    if let Some(Value::Array(items)) = &value {
                        if let Some(kind) = items.first().and_then(|item| item.get_path("type")) {
                            ctx.update("license", kind.clone());
                        }
                    }
                    ctx.omit("licenses");
                    value
                }),
        )?
        .field(
            "verb",
            FieldSpec::new("object").format(move |value, ctx| {
                let value = value?;
                ctx.normalize_nested(&verb, &value).map(Value::Table)
            }),
        )
}

fn main() -> Result<(), SchemaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let schema = package_schema()?;
    let manifest = input::from_json_str(MANIFEST)?;

    let options = Options::new().with_sort_arrays(true);
    let normalized = schema.normalize(&manifest, Some(&options))?;

    println!("=== Normalized manifest ===\n");
    println!("{}", Value::Table(normalized.value.clone()));

    println!("\n=== Diagnostics ===");
    normalized.diagnostics.log();
    normalized
        .diagnostics
        .pretty_print(&PrettyPrintOptions::default());

    // Errors only, for scripts that treat warnings as noise
    let quiet = PrettyPrintOptions::no_color().with_warnings(false);
    print!("{}", normalized.diagnostics.format(&quiet));

    Ok(())
}
