//! Nested schemas.
//!
//! Every nested field runs its child schema, even when the key is absent or
//! holds something other than an object, so child defaults always appear.
//!
//! Run with:
//!   cargo run --example nested

use map_schema::prelude::*;

fn defaults(pairs: &[(&str, &str)]) -> Result<Schema, SchemaError> {
    Schema::new().fields(
        pairs
            .iter()
            .map(|(name, default)| (*name, FieldSpec::any().default(*default))),
    )
}

fn main() -> Result<(), SchemaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let sub = defaults(&[("x", "xxx"), ("y", "yyy")])?.field(
        "z",
        FieldSpec::any().format(|value, _ctx| match value {
            None | Some(Value::Null) => Some(Value::from("zzz")),
            other => other,
        }),
    )?;

    let foo = defaults(&[("a", "aaa"), ("b", "bbb"), ("c", "ccc")])?;
    let bar = defaults(&[("d", "ddd"), ("e", "eee"), ("f", "fff")])?;
    let baz = defaults(&[("g", "ggg"), ("h", "hhh")])?
        .field("i", sub)?
        .field("j", FieldSpec::any().default("jjj"))?;

    let schema = Schema::new()
        .field("foo", foo)?
        .field("bar", bar)?
        .field("baz", baz)?
        .field("qux", FieldSpec::any().format(|_, _| Some(Value::from("zzz"))))?;

    let config = Value::from(table! {
        "baz" => table! { "i" => table! { "z" => Value::Null } },
        "foo" => "bar",
    });
    let normalized = schema.normalize(&config, None)?;

    println!("{}", Value::Table(normalized.value));
    normalized
        .diagnostics
        .pretty_print(&PrettyPrintOptions::default());
    Ok(())
}
