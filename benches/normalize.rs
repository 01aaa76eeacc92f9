//! Performance benchmarks for the normalize pipeline.
//!
//! Compares a flat schema, a nested schema, and the full post-processing
//! chain (omit, omitEmpty, sortArrays, sortBy) on the same input.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use map_schema::prelude::*;
use std::hint::black_box;

fn flat_schema(fields: usize) -> Schema {
    let mut schema = Schema::new();
    for i in 0..fields {
        let spec = match i % 3 {
            0 => FieldSpec::new("string").default(format!("value_{i}")),
            1 => FieldSpec::new("number").default(i as i64),
            _ => FieldSpec::new("array|string").format(|value, _ctx| match value {
                Some(Value::String(s)) => Some(Value::from(vec![s])),
                other => other,
            }),
        };
        if let Err(e) = schema.add_field(&format!("field_{i}"), spec) {
            panic!("bench schema: {e}");
        }
    }
    schema
}

fn flat_input(fields: usize) -> Value {
    let mut table = Table::new();
    for i in (0..fields).step_by(2) {
        let value = match i % 3 {
            0 => Value::from(format!("input_{i}")),
            1 => Value::from(i as i64),
            _ => Value::from(vec!["z", "b", "a"]),
        };
        table.insert(format!("field_{i}"), value);
    }
    Value::Table(table)
}

fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_flat");
    for fields in [10, 50, 200] {
        let schema = flat_schema(fields);
        let input = flat_input(fields);
        group.bench_with_input(BenchmarkId::from_parameter(fields), &input, |b, input| {
            b.iter(|| schema.normalize(black_box(input), None))
        });
    }
    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let child = flat_schema(10);
    let mut schema = Schema::new();
    for i in 0..10 {
        if let Err(e) = schema.add_field(&format!("section_{i}"), child.clone()) {
            panic!("bench schema: {e}");
        }
    }
    let mut table = Table::new();
    for i in 0..10 {
        table.insert(format!("section_{i}"), flat_input(10));
    }
    let input = Value::Table(table);

    c.bench_function("normalize_nested_10x10", |b| {
        b.iter(|| schema.normalize(black_box(&input), None))
    });
}

fn bench_post_processing(c: &mut Criterion) {
    let schema = flat_schema(50);
    let input = flat_input(50);
    let options = Options::new()
        .with_omit(["field_0", "field_3"])
        .with_omit_empty(true)
        .with_sort_arrays(true)
        .with_sort_by(["field_49", "field_10"]);

    c.bench_function("normalize_post_processing", |b| {
        b.iter(|| schema.normalize(black_box(&input), Some(&options)))
    });
}

criterion_group!(benches, bench_flat, bench_nested, bench_post_processing);
criterion_main!(benches);
